use crate::output::read_profile;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::Path;

/// Validate a profile JSON file
pub fn validate_profile_file(file_path: &Path) -> Result<()> {
    println!("Validating profile: {}", file_path.display());

    let profile = read_profile(file_path)?;

    if profile.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported schema version {} (expected {})",
            profile.version,
            SCHEMA_VERSION
        );
    }

    if profile.root.sample_count != profile.total_samples {
        anyhow::bail!(
            "Root sample count {} does not match total_samples {}",
            profile.root.sample_count,
            profile.total_samples
        );
    }

    println!("✓ Valid profile JSON");
    println!("  Version: {}", profile.version);
    println!("  Source: {}", profile.source);
    println!("  Samples: {}", profile.total_samples);
    println!("  Tree Nodes: {}", profile.node_count);
    println!("  Max Depth: {}", profile.max_depth);
    println!("  Hot Paths: {}", profile.hot_paths.len());
    println!("  Timers: {}", profile.timer_totals.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Stack Sampler Profile Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Origin of the samples");
        println!("  total_samples: number      - Samples merged into the tree");
        println!("  node_count: number         - Tree nodes (synthetic root excluded)");
        println!("  max_depth: number          - Deepest stack seen");
        println!("  root: node                 - Synthetic root of the merged tree");
        println!("    frame: object?           - class_name, method_name, file_name?, line_number");
        println!("    sample_count: number     - Samples through this node");
        println!("    timer_names: array?      - Timer names seen on this node");
        println!("    leaf_thread_state: str?  - Thread state, leaf nodes only");
        println!("    children: array?         - Child nodes in discovery order");
        println!("  hot_paths: array           - Heaviest collapsed stacks");
        println!("    stack: string            - Semicolon-separated path");
        println!("    samples: number          - Samples ending on this path");
        println!("    percentage: number       - Percentage of total samples");
        println!("  timer_totals: object       - Samples per timer name");
        println!("  generated_at: string       - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Stack Sampler v{}", env!("CARGO_PKG_VERSION"));
    println!("Profile Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Merges sampled thread stacks into a merged stack tree.");
}
