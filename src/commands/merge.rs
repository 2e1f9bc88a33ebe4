//! Merge command implementation.
//!
//! The merge command:
//! 1. Reads recorded stack samples
//! 2. Merges them into a merged stack tree
//! 3. Snapshots the tree and builds collapsed stacks
//! 4. Calculates metrics
//! 5. Writes output files

use super::models::{MergeArgs, MergeReport};
use crate::aggregator::{
    build_collapsed_stacks, calculate_hot_paths, calculate_sample_distribution,
    calculate_timer_totals, CollapsedStack, MergedStackTree,
};
use crate::output::{write_folded, write_profile};
use crate::parser::{read_samples_file, to_profile, validate_samples, StackSample};
use crate::utils::config::{MAX_MERGE_WORKERS, MAX_TOP_PATHS};
use crate::utils::error::TreeError;
use anyhow::{Context, Result};
use log::{debug, info};
use std::thread;
use std::time::Instant;

/// Execute the merge command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or malformed sample file
/// * Tree lock poisoned or allocation failure while merging
/// * File write errors
pub fn execute_merge(args: MergeArgs) -> Result<MergeReport> {
    let start_time = Instant::now();

    info!("Starting merge of samples from: {}", args.input.display());

    // Step 1: Read samples
    info!("Step 1/5: Reading recorded samples...");
    let mut parsed = read_samples_file(&args.input).context("Failed to read recorded samples")?;
    validate_samples(&parsed).context("Recorded samples are not usable")?;

    if let Some(max_depth) = args.max_stack_depth {
        for sample in &mut parsed.samples {
            sample.truncate_to_innermost(max_depth);
        }
    }

    debug!(
        "Parsed {} samples, {} frames, deepest stack {}",
        parsed.samples.len(),
        parsed.total_frames(),
        parsed.max_depth()
    );

    // Step 2: Merge into the tree
    info!("Step 2/5: Merging samples with {} worker(s)...", args.workers);
    let tree = MergedStackTree::new();
    merge_samples(&tree, &parsed.samples, args.workers).context("Failed to merge samples")?;
    let total_samples = tree.sample_count()?;

    // Step 3: Snapshot
    info!("Step 3/5: Building collapsed stacks...");
    let root = tree.root_node().context("Failed to snapshot merged stack tree")?;
    let stacks = build_collapsed_stacks(&root);

    let distribution = calculate_sample_distribution(&stacks);
    info!("Sample distribution: {}", distribution.summary());

    // Step 4: Metrics
    info!("Step 4/5: Calculating top {} hot paths...", args.top_paths);
    let hot_paths = calculate_hot_paths(&stacks, total_samples, args.top_paths);
    let timer_totals = calculate_timer_totals(&root);

    for (i, path) in hot_paths.iter().take(3).enumerate() {
        debug!("  {}. {} samples ({:.1}%): {}", i + 1, path.samples, path.percentage, path.stack);
    }

    // Step 5: Write outputs
    info!("Step 5/5: Writing output files...");
    let profile = to_profile(&parsed.source, total_samples, root, hot_paths, timer_totals);

    write_profile(&profile, &args.output_json).context("Failed to write profile JSON")?;
    info!("✓ Profile written to: {}", args.output_json.display());

    if let Some(folded_path) = &args.output_folded {
        write_folded(&stacks, folded_path).context("Failed to write folded stacks")?;
        info!("✓ Folded stacks written to: {}", folded_path.display());
    }

    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("PROFILE SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Source:        {}", profile.source);
        println!("Samples:       {}", profile.total_samples);
        println!("Tree nodes:    {}", profile.node_count);
        println!("Max depth:     {}", profile.max_depth);
        println!("Unique stacks: {}", stacks.len());
        println!("\n{}", generate_text_summary(&stacks, 10, total_samples));
        if !profile.timer_totals.is_empty() {
            println!("Timers:");
            for (name, samples) in &profile.timer_totals {
                println!("  {:<40} {:>8}", name, samples);
            }
        }
        println!("{}", "=".repeat(80));
    }

    info!("Merge completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(MergeReport {
        total_samples,
        node_count: profile.node_count,
        unique_stacks: stacks.len(),
        output_json: args.output_json,
        output_folded: args.output_folded,
    })
}

/// Merge samples into `tree`, from `workers` threads when more than one
///
/// The resulting tree is the same, up to child order, as a serial merge.
pub fn merge_samples(
    tree: &MergedStackTree,
    samples: &[StackSample],
    workers: usize,
) -> Result<(), TreeError> {
    if workers <= 1 || samples.len() < 2 {
        return samples.iter().try_for_each(|s| tree.add_stack_trace(s));
    }

    let chunk_size = samples.len().div_ceil(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = samples
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || chunk.iter().try_for_each(|s| tree.add_stack_trace(s)))
            })
            .collect();

        // a worker can only panic inside a merge, which poisons the lock
        handles
            .into_iter()
            .try_for_each(|handle| handle.join().map_err(|_| TreeError::LockPoisoned)?)
    })
}

/// Text table of the heaviest stacks
fn generate_text_summary(
    stacks: &[CollapsedStack],
    max_lines: usize,
    total_samples: u64,
) -> String {
    let mut out = format!("{:>8}  {:>6}  {}\n", "SAMPLES", "%", "LEAF (PATH DEPTH)");
    for stack in stacks.iter().take(max_lines) {
        let percentage = if total_samples > 0 {
            stack.weight as f64 / total_samples as f64 * 100.0
        } else {
            0.0
        };
        let depth = stack.stack.split(';').count();
        out.push_str(&format!(
            "{:>8}  {:>5.1}%  {} ({})\n",
            stack.weight,
            percentage,
            stack.leaf(),
            depth
        ));
    }
    out
}

/// Validate merge arguments
///
/// **Public** - can be called before execute_merge for early validation
pub fn validate_args(args: &MergeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if args.top_paths == 0 {
        anyhow::bail!("top_paths must be greater than 0");
    }

    if args.top_paths > MAX_TOP_PATHS {
        anyhow::bail!("top_paths is too large (max {})", MAX_TOP_PATHS);
    }

    if args.workers == 0 || args.workers > MAX_MERGE_WORKERS {
        anyhow::bail!("workers must be between 1 and {}", MAX_MERGE_WORKERS);
    }

    if args.max_stack_depth == Some(0) {
        anyhow::bail!("max_stack_depth must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{StackFrame, StackOrder, ThreadState};
    use std::path::PathBuf;

    fn sample(methods: &[&str], state: ThreadState) -> StackSample {
        let frames = methods.iter().map(|m| StackFrame::new("App", *m, None, 1)).collect();
        StackSample::new(frames, StackOrder::RootFirst, state)
    }

    #[test]
    fn test_validate_args_valid() {
        let args = MergeArgs::default();
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_empty_input() {
        let args = MergeArgs {
            input: PathBuf::new(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_top_paths_bounds() {
        let zero = MergeArgs {
            top_paths: 0,
            ..Default::default()
        };
        let too_large = MergeArgs {
            top_paths: 2000,
            ..Default::default()
        };
        assert!(validate_args(&zero).is_err());
        assert!(validate_args(&too_large).is_err());
    }

    #[test]
    fn test_validate_args_workers_bounds() {
        let zero = MergeArgs {
            workers: 0,
            ..Default::default()
        };
        let too_many = MergeArgs {
            workers: 65,
            ..Default::default()
        };
        assert!(validate_args(&zero).is_err());
        assert!(validate_args(&too_many).is_err());
    }

    #[test]
    fn test_merge_samples_parallel_matches_serial() {
        let samples: Vec<StackSample> = (0..40)
            .map(|i| match i % 4 {
                0 => sample(&["main", "a"], ThreadState::Runnable),
                1 => sample(&["main", "a", "b"], ThreadState::Runnable),
                2 => sample(&["main", "a"], ThreadState::Blocked),
                _ => sample(&["main", "c"], ThreadState::Waiting),
            })
            .collect();

        let serial = MergedStackTree::new();
        merge_samples(&serial, &samples, 1).unwrap();
        let parallel = MergedStackTree::new();
        merge_samples(&parallel, &samples, 4).unwrap();

        let expected = serial.root_node().unwrap().sorted_by_sample_count();
        let actual = parallel.root_node().unwrap().sorted_by_sample_count();
        assert_eq!(actual.sample_count, 40);
        assert_eq!(actual.node_count(), expected.node_count());
        assert_eq!(
            build_collapsed_stacks(&actual).len(),
            build_collapsed_stacks(&expected).len()
        );
    }

    #[test]
    fn test_generate_text_summary() {
        let stacks = vec![CollapsedStack::new("App.main;App.work".to_string(), 3)];
        let summary = generate_text_summary(&stacks, 10, 4);
        assert!(summary.contains("75.0%"));
        assert!(summary.contains("App.work (2)"));
    }
}
