//! Stack Sampler CLI
//!
//! Replays recorded stack samples into a merged stack tree and writes
//! the resulting profile.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use stack_sampler::commands::{
    display_schema, display_version, execute_merge, validate_args, validate_profile_file, MergeArgs,
};
use stack_sampler::utils::config::DEFAULT_TOP_PATHS;

/// Stack Sampler - merged stack tree profiles from sampled stacks
#[derive(Parser, Debug)]
#[command(name = "stack-sampler")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge recorded samples into a profile
    Merge {
        /// Recorded samples (JSON array or object with a `samples` list)
        #[arg(short, long, env = "STACK_SAMPLER_INPUT")]
        input: PathBuf,

        /// Output path for JSON profile
        #[arg(short, long, default_value = "profile.json")]
        output: PathBuf,

        /// Output path for folded stacks (optional)
        #[arg(short, long)]
        folded: Option<PathBuf>,

        /// Number of top hot paths to include
        #[arg(long, default_value_t = DEFAULT_TOP_PATHS)]
        top_paths: usize,

        /// Threads merging samples concurrently
        #[arg(short, long, default_value = "1")]
        workers: usize,

        /// Keep only the innermost N frames of each sample
        #[arg(long)]
        max_depth: Option<usize>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a profile JSON file
    Validate {
        /// Path to profile JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Merge {
            input,
            output,
            folded,
            top_paths,
            workers,
            max_depth,
            summary,
        } => {
            let args = MergeArgs {
                input,
                output_json: output,
                output_folded: folded,
                top_paths,
                workers,
                max_stack_depth: max_depth,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_merge(args)?;
        }

        Commands::Validate { file } => {
            validate_profile_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
