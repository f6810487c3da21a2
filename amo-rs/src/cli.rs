//! Root CLI structure for amo-rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "amo-rs")]
#[command(about = "Command-line tools for AMO skinned mesh files", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display information about an AMO file
    Info {
        /// Path to the AMO file
        file: PathBuf,

        /// Show per-object and per-animation details
        #[arg(short, long)]
        detailed: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the joint hierarchy, objects and animations as a tree
    Tree {
        /// Path to the AMO file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "8")]
        depth: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Validate an AMO file
    Validate {
        /// Path to the AMO file
        file: PathBuf,

        /// Fail on the first malformed line
        #[arg(short, long)]
        strict: bool,

        /// Show all warnings (not just errors)
        #[arg(short, long)]
        warnings: bool,
    },

    /// Pose a model at a point in an animation and print the result
    Sample {
        /// Path to the AMO file
        file: PathBuf,

        /// Animation to sample
        animation: String,

        /// Time in seconds
        #[arg(short, long, default_value = "0")]
        time: f32,

        /// Only print skinned vertices of this object
        #[arg(short, long)]
        object: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
