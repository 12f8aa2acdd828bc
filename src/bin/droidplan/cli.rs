//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// droidplan - resolve Android module build scripts into validated build plans
#[derive(Parser)]
#[command(name = "droidplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the manifest and emit the build plan
    Resolve(ResolveArgs),

    /// Validate the manifest and report every check
    Check(CheckArgs),

    /// Display the dependency graph
    Tree(TreeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Path to build.gradle.kts (defaults to the nearest one above the current directory)
    pub manifest: Option<PathBuf>,

    /// Config file to use instead of the global and project configs
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidationArgs {
    /// Stop at the first constraint violation
    #[arg(long)]
    pub fail_fast: bool,

    /// Treat a debug signing config on release as a violation
    #[arg(long)]
    pub strict_signing: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: ManifestArgs,

    #[command(flatten)]
    pub validation: ValidationArgs,

    /// Output format: json or gradle
    #[arg(long)]
    pub format: Option<String>,

    /// Write the plan to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: ManifestArgs,

    #[command(flatten)]
    pub validation: ValidationArgs,
}

#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub input: ManifestArgs,

    /// Print the topological (dependencies first) order instead of a tree
    #[arg(long)]
    pub order: bool,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
