//! Defines the command-line interface for the application.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docsync",
    version,
    about = "Build the project and keep its documentation in sync with the build output."
)]
pub struct Cli {
    /// Project root directory. [default: the current directory]
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Show verbose logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the crates and the documentation.
    Build(BuildArgs),
    /// Remove build artifacts.
    Clean(CleanArgs),
    /// Run the crates' tests.
    Test(TestArgs),
    /// Splice a captured help text into the README's usage section.
    Usage(UsageArgs),
    /// Delete the files listed in the docs ignore file from the built site.
    Purge(PurgeArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildTarget {
    /// Every target.
    All,
    /// The binary crate; building it also refreshes the README usage section.
    Bin,
    /// The library crate.
    Lib,
    /// The documentation site.
    Docs,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestTarget {
    All,
    Bin,
    Lib,
}

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(value_enum, default_value_t = BuildTarget::All)]
    pub target: BuildTarget,

    /// Build artifacts in release mode.
    #[arg(long)]
    pub release: bool,
}

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    #[arg(value_enum, default_value_t = BuildTarget::All)]
    pub target: BuildTarget,

    /// Clean release artifacts.
    #[arg(long)]
    pub release: bool,
}

/// Arguments for the `test` command.
#[derive(Args, Debug)]
pub struct TestArgs {
    #[arg(value_enum, default_value_t = TestTarget::All)]
    pub target: TestTarget,
}

/// Arguments for the `usage` command.
#[derive(Args, Debug)]
pub struct UsageArgs {
    /// File holding the binary's help output. Use '-' to read from stdin. [default: stdin]
    #[arg(long, value_name = "PATH")]
    pub help_file: Option<PathBuf>,

    /// Print the updated README instead of writing it.
    #[arg(long, conflicts_with = "diff")]
    pub dry_run: bool,

    /// Print a diff of the pending README changes instead of writing it.
    #[arg(long)]
    pub diff: bool,
}

/// Arguments for the `purge` command.
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Built site directory. [default: `site_dir` from the MkDocs configuration]
    #[arg(long, value_name = "DIR")]
    pub site_dir: Option<PathBuf>,

    /// Ignore pattern file. [default: the ignore file inside `docs_dir`]
    #[arg(long, value_name = "PATH")]
    pub ignore_file: Option<PathBuf>,
}
