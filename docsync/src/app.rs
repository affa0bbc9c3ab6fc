use crate::cli::{
    BuildArgs, BuildTarget, CleanArgs, Cli, Command, PurgeArgs, TestArgs, TestTarget, UsageArgs,
};
use anyhow::{bail, Context};
use clap::Parser;
use docsync_lib::config::ProjectConfig;
use docsync_lib::error::SyncError;
use docsync_lib::pipeline::{CrateKind, Pipeline};
use docsync_lib::purge::purge_ignored;
use docsync_lib::toolchain::{BuildFlags, ProcessRunner};
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

enum OutputMode {
    Write,
    DryRun,
    Diff,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Maps an error onto the process exit status, keeping the codes of failed tools.
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SyncError>())
        .map_or(1, SyncError::exit_code);
    u8::try_from(code).ok().filter(|code| *code != 0).unwrap_or(1)
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        root,
        verbose,
        command,
    } = cli;

    let root = match root {
        Some(root) => root,
        None => env::current_dir().context("Failed to determine the current directory")?,
    };
    ensure_project_root(&root)?;

    let config = ProjectConfig::load(&root)?;
    let pipeline = Pipeline::new(root, config, ProcessRunner);

    match command {
        Command::Build(args) => process_build(&pipeline, args, verbose),
        Command::Clean(args) => process_clean(&pipeline, args),
        Command::Test(args) => process_test(&pipeline, args),
        Command::Usage(args) => process_usage(&pipeline, args),
        Command::Purge(args) => process_purge(&pipeline, args),
    }
}

/// Every relative path in the configuration is anchored at the project root.
fn ensure_project_root(root: &Path) -> anyhow::Result<()> {
    if !root.join(".gitignore").exists() {
        bail!(
            "Automation tasks can only be invoked from project's root directory! ({} has no .gitignore)",
            root.display()
        );
    }
    Ok(())
}

fn process_build(
    pipeline: &Pipeline<ProcessRunner>,
    args: BuildArgs,
    verbose: bool,
) -> anyhow::Result<()> {
    let flags = BuildFlags {
        release: args.release,
        verbose,
    };

    match args.target {
        BuildTarget::All => {
            pipeline.build_all(flags)?;
            eprintln!("\nBuild finished.");
        }
        BuildTarget::Bin => pipeline.build_bin(flags)?,
        BuildTarget::Lib => pipeline.build_lib(flags)?,
        BuildTarget::Docs => {
            if let Some(report) = pipeline.build_docs(flags)? {
                log::info!("Removed {} ignored path(s)", report.removed.len());
            }
        }
    }
    Ok(())
}

fn process_clean(pipeline: &Pipeline<ProcessRunner>, args: CleanArgs) -> anyhow::Result<()> {
    match args.target {
        BuildTarget::All => {
            pipeline.clean_all(args.release)?;
            eprintln!("\nAll cleaned.");
        }
        BuildTarget::Bin => pipeline.clean_crate(CrateKind::Bin, args.release)?,
        BuildTarget::Lib => pipeline.clean_crate(CrateKind::Lib, args.release)?,
        BuildTarget::Docs => pipeline.clean_docs()?,
    }
    Ok(())
}

fn process_test(pipeline: &Pipeline<ProcessRunner>, args: TestArgs) -> anyhow::Result<()> {
    match args.target {
        TestTarget::All => pipeline.test_all()?,
        TestTarget::Bin => pipeline.test_crate(CrateKind::Bin)?,
        TestTarget::Lib => pipeline.test_crate(CrateKind::Lib)?,
    }
    Ok(())
}

fn process_usage(pipeline: &Pipeline<ProcessRunner>, args: UsageArgs) -> anyhow::Result<()> {
    let UsageArgs {
        help_file,
        dry_run,
        diff,
    } = args;

    let mode = if dry_run {
        OutputMode::DryRun
    } else if diff {
        OutputMode::Diff
    } else {
        OutputMode::Write
    };

    let help = read_help(help_file.as_ref())?;
    let document = pipeline.splice_usage(&help)?;

    match mode {
        OutputMode::DryRun => io::stdout().write_all(document.rendered.as_bytes())?,
        OutputMode::Diff => io::stdout().write_all(document.diff().as_bytes())?,
        OutputMode::Write => {
            if document.is_changed() {
                document.write()?;
            } else {
                log::info!("{} is already up to date", document.path.display());
            }
        }
    }
    Ok(())
}

fn read_help(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(file_path) if file_path.as_os_str() != "-" => fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read help file: {}", file_path.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read help text from stdin")?;
            Ok(buf)
        }
    }
}

fn process_purge(pipeline: &Pipeline<ProcessRunner>, args: PurgeArgs) -> anyhow::Result<()> {
    let layout = pipeline.docs_layout()?;
    let site_dir = args
        .site_dir
        .map_or(layout.site_dir, |dir| pipeline.root().join(dir));
    let ignore_file = args.ignore_file.map_or_else(
        || layout.docs_dir.join(&pipeline.config().ignore_file),
        |file| pipeline.root().join(file),
    );

    let report = purge_ignored(&site_dir, &ignore_file)?;

    let mut stdout = io::stdout().lock();
    for path in &report.removed {
        writeln!(stdout, "{}", path.display())?;
    }
    Ok(())
}
