//! Invocation of the external tools the pipeline depends on: cargo, rustc and mkdocs.

use crate::error::SyncError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command line for an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    /// Capture stdout/stderr instead of letting the tool write to the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What an external tool left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external tools. The process-backed implementation is [`ProcessRunner`].
pub trait ToolRunner {
    /// Runs `invocation` to completion.
    ///
    /// A nonzero exit is not an error at this level; it is reported through
    /// [`ToolOutput::code`].
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, SyncError>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, SyncError> {
        (**self).run(invocation)
    }
}

/// Spawns real processes and blocks until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, SyncError> {
        log::debug!("Running `{invocation}`");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let launch_error = |source| SyncError::ToolLaunch {
            tool: invocation.program.clone(),
            source,
        };

        if invocation.capture {
            let output = command
                .stdin(Stdio::null())
                .output()
                .map_err(launch_error)?;
            Ok(ToolOutput {
                // Killed by a signal.
                code: output.status.code().unwrap_or(1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = command.status().map_err(launch_error)?;
            Ok(ToolOutput {
                code: status.code().unwrap_or(1),
                ..ToolOutput::default()
            })
        }
    }
}

/// Build mode switches shared by cargo and mkdocs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    pub release: bool,
    pub verbose: bool,
}

impl BuildFlags {
    pub fn cargo_args(&self) -> Vec<&'static str> {
        let mut args = Vec::new();
        if self.release {
            args.push("--release");
        }
        if self.verbose {
            args.push("--verbose");
        }
        args
    }
}

/// A cargo command run against a single crate through its manifest path.
pub fn cargo(root: &Path, crates_dir: &Path, command: &str, krate: &str) -> Invocation {
    let manifest = crates_dir.join(krate).join("Cargo.toml");
    Invocation::new("cargo")
        .arg(command)
        .arg("--manifest-path")
        .arg(manifest.to_string_lossy())
        .current_dir(root)
}

/// `mkdocs build`, always strict; release builds start from a clean site directory.
pub fn mkdocs_build(root: &Path, flags: BuildFlags) -> Invocation {
    let mut invocation = Invocation::new("mkdocs")
        .arg("build")
        .arg("--strict")
        .current_dir(root);
    if flags.release {
        invocation = invocation.arg("--clean");
    }
    if flags.verbose {
        invocation = invocation.arg("--verbose");
    }
    invocation
}

/// Extracts the version from `rustc --version` output such as `rustc 1.80.0 (051478957 2024-07-21)`.
pub fn parse_rustc_version(output: &str) -> Result<semver::Version, SyncError> {
    output
        .split_whitespace()
        .nth(1)
        .and_then(|version| semver::Version::parse(version).ok())
        .ok_or_else(|| SyncError::RustcVersionUnparsable(output.trim().to_string()))
}

/// Fails unless the installed rustc is at least `minimum`.
pub fn ensure_rustc_version(
    runner: &impl ToolRunner,
    minimum: &semver::Version,
) -> Result<semver::Version, SyncError> {
    let output = runner.run(&Invocation::new("rustc").arg("--version").captured())?;
    if !output.success() {
        log::error!("Rust compiler not found, aborting build.");
        return Err(SyncError::ToolFailed {
            tool: "rustc".to_string(),
            code: output.code,
            stderr: output.stderr,
        });
    }

    let found = parse_rustc_version(&output.stdout)?;
    if found < *minimum {
        log::error!("Build requires at least Rust {minimum}, found {found}");
        return Err(SyncError::RustcTooOld {
            required: minimum.clone(),
            found,
        });
    }
    Ok(found)
}
