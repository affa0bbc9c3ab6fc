//! The build, clean and test tasks, sequenced over a [`ToolRunner`].
//!
//! Every stage returns a `Result`; the first failure stops whatever task is
//! running and the caller decides how to exit.

use crate::config::{DocsLayout, ProjectConfig};
use crate::error::SyncError;
use crate::purge::{purge_ignored, PurgeReport};
use crate::region::SplicedDocument;
use crate::toolchain::{
    cargo, ensure_rustc_version, mkdocs_build, BuildFlags, Invocation, ToolOutput, ToolRunner,
};
use crate::usage::{normalize_help, BinaryNames};
use std::fs;
use std::path::{Path, PathBuf};

/// Which of the project's crates a task applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrateKind {
    Bin,
    Lib,
}

pub struct Pipeline<R> {
    root: PathBuf,
    config: ProjectConfig,
    runner: R,
}

impl<R: ToolRunner> Pipeline<R> {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig, runner: R) -> Self {
        Self {
            root: root.into(),
            config,
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    fn crate_name(&self, kind: CrateKind) -> &str {
        match kind {
            CrateKind::Bin => &self.config.bin_crate,
            CrateKind::Lib => &self.config.lib_crate,
        }
    }

    fn cargo(&self, command: &str, kind: CrateKind) -> Invocation {
        cargo(
            &self.root,
            &self.config.crates_dir,
            command,
            self.crate_name(kind),
        )
    }

    /// Runs `invocation` and turns a nonzero exit into [`SyncError::ToolFailed`].
    fn run_checked(&self, invocation: Invocation) -> Result<ToolOutput, SyncError> {
        let output = self.runner.run(&invocation)?;
        if output.success() {
            return Ok(output);
        }
        Err(SyncError::ToolFailed {
            tool: invocation.to_string(),
            code: output.code,
            stderr: output.stderr,
        })
    }

    pub fn docs_layout(&self) -> Result<DocsLayout, SyncError> {
        DocsLayout::load(&self.root, &self.config.mkdocs_config)
    }

    pub fn readme_path(&self) -> PathBuf {
        self.root.join(&self.config.readme)
    }

    /// Normalizes `raw_help` and splices it into the document, without writing it.
    pub fn splice_usage(&self, raw_help: &str) -> Result<SplicedDocument, SyncError> {
        let names = BinaryNames::new(&self.config.binary_name, &self.config.public_name);
        let block = normalize_help(raw_help, &names)?;
        SplicedDocument::load(&self.readme_path(), &block, &self.config.usage_title)
    }

    /// Builds the binary crate, then documents its usage in the README.
    pub fn build_bin(&self, flags: BuildFlags) -> Result<(), SyncError> {
        ensure_rustc_version(&self.runner, &self.config.min_rustc_version)?;

        let build = self.cargo("build", CrateKind::Bin).args(flags.cargo_args());
        self.run_checked(build).inspect_err(|_| {
            log::error!("Failed to build the binary crate");
        })?;

        let binary = self
            .run_checked(self.cargo("run", CrateKind::Bin).captured())
            .inspect_err(|err| {
                if let SyncError::ToolFailed { code, stderr, .. } = err {
                    log::error!("Compiled binary returned error code {code}; stderr:\n{stderr}");
                }
            })?;

        if flags.verbose {
            log::info!("Updating README to add binary's help string");
        }
        let document = self.splice_usage(&binary.stdout)?;
        document.write()
    }

    pub fn build_lib(&self, flags: BuildFlags) -> Result<(), SyncError> {
        ensure_rustc_version(&self.runner, &self.config.min_rustc_version)?;
        let build = self.cargo("build", CrateKind::Lib).args(flags.cargo_args());
        self.run_checked(build).map(drop)
    }

    /// Builds the documentation site.
    ///
    /// Release builds also delete the site entries listed in the ignore file
    /// of the docs source directory, returning what was removed.
    pub fn build_docs(&self, flags: BuildFlags) -> Result<Option<PurgeReport>, SyncError> {
        self.run_checked(mkdocs_build(&self.root, flags))
            .inspect_err(|_| log::error!("mkdocs build failed, aborting."))?;

        if !flags.release {
            return Ok(None);
        }

        let layout = self.docs_layout()?;
        let ignore_file = layout.docs_dir.join(&self.config.ignore_file);
        purge_ignored(&layout.site_dir, &ignore_file).map(Some)
    }

    pub fn build_all(&self, flags: BuildFlags) -> Result<(), SyncError> {
        // The binary crate depends on the library, so building it covers both.
        self.build_bin(flags)?;
        self.build_docs(flags).map(drop)
    }

    pub fn clean_crate(&self, kind: CrateKind, release: bool) -> Result<(), SyncError> {
        let mut clean = self.cargo("clean", kind);
        if release {
            clean = clean.arg("--release");
        }
        self.run_checked(clean).map(drop)
    }

    /// Removes the generated site directory. Failing to do so is only a warning.
    pub fn clean_docs(&self) -> Result<(), SyncError> {
        let site_dir = self.docs_layout()?.site_dir;
        if site_dir.is_dir() {
            if let Err(err) = fs::remove_dir_all(&site_dir) {
                log::warn!(
                    "Error while cleaning docs' output dir {}: {err}",
                    site_dir.display()
                );
            }
        }
        Ok(())
    }

    pub fn clean_all(&self, release: bool) -> Result<(), SyncError> {
        self.clean_crate(CrateKind::Lib, release)?;
        self.clean_crate(CrateKind::Bin, release)?;
        self.clean_docs()
    }

    pub fn test_crate(&self, kind: CrateKind) -> Result<(), SyncError> {
        let test = self.cargo("test", kind).arg("--no-fail-fast");
        self.run_checked(test).map(drop)
    }

    pub fn test_all(&self) -> Result<(), SyncError> {
        self.test_crate(CrateKind::Lib)?;
        self.test_crate(CrateKind::Bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use std::cell::RefCell;

    const HELP: &str = "rush 0.1.0\nAbout\n\nUSAGE:\n    rush [--parse] <EXPR>\n";
    const README: &str = "# rush\n\n## Usage\n\nold\n\n## License\n\nMIT\n";

    /// Answers with canned outputs, keyed by the first argument of each invocation.
    #[derive(Default)]
    struct ScriptedRunner {
        responses: Vec<(&'static str, &'static str, ToolOutput)>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        fn respond(
            mut self,
            program: &'static str,
            first_arg: &'static str,
            code: i32,
            stdout: &str,
        ) -> Self {
            self.responses.push((
                program,
                first_arg,
                ToolOutput {
                    code,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                },
            ));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(ToString::to_string).collect()
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> Result<ToolOutput, SyncError> {
            self.calls.borrow_mut().push(invocation.clone());
            let first = invocation.args.first().map(String::as_str).unwrap_or("");
            Ok(self
                .responses
                .iter()
                .find(|(program, arg, _)| *program == invocation.program && *arg == first)
                .map(|(_, _, output)| output.clone())
                .unwrap_or_default())
        }
    }

    fn healthy_runner() -> ScriptedRunner {
        ScriptedRunner::default()
            .respond("rustc", "--version", 0, "rustc 1.80.0 (051478957 2024-07-21)")
            .respond("cargo", "run", 0, HELP)
    }

    fn project() -> assert_fs::TempDir {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("README.md").write_str(README).unwrap();
        root
    }

    #[test]
    fn build_bin_writes_usage_into_readme() {
        let root = project();
        let runner = healthy_runner();
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        pipeline.build_bin(BuildFlags::default()).unwrap();

        root.child("README.md").assert(
            "# rush\n\n## Usage\n\n    rh [--parse]\n        <EXPR>\n\n## License\n\nMIT\n",
        );
        assert_eq!(
            runner.calls(),
            vec![
                "rustc --version",
                "cargo build --manifest-path crates/rush/Cargo.toml",
                "cargo run --manifest-path crates/rush/Cargo.toml",
            ]
        );
    }

    #[test]
    fn failing_binary_propagates_exit_code_and_keeps_readme() {
        let root = project();
        let runner = ScriptedRunner::default()
            .respond("rustc", "--version", 0, "rustc 1.80.0")
            .respond("cargo", "run", 101, "");
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        let err = pipeline.build_bin(BuildFlags::default()).unwrap_err();

        assert_eq!(err.exit_code(), 101);
        root.child("README.md").assert(README);
    }

    #[test]
    fn missing_markers_leave_readme_untouched() {
        let root = assert_fs::TempDir::new().unwrap();
        let readme = "# rush\n\n## Usage\n\nonly section\n";
        root.child("README.md").write_str(readme).unwrap();
        let runner = healthy_runner();
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        let err = pipeline.build_bin(BuildFlags::default()).unwrap_err();

        assert_eq!(err.exit_code(), 2);
        root.child("README.md").assert(readme);
    }

    #[test]
    fn old_rustc_stops_before_cargo() {
        let root = project();
        let runner = ScriptedRunner::default().respond("rustc", "--version", 0, "rustc 1.0.0");
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        let err = pipeline.build_lib(BuildFlags::default()).unwrap_err();

        assert!(matches!(err, SyncError::RustcTooOld { .. }));
        assert_eq!(runner.calls(), vec!["rustc --version"]);
    }

    #[test]
    fn release_docs_build_purges_ignored_paths() {
        let root = project();
        root.child("docs/.docsignore").write_str("*.md\n").unwrap();
        root.child("site/index.html").touch().unwrap();
        root.child("site/README.md").touch().unwrap();
        let runner = ScriptedRunner::default();
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        let debug = pipeline.build_docs(BuildFlags::default()).unwrap();
        assert!(debug.is_none());
        root.child("site/README.md").assert(predicate::path::exists());

        let release = BuildFlags {
            release: true,
            verbose: false,
        };
        let report = pipeline.build_docs(release).unwrap().unwrap();

        assert_eq!(report.removed, vec![root.path().join("site/README.md")]);
        root.child("site/index.html").assert(predicate::path::exists());
        assert_eq!(
            runner.calls(),
            vec!["mkdocs build --strict", "mkdocs build --strict --clean"]
        );
    }

    #[test]
    fn failed_mkdocs_build_skips_purge() {
        let root = project();
        root.child("docs/.docsignore").write_str("*.html\n").unwrap();
        root.child("site/index.html").touch().unwrap();
        let runner = ScriptedRunner::default().respond("mkdocs", "build", 1, "");
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        let release = BuildFlags {
            release: true,
            verbose: true,
        };
        let err = pipeline.build_docs(release).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        root.child("site/index.html").assert(predicate::path::exists());
    }

    #[test]
    fn clean_all_removes_site_and_cleans_both_crates() {
        let root = project();
        root.child("site/index.html").touch().unwrap();
        let runner = ScriptedRunner::default();
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        pipeline.clean_all(true).unwrap();

        root.child("site").assert(predicate::path::missing());
        assert_eq!(
            runner.calls(),
            vec![
                "cargo clean --manifest-path crates/librush/Cargo.toml --release",
                "cargo clean --manifest-path crates/rush/Cargo.toml --release",
            ]
        );
    }

    #[test]
    fn test_all_stops_at_first_failure() {
        let root = project();
        let runner = ScriptedRunner::default().respond("cargo", "test", 101, "");
        let pipeline = Pipeline::new(root.path(), ProjectConfig::default(), &runner);

        let err = pipeline.test_all().unwrap_err();

        assert_eq!(err.exit_code(), 101);
        assert_eq!(
            runner.calls(),
            vec!["cargo test --manifest-path crates/librush/Cargo.toml --no-fail-fast"]
        );
    }
}
