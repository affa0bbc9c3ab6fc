//! Project configuration: `docsync.toml` for the pipeline, `mkdocs.yml` for the site layout.

use crate::error::SyncError;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the optional pipeline configuration at the project root.
pub const CONFIG_FILE_NAME: &str = "docsync.toml";

/// Settings that drive every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory holding the member crates, relative to the project root.
    pub crates_dir: PathBuf,
    /// Crate producing the executable whose usage gets documented.
    pub bin_crate: String,
    /// Library crate built by `build lib`.
    pub lib_crate: String,
    /// Name the binary uses for itself in its help output.
    pub binary_name: String,
    /// Name the binary is installed under.
    pub public_name: String,
    /// Document receiving the usage block.
    pub readme: PathBuf,
    /// Text identifying the usage header in the document.
    pub usage_title: String,
    /// Oldest rustc able to build the project.
    pub min_rustc_version: semver::Version,
    /// MkDocs configuration file.
    pub mkdocs_config: PathBuf,
    /// Ignore file name, looked up inside the docs source directory.
    pub ignore_file: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            crates_dir: PathBuf::from("crates"),
            bin_crate: "rush".to_string(),
            lib_crate: "librush".to_string(),
            binary_name: "rush".to_string(),
            public_name: "rh".to_string(),
            readme: PathBuf::from("README.md"),
            usage_title: "Usage".to_string(),
            min_rustc_version: semver::Version::new(1, 10, 0),
            mkdocs_config: PathBuf::from("mkdocs.yml"),
            ignore_file: ".docsignore".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Loads `docsync.toml` from `root`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self, SyncError> {
        let path = root.join(CONFIG_FILE_NAME);
        let Some(content) = read_optional(&path)? else {
            log::info!("{} not found, using default settings", path.display());
            return Ok(Self::default());
        };
        Self::from_toml(&content, &path)
    }

    pub fn from_toml(content: &str, path: &Path) -> Result<Self, SyncError> {
        toml::from_str(content).map_err(|err| SyncError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct MkDocsConfig {
    docs_dir: Option<PathBuf>,
    site_dir: Option<PathBuf>,
}

/// Source and output directories of the documentation site, resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsLayout {
    pub docs_dir: PathBuf,
    pub site_dir: PathBuf,
}

impl DocsLayout {
    /// Reads `docs_dir` and `site_dir` from the MkDocs configuration.
    ///
    /// Missing keys, or a missing file, fall back to `docs` and `site`. Other
    /// MkDocs settings are ignored.
    pub fn load(root: &Path, mkdocs_config: &Path) -> Result<Self, SyncError> {
        let path = root.join(mkdocs_config);
        let config = match read_optional(&path)? {
            Some(content) => parse_mkdocs(&content, &path)?,
            None => {
                log::info!(
                    "{} not found; assuming default docs and site directories",
                    path.display()
                );
                MkDocsConfig::default()
            }
        };

        Ok(Self {
            docs_dir: root.join(config.docs_dir.unwrap_or_else(|| PathBuf::from("docs"))),
            site_dir: root.join(config.site_dir.unwrap_or_else(|| PathBuf::from("site"))),
        })
    }
}

fn parse_mkdocs(content: &str, path: &Path) -> Result<MkDocsConfig, SyncError> {
    // MkDocs files routinely use `!!python/name:` tags that don't map to a
    // typed struct, so go through a generic value first.
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| SyncError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let dir = |key: &str| -> Option<PathBuf> {
        value
            .get(key)
            .and_then(serde_yaml::Value::as_str)
            .map(PathBuf::from)
    };

    Ok(MkDocsConfig {
        docs_dir: dir("docs_dir"),
        site_dir: dir("site_dir"),
    })
}

fn read_optional(path: &Path) -> Result<Option<String>, SyncError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(SyncError::io(path, err)),
    }
}
