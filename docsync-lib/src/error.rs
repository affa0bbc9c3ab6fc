//! Defines custom error types for the library.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code reported when the usage region of the target document cannot be located.
pub const MISSING_MARKERS_EXIT_CODE: i32 = 2;

#[derive(Error, Debug)]
/// Error type returned when a documentation synchronization stage fails.
pub enum SyncError {
    #[error("`{tool}` exited with status {code}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to launch `{tool}`: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build requires at least Rust {required}, found {found}")]
    RustcTooOld {
        required: semver::Version,
        found: semver::Version,
    },

    #[error("Could not determine the Rust compiler version from `{0}`")]
    RustcVersionUnparsable(String),

    #[error("Help text does not contain a USAGE section")]
    UsageNotFound,

    #[error("Usage begin or end markers not found in {path} (begin: {begin:?}, end: {end:?})")]
    RegionMarkersNotFound {
        path: PathBuf,
        begin: Option<usize>,
        end: Option<usize>,
    },

    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to parse configuration file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// The process exit code a caller should terminate with for this error.
    ///
    /// External tool failures propagate the tool's own status, missing region
    /// markers map to [`MISSING_MARKERS_EXIT_CODE`], and everything else to `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::ToolFailed { code, .. } if *code != 0 => *code,
            SyncError::RegionMarkersNotFound { .. } => MISSING_MARKERS_EXIT_CODE,
            _ => 1,
        }
    }
}
