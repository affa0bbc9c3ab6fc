//! `docsync-lib` keeps a project's hand-written documentation in step with
//! what its build produces.
//!
//! Two routines do the actual work:
//!
//! - [`usage`] and [`region`] take the help text a freshly built binary prints
//!   and splice it into the usage section of the README;
//! - [`purge`] deletes generated site files matched by an ignore file, for
//!   site generators that cannot be told to skip them.
//!
//! [`pipeline`] sequences them with the external tools (cargo, rustc, mkdocs)
//! behind the [`toolchain::ToolRunner`] trait.
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//!
//! use docsync_lib::region::splice_usage;
//! use docsync_lib::usage::{normalize_help, BinaryNames};
//!
//! # fn demo() -> Result<(), docsync_lib::error::SyncError> {
//! let help = "rush 0.1.0\n\nUSAGE:\n    rush [--parse] <EXPRESSION>\n";
//! let block = normalize_help(help, &BinaryNames::new("rush", "rh"))?;
//!
//! let readme = "# rush\n\n## Usage\n\n## License\n";
//! let updated = splice_usage(readme, &block, "Usage", Path::new("README.md"))?;
//! assert!(updated.contains("    rh [--parse]"));
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod purge;
pub mod region;
pub mod toolchain;
pub mod usage;

use crate::error::SyncError;
use std::io::Write;
use std::path::Path;

/// Line separator used when writing documents.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
/// Line separator used when writing documents.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Replaces `path` with `content` through a temporary file in the same directory.
pub(crate) fn write_atomically(path: &Path, content: &str) -> Result<(), SyncError> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::Builder::new()
        .prefix(".docsync-")
        .suffix(".tmp")
        .tempfile_in(parent_dir)
        .map_err(|err| SyncError::io(parent_dir, err))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|err| SyncError::io(temp_file.path(), err))?;

    // Temporary files are created owner-only; keep the document's own mode.
    if let Ok(metadata) = std::fs::metadata(path) {
        temp_file
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(|err| SyncError::io(temp_file.path(), err))?;
    }

    temp_file
        .persist(path)
        .map_err(|err| SyncError::io(path, err.error))?;

    Ok(())
}
