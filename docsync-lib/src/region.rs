//! Locates the usage section of a Markdown document and replaces its body.
//!
//! The document is never parsed as Markdown. It is split into three opaque
//! regions using header lines only: everything up to and including the usage
//! header, the body that gets replaced, and everything from the next header
//! onward. Prose around the usage section therefore survives verbatim.

use crate::error::SyncError;
use crate::LINE_SEPARATOR;
use std::path::{Path, PathBuf};

/// Boundary indices of the usage section, as line numbers into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRegion {
    /// The header line whose title contains the usage title.
    pub begin: usize,
    /// The first header line after `begin`.
    pub end: usize,
}

/// A line is a header when `#` follows at most three leading spaces.
///
/// Four spaces make an indented code line, which is how the usage block
/// itself is written, so `#` lines inside it never act as markers.
pub fn is_header(line: &str) -> bool {
    let indent = line.len() - line.trim_start_matches(' ').len();
    indent <= 3 && line[indent..].starts_with('#')
}

fn header_title(line: &str) -> &str {
    line.trim_start().trim_start_matches('#').trim()
}

/// Scans `lines` for the usage section.
///
/// Returns the pair of indices when both are present, or the partial result
/// (`begin`, `end`) so the caller can report what was found.
pub fn locate_region(
    lines: &[&str],
    title: &str,
) -> Result<UsageRegion, (Option<usize>, Option<usize>)> {
    let mut begin = None;
    let mut end = None;

    for (index, line) in lines.iter().enumerate() {
        if !is_header(line) {
            continue;
        }
        if begin.is_none() {
            if header_title(line).contains(title) {
                begin = Some(index);
            }
        } else {
            end = Some(index);
            break;
        }
    }

    match (begin, end) {
        (Some(begin), Some(end)) => {
            if let Some(duplicate) = lines[end..]
                .iter()
                .position(|line| is_header(line) && header_title(line).contains(title))
            {
                log::warn!(
                    "Header at line {} also mentions '{title}'; using the first one at line {}",
                    end + duplicate + 1,
                    begin + 1
                );
            }
            Ok(UsageRegion { begin, end })
        }
        (begin, end) => Err((begin, end)),
    }
}

/// Returns `document` with the body of its usage section replaced by `block`.
///
/// `path` only serves error reporting. Trailing whitespace is stripped from
/// every existing line and the result always ends with a line separator.
pub fn splice_usage(
    document: &str,
    block: &str,
    title: &str,
    path: &Path,
) -> Result<String, SyncError> {
    let lines: Vec<&str> = document.lines().map(str::trim_end).collect();

    let region = locate_region(&lines, title).map_err(|(begin, end)| {
        log::error!(
            "Usage begin or end markers not found in {} (begin: {begin:?}, end: {end:?})",
            path.display()
        );
        SyncError::RegionMarkersNotFound {
            path: path.to_path_buf(),
            begin,
            end,
        }
    })?;

    let prefix = lines[..=region.begin].join(LINE_SEPARATOR);
    let suffix = lines[region.end..].join(LINE_SEPARATOR);

    Ok([prefix.as_str(), "", block, "", suffix.as_str(), ""].join(LINE_SEPARATOR))
}

/// A document whose usage section has been rewritten in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplicedDocument {
    pub path: PathBuf,
    pub original: String,
    pub rendered: String,
}

impl SplicedDocument {
    /// Reads `path` and splices `block` into it without touching the file.
    pub fn load(path: &Path, block: &str, title: &str) -> Result<Self, SyncError> {
        let original =
            std::fs::read_to_string(path).map_err(|source| SyncError::io(path, source))?;
        let rendered = splice_usage(&original, block, title, path)?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
            rendered,
        })
    }

    pub fn is_changed(&self) -> bool {
        self.original != self.rendered
    }

    /// Unified diff between the document on disk and the spliced version.
    pub fn diff(&self) -> String {
        similar::TextDiff::from_lines(&self.original, &self.rendered)
            .unified_diff()
            .header("original", "modified")
            .to_string()
    }

    /// Replaces the document on disk with the spliced content.
    ///
    /// The content is written to a temporary file next to the document and
    /// then persisted over it, so the original is either fully replaced or
    /// left as it was.
    pub fn write(&self) -> Result<(), SyncError> {
        crate::write_atomically(&self.path, &self.rendered)
    }
}
