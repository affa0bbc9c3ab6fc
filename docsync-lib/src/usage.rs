//! Turns a binary's raw `--help` style output into an indented Markdown block.

use crate::error::SyncError;
use crate::LINE_SEPARATOR;
use regex::Regex;
use std::sync::OnceLock;

/// Indentation that turns a line into part of a Markdown indented code block.
pub const CODE_INDENT: &str = "    ";

const USAGE_HEADER: &str = "USAGE";

fn flag_regex() -> &'static Regex {
    static FLAG: OnceLock<Regex> = OnceLock::new();
    FLAG.get_or_init(|| Regex::new(r"--(?:\w|[-_])+").expect("flag token pattern is valid"))
}

/// Names substituted in the usage synopsis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryNames {
    /// Name the binary reports for itself (usually the crate name).
    pub internal: String,
    /// Name users actually type.
    pub public: String,
}

impl BinaryNames {
    pub fn new(internal: impl Into<String>, public: impl Into<String>) -> Self {
        Self {
            internal: internal.into(),
            public: public.into(),
        }
    }
}

/// Collects every `--flag` token mentioned in a usage synopsis line, in order of appearance.
pub fn extract_flags(synopsis: &str) -> Vec<String> {
    flag_regex()
        .find_iter(synopsis)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Keeps a help line unless it documents a flag that is absent from the synopsis.
fn mentions_known_flag(line: &str, flags: &[String]) -> bool {
    !line.contains("--") || flags.iter().any(|flag| line.contains(flag.as_str()))
}

/// Breaks the synopsis after every `]` followed by a space and renames the binary.
fn wrap_synopsis(synopsis: &str, names: &BinaryNames) -> Vec<String> {
    let continuation = format!("]\n{CODE_INDENT}");
    let mut wrapped = synopsis.trim().split("] ").collect::<Vec<_>>().join(&continuation);
    if !names.internal.is_empty() {
        wrapped = wrapped.replace(&names.internal, &names.public);
    }
    wrapped.lines().map(str::to_string).collect()
}

/// Normalizes raw help output into the block that gets spliced into the document.
///
/// Everything before the `USAGE` header is treated as banner text and dropped,
/// along with the header itself. Description lines for flags that do not
/// appear in the synopsis are removed, the synopsis is wrapped at `] `
/// boundaries, and every line is indented as a Markdown code block.
///
/// Returns [`SyncError::UsageNotFound`] when there is no `USAGE` header or no
/// synopsis line after it.
pub fn normalize_help(raw: &str, names: &BinaryNames) -> Result<String, SyncError> {
    let lines: Vec<&str> = raw.trim().lines().map(str::trim_end).collect();

    let header = lines
        .iter()
        .position(|line| line.starts_with(USAGE_HEADER))
        .ok_or(SyncError::UsageNotFound)?;
    let (synopsis, rest) = lines[header + 1..]
        .split_first()
        .ok_or(SyncError::UsageNotFound)?;

    let flags = extract_flags(synopsis);
    log::debug!("Flags found in usage synopsis: {flags:?}");

    let mut help_lines = wrap_synopsis(synopsis, names);
    help_lines.extend(
        rest.iter()
            .filter(|line| mentions_known_flag(line, &flags))
            .map(|line| line.to_string()),
    );

    Ok(help_lines
        .iter()
        .map(|line| format!("{CODE_INDENT}{line}"))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR))
}
