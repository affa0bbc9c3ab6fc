//! Deletes generated files that the documentation builder cannot be told to skip.

use crate::error::SyncError;
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads ignore patterns from `ignore_file`.
///
/// Blank lines and lines starting with `#` (after leading whitespace) are
/// skipped; kept lines lose their trailing whitespace. A missing file yields
/// `Ok(None)`.
pub fn read_patterns(ignore_file: &Path) -> Result<Option<Vec<String>>, SyncError> {
    let content = match fs::read_to_string(ignore_file) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(SyncError::io(ignore_file, err)),
    };

    Ok(Some(parse_patterns(&content)))
}

/// Extracts the patterns from the content of an ignore file.
pub fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Resolves `patterns` against `root`, returning every match of every pattern in order.
///
/// Matches of overlapping patterns are repeated. The characters of `root`
/// itself are escaped so only the pattern part is interpreted as a glob.
pub fn resolve(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, SyncError> {
    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let mut matches = Vec::new();

    for pattern in patterns {
        let relative = pattern.trim_start_matches(['/', '\\']);
        let full = Path::new(&escaped_root).join(relative);
        let paths = glob::glob(&full.to_string_lossy()).map_err(|err| {
            SyncError::InvalidPattern {
                pattern: pattern.clone(),
                message: err.msg.to_string(),
            }
        })?;

        for entry in paths {
            match entry {
                Ok(path) => matches.push(path),
                Err(err) => {
                    let path = err.path().to_path_buf();
                    return Err(SyncError::io(path, err.into()));
                }
            }
        }
    }

    Ok(matches)
}

/// Removes a single resolved path: directories recursively, anything else as a file.
///
/// Returns `false` when the path is already gone.
fn remove_path(path: &Path) -> Result<bool, SyncError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(SyncError::io(path, err)),
    };

    let removal = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match removal {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(SyncError::io(path, err)),
    }
}

/// Paths removed by a purge, in removal order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
}

/// Deletes every entry under `output_dir` matched by a pattern of `ignore_file`.
///
/// A missing ignore file is not an error: nothing is deleted. The first
/// failed deletion aborts the purge.
pub fn purge_ignored(output_dir: &Path, ignore_file: &Path) -> Result<PurgeReport, SyncError> {
    let Some(patterns) = read_patterns(ignore_file)? else {
        log::info!(
            "{} not found, not removing any ignored files.",
            ignore_file.display()
        );
        return Ok(PurgeReport::default());
    };
    log::info!(
        "{} file found, applying {} ignore pattern(s)...",
        ignore_file.display(),
        patterns.len()
    );

    let mut report = PurgeReport::default();
    for path in resolve(output_dir, &patterns)? {
        if remove_path(&path)? {
            log::info!("Removed ignored file/directory '{}'", path.display());
            report.removed.push(path);
        } else {
            log::debug!("'{}' was already removed", path.display());
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    #[test]
    fn parse_patterns_skips_blank_and_comment_lines() {
        let content = "# comment\n\n   \n  # indented comment\n*.log   \n  build/\n";
        assert_eq!(parse_patterns(content), vec!["*.log", "  build/"]);
    }

    #[test]
    fn missing_ignore_file_deletes_nothing() {
        let site = assert_fs::TempDir::new().unwrap();
        site.child("index.html").touch().unwrap();

        let report = purge_ignored(site.path(), &site.path().join(".docsignore")).unwrap();

        assert!(report.removed.is_empty());
        site.child("index.html").assert(predicate::path::exists());
    }

    #[test]
    fn purge_removes_files_and_directories() {
        let site = assert_fs::TempDir::new().unwrap();
        site.child("a.tmp").touch().unwrap();
        site.child("keep.txt").touch().unwrap();
        site.child("build/x.html").touch().unwrap();
        let ignore = site.child("patterns");
        ignore.write_str("*.tmp\nbuild/\n").unwrap();

        let report = purge_ignored(site.path(), ignore.path()).unwrap();

        assert_eq!(report.removed.len(), 2);
        site.child("a.tmp").assert(predicate::path::missing());
        site.child("build").assert(predicate::path::missing());
        site.child("keep.txt").assert(predicate::path::exists());
    }

    #[test]
    fn overlapping_patterns_are_tolerated() {
        let site = assert_fs::TempDir::new().unwrap();
        site.child("assets/app.js").touch().unwrap();
        site.child("assets/nested/lib.js").touch().unwrap();
        let ignore = site.child(".docsignore");
        ignore.write_str("assets\n**/*.js\nassets/*.js\n").unwrap();

        let report = purge_ignored(site.path(), ignore.path()).unwrap();

        assert_eq!(report.removed, vec![site.path().join("assets")]);
        site.child("assets").assert(predicate::path::missing());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_removed_without_following_them() {
        let outside = assert_fs::TempDir::new().unwrap();
        outside.child("shared/style.css").touch().unwrap();
        let site = assert_fs::TempDir::new().unwrap();
        let link = site.child("shared");
        std::os::unix::fs::symlink(outside.child("shared").path(), link.path()).unwrap();
        let ignore = site.child(".docsignore");
        ignore.write_str("shared\n").unwrap();

        let report = purge_ignored(site.path(), ignore.path()).unwrap();

        assert_eq!(report.removed, vec![site.path().join("shared")]);
        assert!(fs::symlink_metadata(link.path()).is_err());
        outside
            .child("shared/style.css")
            .assert(predicate::path::exists());
    }

    #[test]
    fn recursive_patterns_reach_nested_entries() {
        let site = assert_fs::TempDir::new().unwrap();
        site.child("a/b/c/notes.md").touch().unwrap();
        site.child("a/b/page.html").touch().unwrap();

        let matches = resolve(site.path(), &["**/*.md".to_string()]).unwrap();

        assert_eq!(matches, vec![site.path().join("a/b/c/notes.md")]);
    }

    #[test]
    fn leading_slash_stays_rooted_in_output_dir() {
        let site = assert_fs::TempDir::new().unwrap();
        site.child("sitemap.xml").touch().unwrap();

        let matches = resolve(site.path(), &["/sitemap.xml".to_string()]).unwrap();

        assert_eq!(matches, vec![site.path().join("sitemap.xml")]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let site = assert_fs::TempDir::new().unwrap();

        let err = resolve(site.path(), &["[".to_string()]).unwrap_err();

        assert!(matches!(err, SyncError::InvalidPattern { ref pattern, .. } if pattern == "["));
    }
}
