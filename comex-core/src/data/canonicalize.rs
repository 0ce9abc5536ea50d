//! Date canonicalization.
//!
//! Dates are normalized once at parse time ([`canonicalize_date`]). Artifact
//! files still get a textual pass over their leading date field
//! ([`DateCanonicalizer`]) so that files produced by older runs match the
//! fixed-width `YYYY-MM-DD` form downstream consumers expect.

use crate::domain::ARTIFACT_EXTENSION;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize a record date to `YYYY-MM-DD`. Values chrono cannot read are
/// passed through the textual month repair instead.
pub fn canonicalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    match NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        Ok(date) => date.format(DATE_FORMAT).to_string(),
        Err(_) => canonicalize_line(trimmed).into_owned(),
    }
}

/// Zero-pad a single-digit month in the leading date field of one line.
///
/// Only the start of the line is inspected, so `-M-` fragments in other
/// columns are never touched.
pub fn canonicalize_line(line: &str) -> Cow<'_, str> {
    static LEADING_DATE: OnceLock<Regex> = OnceLock::new();
    let pattern = LEADING_DATE
        .get_or_init(|| Regex::new(r"^([0-9]{4})-([0-9])-").expect("leading date pattern is valid"));
    pattern.replace(line, "${1}-0${2}-")
}

#[derive(Debug, Error)]
pub enum CanonicalizeError {
    #[error("cannot walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot rewrite {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a pass over an artifact tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalizeSummary {
    /// `.ipv` files inspected.
    pub files_scanned: usize,
    /// Files whose content changed and was written back.
    pub files_rewritten: usize,
    /// Lines changed across all files.
    pub lines_changed: usize,
}

/// Textual date repair over artifact files.
pub struct DateCanonicalizer;

impl DateCanonicalizer {
    /// Canonicalize file content line by line, keeping line endings.
    /// Returns the new content and the number of lines changed.
    pub fn canonicalize_content(content: &str) -> (String, usize) {
        let mut out = String::with_capacity(content.len() + 16);
        let mut changed = 0;
        for line in content.split_inclusive('\n') {
            let fixed = canonicalize_line(line);
            if matches!(fixed, Cow::Owned(_)) {
                changed += 1;
            }
            out.push_str(&fixed);
        }
        (out, changed)
    }

    /// Rewrite one file in place. Files without changes are left untouched.
    pub fn canonicalize_file(path: &Path) -> Result<usize, CanonicalizeError> {
        let io_err = |source: std::io::Error| CanonicalizeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = fs::read_to_string(path).map_err(io_err)?;
        let (fixed, changed) = Self::canonicalize_content(&content);
        if changed > 0 {
            let tmp = path.with_extension(format!("{ARTIFACT_EXTENSION}.tmp"));
            fs::write(&tmp, fixed).map_err(io_err)?;
            fs::rename(&tmp, path).map_err(|source| {
                let _ = fs::remove_file(&tmp);
                io_err(source)
            })?;
            debug!(path = %path.display(), lines = changed, "dates canonicalized");
        }
        Ok(changed)
    }

    /// Walk `root` and canonicalize every `.ipv` file below it.
    pub fn canonicalize_tree(root: &Path) -> Result<CanonicalizeSummary, CanonicalizeError> {
        let mut summary = CanonicalizeSummary::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| CanonicalizeError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION)
            {
                continue;
            }
            summary.files_scanned += 1;
            let changed = Self::canonicalize_file(path)?;
            if changed > 0 {
                summary.files_rewritten += 1;
                summary.lines_changed += changed;
            }
        }
        info!(
            root = %root.display(),
            scanned = summary.files_scanned,
            rewritten = summary.files_rewritten,
            "date canonicalization finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_digit_month_is_padded() {
        assert_eq!(canonicalize_line("2024-3-01,10.0,COMEX:001_EX_US_BR"), "2024-03-01,10.0,COMEX:001_EX_US_BR");
    }

    #[test]
    fn test_two_digit_month_is_unchanged() {
        let line = "2024-12-01,10.0,COMEX:001_EX_US_BR";
        assert!(matches!(canonicalize_line(line), Cow::Borrowed(_)));
    }

    #[test]
    fn test_only_leading_field_is_touched() {
        let line = "<DATA>,<KGL>,<COD>\n";
        assert_eq!(canonicalize_line(line), line);
        let line = "2024-01-01,2024-5-7,COMEX:001_EX_US_BR";
        assert_eq!(canonicalize_line(line), line);
    }

    #[test]
    fn test_canonicalize_date_via_chrono() {
        assert_eq!(canonicalize_date("2024-1-01"), "2024-01-01");
        assert_eq!(canonicalize_date("2024-1-1"), "2024-01-01");
        assert_eq!(canonicalize_date(" 2023-11-01 "), "2023-11-01");
        assert_eq!(canonicalize_date("2024-7-xx"), "2024-07-xx");
    }

    #[test]
    fn test_content_keeps_line_endings() {
        let content = "<DATA>,<KGL>\r\n2024-1-01,1.0\r\n2024-10-01,2.0";
        let (fixed, changed) = DateCanonicalizer::canonicalize_content(content);
        assert_eq!(fixed, "<DATA>,<KGL>\r\n2024-01-01,1.0\r\n2024-10-01,2.0");
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_tree_only_rewrites_ipv_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("country_series");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("a.ipv"), "<DATA>,<KGL>\n2024-2-01,1.0\n").unwrap();
        fs::write(nested.join("b.ipv"), "<DATA>,<KGL>\n2024-02-01,1.0\n").unwrap();
        fs::write(nested.join("notes.csv"), "2024-2-01,1.0\n").unwrap();

        let summary = DateCanonicalizer::canonicalize_tree(dir.path()).unwrap();
        assert_eq!(summary.files_scanned, 2);
        assert_eq!(summary.files_rewritten, 1);
        assert_eq!(summary.lines_changed, 1);
        assert_eq!(
            fs::read_to_string(nested.join("a.ipv")).unwrap(),
            "<DATA>,<KGL>\n2024-02-01,1.0\n"
        );
        assert_eq!(fs::read_to_string(nested.join("notes.csv")).unwrap(), "2024-2-01,1.0\n");

        let again = DateCanonicalizer::canonicalize_tree(dir.path()).unwrap();
        assert_eq!(again.files_rewritten, 0);
    }
}
