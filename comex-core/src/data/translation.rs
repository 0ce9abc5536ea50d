//! Legacy partner-country code → canonical code table.
//!
//! File format: CSV with one header row and exactly two columns
//! (legacy, canonical). The table is immutable once loaded and is handed to
//! the series extractor explicitly.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Returned by [`TranslationTable::lookup`] for codes missing from the table.
pub const UNKNOWN_CODE: &str = "unknown";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("cannot open translation table {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse translation table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: expected 2 columns (legacy, canonical), found {found}")]
    ColumnCount {
        path: PathBuf,
        line: u64,
        found: usize,
    },

    #[error("{path}:{line}: empty legacy code")]
    EmptyCode { path: PathBuf, line: u64 },
}

#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    codes: HashMap<String, String>,
}

impl TranslationTable {
    /// Load the table from disk. Any structural problem is an error; the
    /// country dimension cannot be extracted correctly without it.
    pub fn load(path: &Path) -> Result<Self, TranslationError> {
        let file = File::open(path).map_err(|source| TranslationError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut codes = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|source| TranslationError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            if record.len() != 2 {
                return Err(TranslationError::ColumnCount {
                    path: path.to_path_buf(),
                    line,
                    found: record.len(),
                });
            }
            let (legacy, canonical) = (&record[0], &record[1]);
            if legacy.is_empty() {
                return Err(TranslationError::EmptyCode {
                    path: path.to_path_buf(),
                    line,
                });
            }
            codes.insert(legacy.to_string(), canonical.to_string());
        }

        info!(path = %path.display(), entries = codes.len(), "translation table loaded");
        Ok(Self { codes })
    }

    /// Canonical code for `legacy`, or [`UNKNOWN_CODE`].
    pub fn lookup(&self, legacy: &str) -> &str {
        self.codes.get(legacy).map(String::as_str).unwrap_or(UNKNOWN_CODE)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            codes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
