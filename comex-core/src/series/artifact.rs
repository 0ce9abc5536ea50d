//! Reading and writing `.ipv` artifact files.

use crate::data::schema::{ArtifactLayout, SchemaError, ARTIFACT_CODE, ARTIFACT_DATE};
use crate::domain::{SeriesCodeError, ARTIFACT_EXTENSION};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("cannot write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("schema mismatch in {path}: {source}")]
    SchemaMismatch {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("{path}: {source}")]
    Code {
        path: PathBuf,
        #[source]
        source: SeriesCodeError,
    },

    #[error("{path}: row {row} has no <COD> value")]
    MissingCode { path: PathBuf, row: usize },

    #[error("record table has no column {0}")]
    MissingColumn(String),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// An artifact loaded from disk together with the layout found in its header.
#[derive(Debug, Clone)]
pub struct ArtifactTable {
    pub layout: ArtifactLayout,
    pub frame: DataFrame,
}

impl ArtifactTable {
    pub fn rows(&self) -> usize {
        self.frame.height()
    }

    /// Row count per distinct `<COD>` value, ordered by code.
    pub fn code_counts(&self) -> Result<BTreeMap<String, usize>, ArtifactError> {
        let mut counts = BTreeMap::new();
        for code in self.frame.column(ARTIFACT_CODE)?.str()?.into_iter().flatten() {
            *counts.entry(code.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Read an artifact, deciding export/import layout from its header.
pub fn read_artifact(path: &Path) -> Result<ArtifactTable, ArtifactError> {
    let raw = read_text(path)?;
    let names: Vec<&str> = raw.get_column_names().iter().map(|n| n.as_str()).collect();
    let layout = ArtifactLayout::detect(&names);
    let frame = impose_layout(path, raw, layout)?;
    Ok(ArtifactTable { layout, frame })
}

/// Read an artifact that must follow `layout`. A missing or unexpected
/// column is an error; columns come back in canonical order.
pub fn read_artifact_as(path: &Path, layout: ArtifactLayout) -> Result<DataFrame, ArtifactError> {
    let raw = read_text(path)?;
    impose_layout(path, raw, layout)
}

fn read_text(path: &Path) -> Result<DataFrame, ArtifactError> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn impose_layout(
    path: &Path,
    raw: DataFrame,
    layout: ArtifactLayout,
) -> Result<DataFrame, ArtifactError> {
    let names: Vec<&str> = raw.get_column_names().iter().map(|n| n.as_str()).collect();
    layout
        .check_header(&names)
        .map_err(|source| ArtifactError::SchemaMismatch {
            path: path.to_path_buf(),
            source,
        })?;

    let columns: Vec<Expr> = layout
        .columns()
        .into_iter()
        .map(|name| {
            if name == ARTIFACT_DATE || name == ARTIFACT_CODE {
                col(name)
            } else {
                col(name).strict_cast(DataType::Float64)
            }
        })
        .collect();

    raw.lazy()
        .select(columns)
        .collect()
        .map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Create or overwrite `path` with `df` as CSV.
pub fn write_frame(path: &Path, df: &mut DataFrame) -> Result<(), ArtifactError> {
    let mut file = File::create(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Write to `{path}.tmp` then rename into place, so the final name never
/// shows a partially written file.
pub fn write_frame_atomic(path: &Path, df: &mut DataFrame) -> Result<(), ArtifactError> {
    let tmp_path = path.with_extension(format!("{ARTIFACT_EXTENSION}.tmp"));
    write_frame(&tmp_path, df)?;
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}
