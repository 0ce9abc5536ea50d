use crate::data::canonicalize::canonicalize_date;
use crate::data::schema::{RecordSchema, COMMODITY_CODE, DATE};
use crate::domain::{Dimension, FlowDirection};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One series to emit: a commodity and a raw dimension value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDefinition {
    pub commodity: String,
    pub value: String,
}

impl SeriesDefinition {
    pub fn new(commodity: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            commodity: commodity.into(),
            value: value.into(),
        }
    }
}

/// Reads processed record tables and series definition tables.
///
/// Every column is read as text first so that codes keep their leading zeros;
/// measures are then cast to `Float64` and dates normalized to `YYYY-MM-DD`.
pub struct DataIngestor;

impl DataIngestor {
    /// Load a processed record table for one flow direction.
    pub fn read_records(path: &Path, flow: FlowDirection) -> Result<DataFrame, DataError> {
        let raw = read_text_csv(path)?;
        require_columns(path, &raw, &RecordSchema::required_columns(flow))?;

        let casts: Vec<Expr> = flow
            .measures()
            .iter()
            .map(|m| col(m.record_column()).strict_cast(DataType::Float64))
            .collect();
        let mut df = raw
            .lazy()
            .with_columns(casts)
            .collect()
            .map_err(|source| DataError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let dates: Vec<Option<String>> = df
            .column(DATE)?
            .str()?
            .into_iter()
            .map(|d| d.map(canonicalize_date))
            .collect();
        df.with_column(Series::new(DATE.into(), dates))?;

        info!(path = %path.display(), rows = df.height(), flow = %flow, "records loaded");
        Ok(df)
    }

    /// Zero-row record table with the full schema for `flow`.
    pub fn empty_records(flow: FlowDirection) -> DataFrame {
        DataFrame::empty_with_schema(&RecordSchema::schema(flow))
    }

    /// Load the series definition table of a dimension.
    ///
    /// Rows with a missing commodity or dimension value are dropped.
    pub fn read_definitions(
        path: &Path,
        dimension: Dimension,
    ) -> Result<Vec<SeriesDefinition>, DataError> {
        let key = dimension.key_column();
        let df = read_text_csv(path)?;
        require_columns(path, &df, &[COMMODITY_CODE, key])?;

        let commodities = df.column(COMMODITY_CODE)?.str()?;
        let values = df.column(key)?.str()?;

        let mut defs = Vec::with_capacity(df.height());
        for (commodity, value) in commodities.into_iter().zip(values.into_iter()) {
            match (commodity, value) {
                (Some(c), Some(v)) if !c.is_empty() && !v.is_empty() => {
                    defs.push(SeriesDefinition::new(c, v))
                }
                _ => debug!(path = %path.display(), "definition row with empty key dropped"),
            }
        }

        info!(path = %path.display(), definitions = defs.len(), dimension = %dimension, "series definitions loaded");
        Ok(defs)
    }
}

fn read_text_csv(path: &Path) -> Result<DataFrame, DataError> {
    if !path.is_file() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }
    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn require_columns(path: &Path, df: &DataFrame, columns: &[&str]) -> Result<(), DataError> {
    let schema = df.schema();
    for column in columns {
        if !schema.contains(column) {
            return Err(DataError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("input table not found: {0}")]
    NotFound(PathBuf),

    #[error("Ingest failed for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("{path}: missing required column {column}")]
    MissingColumn { path: PathBuf, column: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl DataError {
    /// Missing inputs degrade to empty tables; everything else is a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }
}
