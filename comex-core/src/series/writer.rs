//! Per-series artifact writer.

use super::artifact::{write_frame, ArtifactError};
use super::extractor::SeriesAggregate;
use crate::data::schema::{ARTIFACT_CODE, ARTIFACT_DATE, DATE};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one `{commodity}_{EX|IM}_{value}_BR.ipv` file per aggregate.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Bracket the column names, attach the constant `<COD>` column and
    /// write the file, replacing any previous version.
    pub fn write(&self, aggregate: &SeriesAggregate) -> Result<PathBuf, ArtifactError> {
        let mut columns = vec![col(DATE).alias(ARTIFACT_DATE)];
        columns.extend(
            aggregate
                .code
                .flow
                .measures()
                .iter()
                .map(|m| col(m.record_column()).alias(m.artifact_column())),
        );
        columns.push(lit(aggregate.code.to_string()).alias(ARTIFACT_CODE));

        let mut out = aggregate.frame.clone().lazy().select(columns).collect()?;

        let path = self.output_dir.join(aggregate.code.file_name());
        write_frame(&path, &mut out)?;
        debug!(path = %path.display(), rows = out.height(), "series artifact written");
        Ok(path)
    }
}
