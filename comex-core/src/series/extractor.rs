//! Series extraction: one aggregate per (definition, flow).

use super::artifact::ArtifactError;
use super::writer::ArtifactWriter;
use crate::data::ingest::SeriesDefinition;
use crate::data::schema::{COMMODITY_CODE, DATE};
use crate::data::translation::{TranslationTable, UNKNOWN_CODE};
use crate::domain::{Dimension, FlowDirection, SeriesCode};
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

/// Measures of one series summed per date, ascending by date.
///
/// `frame` holds `DATE` followed by the record-table measure columns of
/// `code.flow`.
#[derive(Debug, Clone)]
pub struct SeriesAggregate {
    pub code: SeriesCode,
    pub frame: DataFrame,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub aggregates: Vec<SeriesAggregate>,
    /// Definitions with no matching records.
    pub skipped: usize,
}

impl Extraction {
    pub fn produced(&self) -> usize {
        self.aggregates.len()
    }
}

/// Counts from an extract-and-write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionCounts {
    pub produced: usize,
    pub skipped: usize,
}

pub struct SeriesExtractor<'a> {
    dimension: Dimension,
    translation: &'a TranslationTable,
}

impl<'a> SeriesExtractor<'a> {
    pub fn new(dimension: Dimension, translation: &'a TranslationTable) -> Self {
        Self {
            dimension,
            translation,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Dimension value as it appears in the series code.
    pub fn resolve(&self, value: &str) -> String {
        if self.dimension.uses_translation() {
            let code = self.translation.lookup(value);
            if code == UNKNOWN_CODE {
                warn!(
                    legacy = %value,
                    "code missing from translation table, series named {}",
                    UNKNOWN_CODE
                );
            }
            code.to_string()
        } else {
            value.to_string()
        }
    }

    /// Aggregate the records matching one definition. `None` when nothing matches.
    pub fn aggregate(
        &self,
        records: &DataFrame,
        def: &SeriesDefinition,
        flow: FlowDirection,
    ) -> Result<Option<SeriesAggregate>, ArtifactError> {
        let key = self.dimension.key_column();
        let sums: Vec<Expr> = flow
            .measures()
            .iter()
            .map(|m| col(m.record_column()).sum())
            .collect();

        let frame = records
            .clone()
            .lazy()
            .filter(
                col(COMMODITY_CODE)
                    .eq(lit(def.commodity.as_str()))
                    .and(col(key).eq(lit(def.value.as_str()))),
            )
            .group_by_stable([col(DATE)])
            .agg(sums)
            .sort([DATE], SortMultipleOptions::default())
            .collect()?;

        if frame.height() == 0 {
            return Ok(None);
        }

        let code = SeriesCode::new(def.commodity.clone(), flow, self.resolve(&def.value));
        Ok(Some(SeriesAggregate { code, frame }))
    }

    /// Aggregate every definition. Empty slices are skipped with a warning.
    pub fn extract(
        &self,
        records: &DataFrame,
        defs: &[SeriesDefinition],
        flow: FlowDirection,
    ) -> Result<Extraction, ArtifactError> {
        self.check_columns(records)?;
        let mut extraction = Extraction::default();
        for def in defs {
            match self.aggregate(records, def, flow)? {
                Some(aggregate) => extraction.aggregates.push(aggregate),
                None => {
                    self.warn_empty(def, flow);
                    extraction.skipped += 1;
                }
            }
        }
        Ok(extraction)
    }

    /// Aggregate and write each series as soon as it is computed.
    pub fn extract_and_write(
        &self,
        records: &DataFrame,
        defs: &[SeriesDefinition],
        flow: FlowDirection,
        writer: &ArtifactWriter,
    ) -> Result<ExtractionCounts, ArtifactError> {
        self.check_columns(records)?;
        let mut counts = ExtractionCounts::default();
        for def in defs {
            match self.aggregate(records, def, flow)? {
                Some(aggregate) => {
                    writer.write(&aggregate)?;
                    counts.produced += 1;
                }
                None => {
                    self.warn_empty(def, flow);
                    counts.skipped += 1;
                }
            }
        }
        info!(
            dimension = %self.dimension,
            flow = %flow,
            produced = counts.produced,
            skipped = counts.skipped,
            "series extracted"
        );
        Ok(counts)
    }

    fn check_columns(&self, records: &DataFrame) -> Result<(), ArtifactError> {
        let schema = records.schema();
        for column in [DATE, COMMODITY_CODE, self.dimension.key_column()] {
            if !schema.contains(column) {
                return Err(ArtifactError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }

    fn warn_empty(&self, def: &SeriesDefinition, flow: FlowDirection) {
        warn!(
            commodity = %def.commodity,
            value = %def.value,
            dimension = %self.dimension,
            flow = %flow,
            "no data found, skipping series"
        );
    }
}
