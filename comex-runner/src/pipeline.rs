//! Pipeline driver: extraction, consolidation, world rows and date repair
//! across the three dimensions.

use std::path::PathBuf;
use std::time::Instant;

use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::{info, warn};

use comex_core::data::{CanonicalizeError, CanonicalizeSummary};
use comex_core::series::WorldSummary;
use comex_core::{
    consolidate, synthesize_world, ArtifactError, ArtifactWriter, Bundles, DataError,
    DataIngestor, DateCanonicalizer, Dimension, FlowDirection, RunPeriod, SeriesDefinition,
    SeriesExtractor, TranslationError, TranslationTable,
};

use crate::config::PipelineConfig;
use crate::report::{BundleReport, DimensionReport, RunReport, WorldReport};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("hash bundle '{path}': {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("translation table: {0}")]
    Translation(#[from] TranslationError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("date repair: {0}")]
    Canonicalize(#[from] CanonicalizeError),
}

/// Processed record tables for both flows.
struct Records {
    exports: DataFrame,
    imports: DataFrame,
}

impl Records {
    fn get(&self, flow: FlowDirection) -> &DataFrame {
        match flow {
            FlowDirection::Export => &self.exports,
            FlowDirection::Import => &self.imports,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage once and report what was produced.
    ///
    /// Missing record or definition tables only warn; a missing or malformed
    /// translation table aborts before anything is written.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let period = self.config.period();
        info!(period = %period, output = %self.config.output_dir.display(), "pipeline started");

        self.ensure_directories()?;
        let translation = TranslationTable::load(&self.config.translation_path())?;
        let records = Records {
            exports: self.load_records(FlowDirection::Export)?,
            imports: self.load_records(FlowDirection::Import)?,
        };

        let mut report = RunReport::new(period);
        for dimension in Dimension::ALL {
            let defs = self.load_definitions(dimension)?;
            let extractor = SeriesExtractor::new(dimension, &translation);
            let writer = ArtifactWriter::new(self.config.dimension_dir(dimension));
            let exports = extractor.extract_and_write(
                records.get(FlowDirection::Export),
                &defs,
                FlowDirection::Export,
                &writer,
            )?;
            let imports = extractor.extract_and_write(
                records.get(FlowDirection::Import),
                &defs,
                FlowDirection::Import,
                &writer,
            )?;
            report.artifacts_written += exports.produced + imports.produced;
            report
                .dimensions
                .push(DimensionReport::new(dimension, exports, imports));
        }

        let mut consolidated = Vec::with_capacity(Dimension::ALL.len());
        for dimension in Dimension::ALL {
            consolidated.push((dimension, self.consolidate_dimension(dimension, period)?));
        }

        if let Some((_, bundles)) = consolidated
            .iter()
            .find(|(dimension, _)| *dimension == Dimension::Country)
        {
            report.world = self.synthesize_world(bundles)?;
        }

        report.dates = self.canonicalize_dates()?;

        for (dimension, bundles) in &consolidated {
            let Some(entry) = report.dimensions.iter_mut().find(|d| d.dimension == *dimension)
            else {
                continue;
            };
            entry.pruned = bundles.pruned;
            for flow in FlowDirection::ALL {
                let info = bundles.get(flow);
                let world = report
                    .world
                    .iter()
                    .find(|w| w.flow == flow && w.path == info.path)
                    .map(|w| &w.summary);
                let bundle = BundleReport::from_bundle(flow, info, world).map_err(|source| {
                    PipelineError::Hash {
                        path: info.path.clone(),
                        source,
                    }
                })?;
                entry.bundles.push(bundle);
            }
        }

        report.elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            artifacts = report.artifacts_written,
            skipped = report.skipped(),
            pruned = report.pruned(),
            elapsed_secs = report.elapsed_secs,
            "pipeline finished"
        );
        Ok(report)
    }

    /// Consolidate one dimension's per-series artifacts into its two bundles.
    pub fn consolidate_dimension(
        &self,
        dimension: Dimension,
        period: RunPeriod,
    ) -> Result<Bundles, PipelineError> {
        let dir = self.config.dimension_dir(dimension);
        create_dir(&dir)?;
        Ok(consolidate(&dir, dimension.label(), period)?)
    }

    /// Append world rows to both country bundles.
    pub fn synthesize_world(&self, bundles: &Bundles) -> Result<Vec<WorldReport>, PipelineError> {
        let mut world = Vec::with_capacity(FlowDirection::ALL.len());
        for flow in FlowDirection::ALL {
            let path = bundles.get(flow).path.clone();
            let summary: WorldSummary = synthesize_world(&path)?;
            world.push(WorldReport {
                flow,
                path,
                summary,
            });
        }
        Ok(world)
    }

    /// Zero-pad single-digit months in every artifact under the output root.
    pub fn canonicalize_dates(&self) -> Result<CanonicalizeSummary, PipelineError> {
        Ok(DateCanonicalizer::canonicalize_tree(&self.config.output_dir)?)
    }

    fn ensure_directories(&self) -> Result<(), PipelineError> {
        for dimension in Dimension::ALL {
            create_dir(&self.config.dimension_dir(dimension))?;
        }
        Ok(())
    }

    fn load_records(&self, flow: FlowDirection) -> Result<DataFrame, PipelineError> {
        let path = self.config.records_path(flow);
        match DataIngestor::read_records(&path, flow) {
            Ok(df) => Ok(df),
            Err(err) if err.is_not_found() => {
                warn!(path = %path.display(), flow = %flow, "processed table missing, using empty table");
                Ok(DataIngestor::empty_records(flow))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn load_definitions(&self, dimension: Dimension) -> Result<Vec<SeriesDefinition>, PipelineError> {
        let path = self.config.definitions_path(dimension);
        match DataIngestor::read_definitions(&path, dimension) {
            Ok(defs) => Ok(defs),
            Err(err) if err.is_not_found() => {
                warn!(path = %path.display(), dimension = %dimension, "series definitions missing, no series emitted");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn create_dir(path: &std::path::Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(path).map_err(|source| PipelineError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    info!(dir = %path.display(), "directory ensured");
    Ok(())
}
