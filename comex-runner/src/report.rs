//! Run report: what one pipeline run produced, skipped and pruned.

use std::path::{Path, PathBuf};

use comex_core::data::CanonicalizeSummary;
use comex_core::series::{BundleInfo, ExtractionCounts, WorldSummary};
use comex_core::{Dimension, FlowDirection, RunPeriod};
use serde::Serialize;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub period: RunPeriod,
    /// Per-series artifacts written across all dimensions and flows.
    pub artifacts_written: usize,
    pub dimensions: Vec<DimensionReport>,
    pub world: Vec<WorldReport>,
    pub dates: CanonicalizeSummary,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn new(period: RunPeriod) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            period,
            artifacts_written: 0,
            dimensions: Vec::new(),
            world: Vec::new(),
            dates: CanonicalizeSummary::default(),
            elapsed_secs: 0.0,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionReport> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }

    pub fn skipped(&self) -> usize {
        self.dimensions
            .iter()
            .map(|d| d.exports.skipped + d.imports.skipped)
            .sum()
    }

    pub fn pruned(&self) -> usize {
        self.dimensions.iter().map(|d| d.pruned).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub exports: ExtractionCounts,
    pub imports: ExtractionCounts,
    pub pruned: usize,
    pub bundles: Vec<BundleReport>,
}

impl DimensionReport {
    pub fn new(dimension: Dimension, exports: ExtractionCounts, imports: ExtractionCounts) -> Self {
        Self {
            dimension,
            exports,
            imports,
            pruned: 0,
            bundles: Vec::new(),
        }
    }

    pub fn bundle(&self, flow: FlowDirection) -> Option<&BundleReport> {
        self.bundles.iter().find(|b| b.flow == flow)
    }
}

/// A final bundle as it sits on disk after the run.
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub flow: FlowDirection,
    pub path: PathBuf,
    pub rows: usize,
    pub sources: usize,
    /// BLAKE3 of the file content, hex encoded.
    pub blake3: String,
}

impl BundleReport {
    /// Describe `info` after world synthesis (if any) has touched the file.
    pub fn from_bundle(
        flow: FlowDirection,
        info: &BundleInfo,
        world: Option<&WorldSummary>,
    ) -> std::io::Result<Self> {
        let rows = match world {
            Some(summary) => summary.country_rows + summary.world_rows,
            None => info.rows,
        };
        Ok(Self {
            flow,
            path: info.path.clone(),
            rows,
            sources: info.sources,
            blake3: hash_file(&info.path)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldReport {
    pub flow: FlowDirection,
    pub path: PathBuf,
    #[serde(flatten)]
    pub summary: WorldSummary,
}

/// BLAKE3 content hash of a file.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
