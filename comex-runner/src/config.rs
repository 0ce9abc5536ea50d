//! Serializable pipeline configuration.

use std::path::{Path, PathBuf};

use comex_core::{Dimension, FlowDirection, RunPeriod};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the pipeline reads its inputs and writes the artifact library.
///
/// Every field has a default, so an empty TOML document is a valid config:
///
/// ```toml
/// auxiliary_dir = "data/auxiliar"
/// processed_dir = "data/processed"
/// output_dir = "data/ipvs"
/// run_period = "2024_05"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Series definitions and the code translation table.
    pub auxiliary_dir: PathBuf,
    /// Processed record tables.
    pub processed_dir: PathBuf,
    /// Root of the artifact library, one sub-directory per dimension.
    pub output_dir: PathBuf,
    pub exports_file: String,
    pub imports_file: String,
    pub translation_file: String,
    /// Bundle period; the local clock is used when absent.
    pub run_period: Option<RunPeriod>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_data_root(Path::new("data"))
    }
}

impl PipelineConfig {
    /// Default layout rooted at `root` (`auxiliar/`, `processed/`, `ipvs/`).
    pub fn with_data_root(root: &Path) -> Self {
        Self {
            auxiliary_dir: root.join("auxiliar"),
            processed_dir: root.join("processed"),
            output_dir: root.join("ipvs"),
            exports_file: "EXP_final_processed.csv".to_string(),
            imports_file: "IMP_final_processed.csv".to_string(),
            translation_file: "country_conversion.csv".to_string(),
            run_period: None,
        }
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Rebase the three directories onto `root`, keeping file names and period.
    pub fn rebase(mut self, root: &Path) -> Self {
        let layout = Self::with_data_root(root);
        self.auxiliary_dir = layout.auxiliary_dir;
        self.processed_dir = layout.processed_dir;
        self.output_dir = layout.output_dir;
        self
    }

    pub fn records_path(&self, flow: FlowDirection) -> PathBuf {
        let name = match flow {
            FlowDirection::Export => &self.exports_file,
            FlowDirection::Import => &self.imports_file,
        };
        self.processed_dir.join(name)
    }

    pub fn definitions_path(&self, dimension: Dimension) -> PathBuf {
        self.auxiliary_dir.join(dimension.definitions_file())
    }

    pub fn translation_path(&self) -> PathBuf {
        self.auxiliary_dir.join(&self.translation_file)
    }

    pub fn dimension_dir(&self, dimension: Dimension) -> PathBuf {
        self.output_dir.join(dimension.label())
    }

    /// Configured run period, or the current local month.
    pub fn period(&self) -> RunPeriod {
        self.run_period.unwrap_or_else(RunPeriod::current)
    }
}
