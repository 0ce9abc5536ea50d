//! COMEX Runner — configuration and orchestration of the series pipeline.
//!
//! This crate builds on `comex-core` to provide:
//! - TOML pipeline configuration with the default data layout
//! - The pipeline driver sequencing extraction, consolidation, world rows
//!   and date repair
//! - A serializable run report with per-bundle content hashes

pub mod config;
pub mod pipeline;
pub mod report;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{Pipeline, PipelineError};
pub use report::{hash_file, BundleReport, DimensionReport, RunReport, WorldReport};
