//! COMEX Core — series generation and consolidation engine.
//!
//! This crate turns processed trade record tables into the `.ipv` artifact
//! library:
//! - Domain types (flow direction, dimension, series code, run period)
//! - Input tables (processed records, series definitions, code translation)
//! - Series extraction and per-series artifact writing
//! - Dimension consolidation into monthly bundles
//! - World aggregate synthesis for country bundles
//! - Textual date canonicalization of the artifact tree

pub mod data;
pub mod domain;
pub mod series;

pub use data::{
    DataError, DataIngestor, DateCanonicalizer, SeriesDefinition, TranslationError,
    TranslationTable,
};
pub use domain::{Dimension, FlowDirection, RunPeriod, SeriesCode};
pub use series::{
    consolidate, synthesize_world, ArtifactError, ArtifactWriter, Bundles, SeriesExtractor,
};
