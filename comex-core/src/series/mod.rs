//! Series generation and consolidation engine.

pub mod artifact;
pub mod consolidate;
pub mod extractor;
pub mod world;
pub mod writer;

pub use artifact::{read_artifact, read_artifact_as, ArtifactError, ArtifactTable};
pub use consolidate::{bundle_file_name, consolidate, series_file_pattern, BundleInfo, Bundles};
pub use extractor::{Extraction, ExtractionCounts, SeriesAggregate, SeriesExtractor};
pub use world::{synthesize_world, WorldSummary};
pub use writer::ArtifactWriter;
