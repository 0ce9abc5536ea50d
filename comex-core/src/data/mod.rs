//! Input tables and file-level normalization

pub mod canonicalize;
pub mod ingest;
pub mod schema;
pub mod translation;

pub use canonicalize::{canonicalize_date, canonicalize_line, CanonicalizeError, CanonicalizeSummary, DateCanonicalizer};
pub use ingest::{DataError, DataIngestor, SeriesDefinition};
pub use schema::{ArtifactLayout, RecordSchema, SchemaError};
pub use translation::{TranslationError, TranslationTable, UNKNOWN_CODE};
