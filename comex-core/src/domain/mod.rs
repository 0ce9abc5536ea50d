//! Domain types shared by every pipeline stage.

pub mod dimension;
pub mod flow;
pub mod period;
pub mod series_code;

pub use dimension::{Dimension, UnknownDimension};
pub use flow::{FlowDirection, Measure, UnknownFlow};
pub use period::{PeriodError, RunPeriod};
pub use series_code::{SeriesCode, SeriesCodeError, ARTIFACT_EXTENSION, WORLD_TOKEN};
