//! Series identity (`<COD>` column).
//!
//! Commodity, flow and dimension value travel through the pipeline as
//! separate fields. The `COMEX:{commodity}_{EX|IM}_{value}_BR` string is only
//! produced when an artifact is written, and parsed structurally when a bundle
//! is read back.

use super::flow::{FlowDirection, UnknownFlow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PREFIX: &str = "COMEX:";
const SUFFIX: &str = "_BR";

/// Dimension token of the synthesized world series.
pub const WORLD_TOKEN: &str = "WO";

/// Artifact file extension.
pub const ARTIFACT_EXTENSION: &str = "ipv";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesCode {
    pub commodity: String,
    pub flow: FlowDirection,
    /// Resolved dimension value (canonical country code, port code, state).
    pub value: String,
}

impl SeriesCode {
    pub fn new(commodity: impl Into<String>, flow: FlowDirection, value: impl Into<String>) -> Self {
        Self {
            commodity: commodity.into(),
            flow,
            value: value.into(),
        }
    }

    /// World aggregate series for a commodity and flow.
    pub fn world(commodity: impl Into<String>, flow: FlowDirection) -> Self {
        Self::new(commodity, flow, WORLD_TOKEN)
    }

    pub fn is_world(&self) -> bool {
        self.value == WORLD_TOKEN
    }

    /// `{commodity}_{EX|IM}_{value}_BR`
    pub fn stem(&self) -> String {
        format!("{}_{}_{}{SUFFIX}", self.commodity, self.flow.short_code(), self.value)
    }

    /// Per-series artifact file name.
    pub fn file_name(&self) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", self.stem())
    }
}

impl fmt::Display for SeriesCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.stem())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesCodeError {
    #[error("series code '{0}' does not match COMEX:<commodity>_<EX|IM>_<value>_BR")]
    Malformed(String),

    #[error("series code '{code}': {source}")]
    Flow {
        code: String,
        #[source]
        source: UnknownFlow,
    },
}

impl FromStr for SeriesCode {
    type Err = SeriesCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SeriesCodeError::Malformed(s.to_string());

        let body = s
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(SUFFIX))
            .ok_or_else(malformed)?;

        let mut parts = body.splitn(3, '_');
        let commodity = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;
        let flow = parts.next().ok_or_else(malformed)?;
        let value = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;

        let flow = flow.parse::<FlowDirection>().map_err(|source| SeriesCodeError::Flow {
            code: s.to_string(),
            source,
        })?;

        Ok(Self::new(commodity, flow, value))
    }
}
