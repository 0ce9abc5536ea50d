//! Flow direction and the measure set each direction carries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A numeric measure column of a trade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    /// Net weight in kilograms.
    Weight,
    /// Free-on-board value.
    Fob,
    /// Freight value (imports only).
    Freight,
    /// Insurance value (imports only).
    Insurance,
}

impl Measure {
    /// Column name in the processed record table.
    pub fn record_column(self) -> &'static str {
        match self {
            Measure::Weight => "WEIGHT_KG",
            Measure::Fob => "FOB_VALUE",
            Measure::Freight => "FREIGHT_VALUE",
            Measure::Insurance => "INSURANCE_VALUE",
        }
    }

    /// Bracketed column name in artifact files.
    pub fn artifact_column(self) -> &'static str {
        match self {
            Measure::Weight => "<KGL>",
            Measure::Fob => "<FOB>",
            Measure::Freight => "<VLF>",
            Measure::Insurance => "<VLS>",
        }
    }
}

const EXPORT_MEASURES: [Measure; 2] = [Measure::Weight, Measure::Fob];
const IMPORT_MEASURES: [Measure; 4] = [
    Measure::Weight,
    Measure::Fob,
    Measure::Freight,
    Measure::Insurance,
];

/// Direction of a trade flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Export,
    Import,
}

impl FlowDirection {
    pub const ALL: [FlowDirection; 2] = [FlowDirection::Export, FlowDirection::Import];

    /// Two-letter token used in series codes and file names (`EX` / `IM`).
    pub fn short_code(self) -> &'static str {
        match self {
            FlowDirection::Export => "EX",
            FlowDirection::Import => "IM",
        }
    }

    /// Word used in bundle file names (`exports` / `imports`).
    pub fn bundle_word(self) -> &'static str {
        match self {
            FlowDirection::Export => "exports",
            FlowDirection::Import => "imports",
        }
    }

    /// Measures carried by this direction, in canonical column order.
    pub fn measures(self) -> &'static [Measure] {
        match self {
            FlowDirection::Export => &EXPORT_MEASURES,
            FlowDirection::Import => &IMPORT_MEASURES,
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flow direction code '{0}' (expected EX or IM)")]
pub struct UnknownFlow(pub String);

impl FromStr for FlowDirection {
    type Err = UnknownFlow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EX" => Ok(FlowDirection::Export),
            "IM" => Ok(FlowDirection::Import),
            other => Err(UnknownFlow(other.to_string())),
        }
    }
}
