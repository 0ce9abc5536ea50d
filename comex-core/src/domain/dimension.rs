//! Series-defining dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Axis along which series are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Partner country.
    Country,
    /// Port of entry/exit.
    Harbor,
    /// Sub-national origin (state).
    State,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Country, Dimension::Harbor, Dimension::State];

    /// Output sub-directory name and bundle prefix.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Country => "country_series",
            Dimension::Harbor => "harbor_series",
            Dimension::State => "state_series",
        }
    }

    /// Column in the processed record table that holds this dimension's value.
    pub fn key_column(self) -> &'static str {
        match self {
            Dimension::Country => "PARTNER_COUNTRY_ISO",
            Dimension::Harbor => "PORT_CODE",
            Dimension::State => "SUBNATIONAL_CODE",
        }
    }

    /// Default file name of the series definition table.
    pub fn definitions_file(self) -> &'static str {
        match self {
            Dimension::Country => "country_series.csv",
            Dimension::Harbor => "harbor_series.csv",
            Dimension::State => "state_series.csv",
        }
    }

    /// Only partner-country values go through the code translation table.
    pub fn uses_translation(self) -> bool {
        matches!(self, Dimension::Country)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dimension '{0}' (expected country, harbor or state)")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "country" | "country_series" => Ok(Dimension::Country),
            "harbor" | "harbor_series" => Ok(Dimension::Harbor),
            "state" | "state_series" => Ok(Dimension::State),
            _ => Err(UnknownDimension(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_label_forms() {
        assert_eq!("country".parse::<Dimension>().unwrap(), Dimension::Country);
        assert_eq!("harbor_series".parse::<Dimension>().unwrap(), Dimension::Harbor);
        assert_eq!("STATE".parse::<Dimension>().unwrap(), Dimension::State);
        assert!("province".parse::<Dimension>().is_err());
    }

    #[test]
    fn only_country_translates() {
        assert!(Dimension::Country.uses_translation());
        assert!(!Dimension::Harbor.uses_translation());
        assert!(!Dimension::State.uses_translation());
    }
}
