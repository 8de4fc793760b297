//! Source dialects
//!
//! A dialect names one family of source extracts with its own table layout and
//! column naming.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MIMIC-III critical care database (uppercase table and column names)
    Mimic,
    /// Synthea synthetic patient generator CSV export
    Synthea,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Mimic, Dialect::Synthea];

    /// Short lowercase name used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mimic => "mimic",
            Dialect::Synthea => "synthea",
        }
    }

    /// Value written to the `source` field of every document
    pub fn source_label(&self) -> &'static str {
        match self {
            Dialect::Mimic => "MIMIC-III",
            Dialect::Synthea => "Synthea",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mimic" | "mimic-iii" | "mimic3" => Ok(Dialect::Mimic),
            "synthea" => Ok(Dialect::Synthea),
            other => Err(format!(
                "Unknown dialect '{other}'. Must be one of: mimic, synthea"
            )),
        }
    }
}
