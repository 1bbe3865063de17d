// ⏰ Quarter Labels
// The `<year>q<1-4>` tokens that key every time series in the system
// (e.g. "2008q3"). Ordering is chronological, so label comparisons and
// BTreeMap iteration both walk forward in time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A calendar quarter, totally ordered by (year, quarter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u8, // 1..=4
}

/// Raised when a token does not match `<year>q<1-4>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quarter label {0:?} (expected e.g. \"2008q3\")")]
pub struct ParseQuarterError(pub String);

impl Quarter {
    /// First quarter the analysis looks at. Everything earlier is dropped
    /// during ingestion.
    pub const EPOCH: Quarter = Quarter {
        year: 2000,
        quarter: 1,
    };

    pub fn new(year: i32, quarter: u8) -> Self {
        debug_assert!((1..=4).contains(&quarter));
        Quarter { year, quarter }
    }

    /// The quarter a calendar month falls in (1..=12 → q1..q4).
    pub fn from_month(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Quarter {
            year,
            quarter: ((month - 1) / 3 + 1) as u8,
        }
    }

    /// The quarter immediately before this one, crossing year boundaries.
    pub fn pred(self) -> Self {
        if self.quarter == 1 {
            Quarter {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Quarter {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }

    /// The quarter immediately after this one.
    pub fn succ(self) -> Self {
        if self.quarter == 4 {
            Quarter {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Quarter {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = ParseQuarterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseQuarterError(s.to_string());
        let (year, quarter) = s.split_once('q').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let quarter: u8 = quarter.parse().map_err(|_| err())?;
        if !(1..=4).contains(&quarter) {
            return Err(err());
        }
        Ok(Quarter { year, quarter })
    }
}

// Serialized as the string token so reports read like the source data.
impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quarter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
