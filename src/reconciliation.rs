// ⚖️ Region Reconciliation
// Splits the housing table's region keys into university towns and
// everything else. The two sources are normalized upstream (state names
// stripped of `[...]` footnotes, region names stripped of `(...)`
// annotations), so membership is an exact string match on
// (state name, region name), never fuzzy.

use crate::loaders::HousingTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// (full state name, region name), both post-normalization.
pub type RegionKey = (String, String);

/// Which side of the partition a region landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    UniversityTown,
    NonUniversityTown,
}

impl Cohort {
    pub fn name(&self) -> &'static str {
        match self {
            Cohort::UniversityTown => "university town",
            Cohort::NonUniversityTown => "non-university town",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Disjoint, exhaustive split of the housing table's keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub university: BTreeSet<RegionKey>,
    pub other: BTreeSet<RegionKey>,
}

impl Partition {
    pub fn cohort_of(&self, key: &RegionKey) -> Cohort {
        if self.university.contains(key) {
            Cohort::UniversityTown
        } else {
            Cohort::NonUniversityTown
        }
    }

    pub fn len(&self) -> usize {
        self.university.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.university.is_empty() && self.other.is_empty()
    }
}

/// Partition housing keys by exact intersection with the university-town
/// listing. University towns without a housing record simply do not appear;
/// empty inputs yield a degenerate partition, not an error; the analyzer
/// rejects empty samples later.
pub fn partition(university_towns: &BTreeSet<RegionKey>, housing: &HousingTable) -> Partition {
    let mut result = Partition::default();
    for key in housing.keys() {
        if university_towns.contains(key) {
            result.university.insert(key.clone());
        } else {
            result.other.insert(key.clone());
        }
    }
    result
}

// ============================================================================
// TESTS
// ============================================================================
