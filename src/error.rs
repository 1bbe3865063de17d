// Domain errors for the recession analysis.
// Everything here is deterministic: a failed run fails the same way on a
// retry, so errors propagate straight to the caller and are never retried.

use crate::quarter::Quarter;
use crate::reconciliation::Cohort;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The GDP series is too short to compute a first difference.
    #[error("GDP series has {len} point(s); need at least 2 to difference")]
    InsufficientData { len: usize },

    /// No window satisfies the two-quarter decline / two-quarter recovery
    /// rule. Surfaced explicitly instead of falling back to the first
    /// quarter's label.
    #[error("no recession found: the series never shows two consecutive declines followed by two consecutive rises")]
    NoRecessionFound,

    /// The recession starts at the first quarter on record, so there is no
    /// preceding quarter to anchor the price ratio.
    #[error("recession starts at {start}, the first quarter on record; no prior quarter to compare against")]
    Boundary { start: Quarter },

    /// One side of the partition has no usable price ratios, leaving the
    /// two-sample test undefined.
    #[error("no {cohort} price ratios survived filtering; the t-test is undefined")]
    EmptySample { cohort: Cohort },

    /// Both cohorts are non-empty but the pooled t-test would have zero
    /// degrees of freedom.
    #[error("too few price ratios for a pooled t-test ({university} university-town, {other} non-university-town)")]
    TooFewSamples { university: usize, other: usize },
}
