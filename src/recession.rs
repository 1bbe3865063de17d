// 📉 Recession Window Detector
// Scans the quarterly GDP series for the recession window:
//   start  = two quarters before the LAST run of two consecutive declines
//   end    = first quarter completing two consecutive rises at/after start
//   bottom = earliest minimum GDP inside [start, end]
//
// The start scan keeps overwriting its candidate while the end scan stops
// on the first hit. The asymmetry is deliberate and part of the contract,
// so both scans are kept exactly as observed.

use crate::error::AnalysisError;
use crate::quarter::Quarter;
use serde::{Deserialize, Serialize};

/// One row of the GDP table: a quarter label and GDP in chained dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GdpPoint {
    pub quarter: Quarter,
    pub gdp: f64,
}

/// Chronologically ordered GDP series.
///
/// Invariant (loader-guaranteed, not re-checked here): quarters are strictly
/// increasing with no gaps and no repeats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdpSeries {
    points: Vec<GdpPoint>,
}

impl GdpSeries {
    pub fn from_points(points: Vec<GdpPoint>) -> Self {
        GdpSeries { points }
    }

    pub fn points(&self) -> &[GdpPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of a quarter in the series, if present.
    pub fn position(&self, quarter: Quarter) -> Option<usize> {
        self.points.iter().position(|p| p.quarter == quarter)
    }

    pub fn first_quarter(&self) -> Option<Quarter> {
        self.points.first().map(|p| p.quarter)
    }

    pub fn last_quarter(&self) -> Option<Quarter> {
        self.points.last().map(|p| p.quarter)
    }
}

/// The detected recession: start ≤ bottom ≤ end by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecessionWindow {
    pub start: Quarter,
    pub end: Quarter,
    pub bottom: Quarter,
}

/// Detect the recession window in a quarterly GDP series.
///
/// Fails with `InsufficientData` when the series cannot be differenced and
/// with `NoRecessionFound` when either run condition never triggers,
/// rather than silently falling back to the first quarter's label.
pub fn detect(series: &GdpSeries) -> Result<RecessionWindow, AnalysisError> {
    let points = series.points();
    if points.len() < 2 {
        return Err(AnalysisError::InsufficientData { len: points.len() });
    }

    // Start scan over the whole series. Each time a run of consecutive
    // declines reaches exactly two, the candidate moves to two quarters
    // before the run's end, so the last qualifying run wins.
    let mut decline_run = 0usize;
    let mut start_index: Option<usize> = None;
    for i in 1..points.len() {
        if points[i].gdp - points[i - 1].gdp < 0.0 {
            decline_run += 1;
        } else {
            decline_run = 0;
        }
        if decline_run == 2 {
            start_index = Some(i - 2);
        }
    }
    let start_index = start_index.ok_or(AnalysisError::NoRecessionFound)?;
    log::debug!(
        "recession start candidate: {} (index {})",
        points[start_index].quarter,
        start_index
    );

    // End scan from the start forward: first run of two consecutive rises
    // wins. Diffs only exist from index 1 on.
    let mut growth_run = 0usize;
    let mut end_index: Option<usize> = None;
    for i in start_index.max(1)..points.len() {
        if points[i].gdp - points[i - 1].gdp > 0.0 {
            growth_run += 1;
        } else {
            growth_run = 0;
        }
        if growth_run == 2 {
            end_index = Some(i);
            break;
        }
    }
    let end_index = end_index.ok_or(AnalysisError::NoRecessionFound)?;

    // Trough: earliest minimum inside the closed window.
    let mut bottom_index = start_index;
    for i in start_index..=end_index {
        if points[i].gdp < points[bottom_index].gdp {
            bottom_index = i;
        }
    }

    Ok(RecessionWindow {
        start: points[start_index].quarter,
        end: points[end_index].quarter,
        bottom: points[bottom_index].quarter,
    })
}

// ============================================================================
// TESTS
// ============================================================================
