// 📊 Price-Ratio Analysis
// For every housing region, compares the price in the quarter just before
// the recession start against the price at the recession bottom
// (ratio = before / bottom; lower means the region held its value better),
// then runs an equal-variance two-sample t-test across the university /
// non-university partition.

use crate::error::AnalysisError;
use crate::loaders::HousingTable;
use crate::quarter::Quarter;
use crate::recession::{self, GdpSeries, RecessionWindow};
use crate::reconciliation::{self, Cohort, Partition, RegionKey};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::BTreeSet;

/// Two-sided significance threshold for "the groups differ".
pub const SIGNIFICANCE: f64 = 0.01;

/// Outcome of the two-sample comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// True when the null hypothesis is rejected at the 1% level.
    pub different: bool,
    /// Two-sided p-value from the pooled t-test.
    pub p_value: f64,
    /// The cohort with the lower mean ratio (smaller price loss).
    pub better: Cohort,
    /// Ratios that survived filtering, per cohort.
    pub university_count: usize,
    pub non_university_count: usize,
}

/// Full report produced by [`run_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub window: RecessionWindow,
    #[serde(flatten)]
    pub comparison: Comparison,
}

/// Compare housing-price resilience across the partition.
///
/// The anchor quarter is the one immediately before `window.start` in the
/// GDP series; a start on the series' first quarter has no anchor and fails
/// with `Boundary`. Regions missing either price, or whose ratio is not
/// finite, are dropped before the test.
pub fn analyze(
    series: &GdpSeries,
    window: &RecessionWindow,
    housing: &HousingTable,
    partition: &Partition,
) -> Result<Comparison, AnalysisError> {
    let start_pos = series.position(window.start);
    let before = match start_pos {
        Some(pos) if pos > 0 => series.points()[pos - 1].quarter,
        _ => return Err(AnalysisError::Boundary { start: window.start }),
    };
    log::debug!("ratio quarters: {} (before start) / {} (bottom)", before, window.bottom);

    let (university, other) = collect_ratios(housing, partition, before, window.bottom);
    if university.is_empty() {
        return Err(AnalysisError::EmptySample {
            cohort: Cohort::UniversityTown,
        });
    }
    if other.is_empty() {
        return Err(AnalysisError::EmptySample {
            cohort: Cohort::NonUniversityTown,
        });
    }

    let p_value = students_t_test(&university, &other)?;
    let better = if mean(&other) < mean(&university) {
        Cohort::NonUniversityTown
    } else {
        Cohort::UniversityTown
    };

    Ok(Comparison {
        different: p_value < SIGNIFICANCE,
        p_value,
        better,
        university_count: university.len(),
        non_university_count: other.len(),
    })
}

/// Compose detector, reconciler, and analyzer over already-loaded datasets.
pub fn run_analysis(
    university_towns: &BTreeSet<RegionKey>,
    series: &GdpSeries,
    housing: &HousingTable,
) -> Result<AnalysisReport, AnalysisError> {
    let window = recession::detect(series)?;
    let partition = reconciliation::partition(university_towns, housing);
    log::info!(
        "recession {} → {} (bottom {}); {} university-town regions, {} others",
        window.start,
        window.end,
        window.bottom,
        partition.university.len(),
        partition.other.len()
    );
    let comparison = analyze(series, &window, housing, &partition)?;
    Ok(AnalysisReport { window, comparison })
}

/// Price ratios per cohort, dropping regions without both quarters on file.
fn collect_ratios(
    housing: &HousingTable,
    partition: &Partition,
    before: Quarter,
    bottom: Quarter,
) -> (Vec<f64>, Vec<f64>) {
    let mut university = Vec::new();
    let mut other = Vec::new();
    for (key, prices) in housing {
        let (Some(&numerator), Some(&denominator)) = (prices.get(&before), prices.get(&bottom))
        else {
            continue;
        };
        let ratio = numerator / denominator;
        if !ratio.is_finite() {
            continue;
        }
        match partition.cohort_of(key) {
            Cohort::UniversityTown => university.push(ratio),
            Cohort::NonUniversityTown => other.push(ratio),
        }
    }
    (university, other)
}

fn mean(sample: &[f64]) -> f64 {
    sample.iter().sum::<f64>() / sample.len() as f64
}

fn sum_of_squared_deviations(sample: &[f64], mean: f64) -> f64 {
    sample.iter().map(|x| (x - mean).powi(2)).sum()
}

/// Two-sided p-value of the equal-variance two-sample t-test.
///
/// Pooled variance over n1 + n2 - 2 degrees of freedom; callers guarantee
/// both samples are non-empty. With zero pooled variance the statistic is
/// degenerate: equal means are indistinguishable (p = 1), unequal means are
/// trivially distinct (p = 0).
pub fn students_t_test(a: &[f64], b: &[f64]) -> Result<f64, AnalysisError> {
    let (n1, n2) = (a.len(), b.len());
    if n1 + n2 < 3 {
        return Err(AnalysisError::TooFewSamples {
            university: n1,
            other: n2,
        });
    }

    let (m1, m2) = (mean(a), mean(b));
    let df = (n1 + n2 - 2) as f64;
    let pooled_variance =
        (sum_of_squared_deviations(a, m1) + sum_of_squared_deviations(b, m2)) / df;
    if pooled_variance == 0.0 {
        return Ok(if m1 == m2 { 1.0 } else { 0.0 });
    }

    let standard_error = (pooled_variance * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    let t = (m1 - m2) / standard_error;

    // df >= 1 here, so the distribution is always constructible.
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|_| AnalysisError::TooFewSamples {
        university: n1,
        other: n2,
    })?;
    Ok(2.0 * dist.cdf(-t.abs()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recession::GdpPoint;
    use std::collections::BTreeMap;

    fn q(s: &str) -> Quarter {
        s.parse().unwrap()
    }

    fn series(values: &[f64]) -> GdpSeries {
        let mut quarter = Quarter::EPOCH;
        let points = values
            .iter()
            .map(|&gdp| {
                let p = GdpPoint { quarter, gdp };
                quarter = quarter.succ();
                p
            })
            .collect();
        GdpSeries::from_points(points)
    }

    fn key(state: &str, region: &str) -> RegionKey {
        (state.to_string(), region.to_string())
    }

    /// Housing table where every region has a price for 2000q2 (the quarter
    /// before the fixture's recession start) and 2001q1 (its bottom), chosen
    /// to give the region the requested ratio.
    fn housing_with_ratios(regions: &[(RegionKey, f64)]) -> HousingTable {
        regions
            .iter()
            .map(|(k, ratio)| {
                let mut prices = BTreeMap::new();
                prices.insert(q("2000q2"), 100.0 * ratio);
                prices.insert(q("2001q1"), 100.0);
                (k.clone(), prices)
            })
            .collect()
    }

    fn partition_of(housing: &HousingTable, towns: &[RegionKey]) -> Partition {
        let set: BTreeSet<_> = towns.iter().cloned().collect();
        reconciliation::partition(&set, housing)
    }

    /// GDP peaking at 2000q3, declining into 2001q1, recovering after:
    /// start 2000q3 (anchor 2000q2), bottom 2001q1, end 2001q3.
    fn recession_series() -> GdpSeries {
        series(&[100.0, 101.0, 102.0, 101.0, 100.0, 101.0, 102.0])
    }

    #[test]
    fn test_window_of_fixture_series() {
        let w = recession::detect(&recession_series()).unwrap();
        assert_eq!(w.start, q("2000q3"));
        assert_eq!(w.bottom, q("2001q1"));
        assert_eq!(w.end, q("2001q3"));
    }

    #[test]
    fn test_t_test_matches_reference_value() {
        // scipy.stats.ttest_ind([1,2,3,4], [2,3,4,5]) → p ≈ 0.31526
        let p = students_t_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((p - 0.31526).abs() < 1e-3, "p = {}", p);
    }

    #[test]
    fn test_t_test_identical_samples() {
        let sample = [1.0, 1.1, 0.9, 1.05];
        let p = students_t_test(&sample, &sample).unwrap();
        assert!((p - 1.0).abs() < 1e-12, "p = {}", p);
    }

    #[test]
    fn test_t_test_zero_variance_guard() {
        assert_eq!(students_t_test(&[1.0, 1.0], &[1.0, 1.0]).unwrap(), 1.0);
        assert_eq!(students_t_test(&[1.0, 1.0], &[2.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_t_test_too_few_samples() {
        assert_eq!(
            students_t_test(&[1.0], &[2.0]),
            Err(AnalysisError::TooFewSamples {
                university: 1,
                other: 1
            })
        );
    }

    #[test]
    fn test_identical_cohorts_are_not_different() {
        let housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.00),
            (key("Ohio", "Oxford"), 1.10),
            (key("Michigan", "Detroit"), 1.00),
            (key("Texas", "Houston"), 1.10),
        ]);
        let partition = partition_of(
            &housing,
            &[key("Michigan", "Ann Arbor"), key("Ohio", "Oxford")],
        );
        let w = recession::detect(&recession_series()).unwrap();

        let c = analyze(&recession_series(), &w, &housing, &partition).unwrap();
        assert!(!c.different);
        assert!((c.p_value - 1.0).abs() < 1e-12);
        assert_eq!(c.university_count, 2);
        assert_eq!(c.non_university_count, 2);
        // Tied means resolve to university towns.
        assert_eq!(c.better, Cohort::UniversityTown);
    }

    #[test]
    fn test_better_is_the_cohort_with_the_lower_mean_ratio() {
        // University towns lose less value (ratios near 1), others lose more.
        let housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.02),
            (key("Ohio", "Oxford"), 1.05),
            (key("Michigan", "Detroit"), 1.40),
            (key("Texas", "Houston"), 1.35),
        ]);
        let partition = partition_of(
            &housing,
            &[key("Michigan", "Ann Arbor"), key("Ohio", "Oxford")],
        );
        let w = recession::detect(&recession_series()).unwrap();

        let c = analyze(&recession_series(), &w, &housing, &partition).unwrap();
        assert_eq!(c.better, Cohort::UniversityTown);

        // Flip the cohorts and the verdict flips.
        let flipped = partition_of(
            &housing,
            &[key("Michigan", "Detroit"), key("Texas", "Houston")],
        );
        let c = analyze(&recession_series(), &w, &housing, &flipped).unwrap();
        assert_eq!(c.better, Cohort::NonUniversityTown);
    }

    #[test]
    fn test_different_tracks_the_p_value_threshold() {
        // Well-separated, low-variance cohorts push p far below 1%.
        let housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.01),
            (key("Ohio", "Oxford"), 1.02),
            (key("Wisconsin", "Madison"), 1.01),
            (key("Michigan", "Detroit"), 1.41),
            (key("Texas", "Houston"), 1.40),
            (key("Nevada", "Las Vegas"), 1.42),
        ]);
        let partition = partition_of(
            &housing,
            &[
                key("Michigan", "Ann Arbor"),
                key("Ohio", "Oxford"),
                key("Wisconsin", "Madison"),
            ],
        );
        let w = recession::detect(&recession_series()).unwrap();

        let c = analyze(&recession_series(), &w, &housing, &partition).unwrap();
        assert!(c.p_value < SIGNIFICANCE);
        assert!(c.different);
        assert_eq!(c.different, c.p_value < SIGNIFICANCE);
        assert_eq!(c.better, Cohort::UniversityTown);
    }

    #[test]
    fn test_regions_missing_a_quarter_are_dropped() {
        let mut housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.00),
            (key("Michigan", "Detroit"), 1.20),
            (key("Texas", "Houston"), 1.25),
        ]);
        // Region with no bottom-quarter price: must be excluded, not error.
        let mut partial = BTreeMap::new();
        partial.insert(q("2000q2"), 150.0);
        housing.insert(key("Ohio", "Columbus"), partial);

        let partition = partition_of(&housing, &[key("Michigan", "Ann Arbor")]);
        let w = recession::detect(&recession_series()).unwrap();

        let c = analyze(&recession_series(), &w, &housing, &partition).unwrap();
        assert_eq!(c.university_count, 1);
        assert_eq!(c.non_university_count, 2);
    }

    #[test]
    fn test_non_finite_ratios_are_dropped() {
        let mut housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.00),
            (key("Michigan", "Detroit"), 1.20),
            (key("Texas", "Houston"), 1.25),
        ]);
        // Zero bottom price → infinite ratio → dropped.
        let mut degenerate = BTreeMap::new();
        degenerate.insert(q("2000q2"), 150.0);
        degenerate.insert(q("2001q1"), 0.0);
        housing.insert(key("Ohio", "Columbus"), degenerate);

        let partition = partition_of(&housing, &[key("Michigan", "Ann Arbor")]);
        let w = recession::detect(&recession_series()).unwrap();

        let c = analyze(&recession_series(), &w, &housing, &partition).unwrap();
        assert_eq!(c.non_university_count, 2);
    }

    #[test]
    fn test_empty_cohort_is_surfaced() {
        let housing = housing_with_ratios(&[
            (key("Michigan", "Detroit"), 1.20),
            (key("Texas", "Houston"), 1.25),
        ]);
        // No university towns at all.
        let partition = partition_of(&housing, &[]);
        let w = recession::detect(&recession_series()).unwrap();

        let err = analyze(&recession_series(), &w, &housing, &partition).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptySample {
                cohort: Cohort::UniversityTown
            }
        );

        // Every region is a university town → the other cohort is empty.
        let all = partition_of(
            &housing,
            &[key("Michigan", "Detroit"), key("Texas", "Houston")],
        );
        let err = analyze(&recession_series(), &w, &housing, &all).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptySample {
                cohort: Cohort::NonUniversityTown
            }
        );
    }

    #[test]
    fn test_recession_starting_at_first_quarter_has_no_anchor() {
        let s = series(&[100.0, 99.0, 98.0, 99.0, 100.0, 101.0]);
        let w = recession::detect(&s).unwrap();
        assert_eq!(w.start, s.first_quarter().unwrap());

        let housing = housing_with_ratios(&[(key("Michigan", "Ann Arbor"), 1.0)]);
        let partition = partition_of(&housing, &[key("Michigan", "Ann Arbor")]);

        let err = analyze(&s, &w, &housing, &partition).unwrap_err();
        assert_eq!(err, AnalysisError::Boundary { start: q("2000q1") });
    }

    #[test]
    fn test_run_analysis_end_to_end() {
        let towns: BTreeSet<_> = [key("Michigan", "Ann Arbor"), key("Ohio", "Oxford")]
            .into_iter()
            .collect();
        let housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.02),
            (key("Ohio", "Oxford"), 1.04),
            (key("Michigan", "Detroit"), 1.30),
            (key("Texas", "Houston"), 1.28),
        ]);

        let report = run_analysis(&towns, &recession_series(), &housing).unwrap();
        assert_eq!(report.window.start, q("2000q3"));
        assert_eq!(report.window.bottom, q("2001q1"));
        assert_eq!(report.comparison.better, Cohort::UniversityTown);
        assert_eq!(
            report.comparison.different,
            report.comparison.p_value < SIGNIFICANCE
        );
    }

    #[test]
    fn test_report_serializes_flat() {
        let towns: BTreeSet<_> = [key("Michigan", "Ann Arbor")].into_iter().collect();
        let housing = housing_with_ratios(&[
            (key("Michigan", "Ann Arbor"), 1.02),
            (key("Michigan", "Detroit"), 1.30),
            (key("Texas", "Houston"), 1.28),
        ]);

        let report = run_analysis(&towns, &recession_series(), &housing).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["window"]["start"], "2000q3");
        assert_eq!(json["window"]["bottom"], "2001q1");
        assert!(json["p_value"].is_f64());
        assert!(json["better"].is_string());
    }
}
