// 📂 Dataset Loaders
// Three differently-shaped public datasets come in here and leave as the
// clean structures the analysis runs on:
//   - university_towns.txt  → set of (state, town) keys
//   - gdplev.xls            → quarterly GDP series from the 2000q1 epoch on
//   - City_Zhvi_AllHomes.csv → per-region quarterly mean prices
//
// All cleaning happens on ingest; downstream components never see raw rows.

use crate::quarter::Quarter;
use crate::recession::{GdpPoint, GdpSeries};
use crate::reconciliation::RegionKey;
use crate::states;
use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

/// Quarterly mean price per region, keyed by (state name, region name).
pub type HousingTable = BTreeMap<RegionKey, BTreeMap<Quarter, f64>>;

// ============================================================================
// UNIVERSITY TOWNS (semi-structured text table)
// ============================================================================

/// Load the university-town listing from its text file.
pub fn load_university_towns(path: &Path) -> Result<BTreeSet<RegionKey>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading university towns from {}", path.display()))?;
    let towns = parse_university_towns(&text);
    log::info!("loaded {} university towns from {}", towns.len(), path.display());
    Ok(towns)
}

/// Parse the Wikipedia-style listing: `State[edit]` header lines set the
/// current state, every other non-empty line is a town in it. State names
/// are truncated at the first `[` (footnote markers), town names at the
/// first `(` (university annotations); lines before the first header are
/// dropped.
pub fn parse_university_towns(text: &str) -> BTreeSet<RegionKey> {
    let mut towns = BTreeSet::new();
    let mut state: Option<String> = None;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line.contains("[edit]") {
            state = Some(strip_after(line, '['));
        } else if let Some(state) = &state {
            towns.insert((state.clone(), strip_after(line, '(')));
        }
    }
    towns
}

/// Drop everything from the first `delim` on, plus any whitespace before it.
fn strip_after(s: &str, delim: char) -> String {
    match s.find(delim) {
        Some(pos) => s[..pos].trim_end().to_string(),
        None => s.trim_end().to_string(),
    }
}

// ============================================================================
// GDP SERIES (spreadsheet)
// ============================================================================

/// Load the quarterly GDP series from the BEA workbook.
///
/// The sheet interleaves annual and quarterly tables; only cells at column
/// index 4 (quarter label) and 6 (GDP in chained dollars) matter. Rows whose
/// label does not parse as a quarter, or that predate the 2000q1 epoch, are
/// skipped. Sheet order is preserved, which keeps the series chronological.
pub fn load_gdp_series(path: &Path) -> Result<GdpSeries> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening GDP workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("GDP workbook has no sheets")?
        .context("reading the GDP workbook's first sheet")?;

    let mut points = Vec::new();
    for row in range.rows() {
        let Some(label) = row.get(4).and_then(cell_str) else {
            continue;
        };
        let Ok(quarter) = label.trim().parse::<Quarter>() else {
            continue;
        };
        if quarter < Quarter::EPOCH {
            continue;
        }
        let Some(gdp) = row.get(6).and_then(cell_f64) else {
            log::warn!("quarter {} has no GDP value, skipping row", quarter);
            continue;
        };
        points.push(GdpPoint { quarter, gdp });
    }

    if points.is_empty() {
        bail!(
            "no quarterly rows at or after {} in {}",
            Quarter::EPOCH,
            path.display()
        );
    }
    log::info!(
        "loaded {} GDP quarters from {} ({} → {})",
        points.len(),
        path.display(),
        points.first().map(|p| p.quarter).unwrap_or(Quarter::EPOCH),
        points.last().map(|p| p.quarter).unwrap_or(Quarter::EPOCH),
    );
    Ok(GdpSeries::from_points(points))
}

fn cell_str(cell: &Data) -> Option<&str> {
    match cell {
        Data::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    }
}

// ============================================================================
// HOUSING PRICES (CSV, monthly → quarterly)
// ============================================================================

/// Load the housing CSV and aggregate its monthly columns into quarters.
pub fn load_quarterly_housing(path: &Path) -> Result<HousingTable> {
    let file = fs::File::open(path)
        .with_context(|| format!("opening housing CSV {}", path.display()))?;
    let table = read_quarterly_housing(file)
        .with_context(|| format!("parsing housing CSV {}", path.display()))?;
    log::info!("loaded {} housing regions from {}", table.len(), path.display());
    Ok(table)
}

/// Parse the housing CSV from any reader.
///
/// Each row is keyed by (full state name, RegionName); the two-letter State
/// column goes through the static lookup table, and rows with an unknown
/// code are skipped with a warning. Monthly columns (`YYYY-MM` headers) at
/// or after the epoch are averaged into quarterly means; blank cells drop
/// out of the mean, and a quarter with no surviving months gets no entry.
pub fn read_quarterly_housing<R: io::Read>(reader: R) -> Result<HousingTable> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers().context("reading housing CSV headers")?.clone();

    let region_col = headers
        .iter()
        .position(|h| h == "RegionName")
        .context("housing CSV is missing a RegionName column")?;
    let state_col = headers
        .iter()
        .position(|h| h == "State")
        .context("housing CSV is missing a State column")?;

    // Pre-resolve which columns are months we care about.
    let month_cols: Vec<(usize, Quarter)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let quarter = month_header_to_quarter(name)?;
            (quarter >= Quarter::EPOCH).then_some((idx, quarter))
        })
        .collect();
    if month_cols.is_empty() {
        bail!("housing CSV has no monthly columns at or after {}", Quarter::EPOCH);
    }

    let mut table = HousingTable::new();
    for record in csv.records() {
        let record = record.context("reading housing CSV record")?;

        let code = record.get(state_col).unwrap_or("").trim();
        let Some(state) = states::state_name(code) else {
            log::warn!("unknown state code {:?}, skipping row", code);
            continue;
        };
        let region = record.get(region_col).unwrap_or("").trim().to_string();

        let mut sums: BTreeMap<Quarter, (f64, u32)> = BTreeMap::new();
        for &(idx, quarter) in &month_cols {
            let cell = record.get(idx).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            let Ok(price) = cell.parse::<f64>() else {
                log::warn!(
                    "unparseable price {:?} for {} in {}, skipping cell",
                    cell,
                    region,
                    quarter
                );
                continue;
            };
            let entry = sums.entry(quarter).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }

        let prices: BTreeMap<Quarter, f64> = sums
            .into_iter()
            .map(|(quarter, (sum, count))| (quarter, sum / f64::from(count)))
            .collect();
        table.insert((state.to_string(), region), prices);
    }
    Ok(table)
}

/// `"2000-04"` → 2000q2; anything that is not a `YYYY-MM` header is None.
fn month_header_to_quarter(name: &str) -> Option<Quarter> {
    let date = NaiveDate::parse_from_str(&format!("{name}-01"), "%Y-%m-%d").ok()?;
    Some(Quarter::from_month(date.year(), date.month()))
}

// ============================================================================
// TESTS
// ============================================================================
