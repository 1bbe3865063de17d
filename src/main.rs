use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

use housing_resilience::{
    load_gdp_series, load_quarterly_housing, load_university_towns, run_analysis,
};

// Default filenames match the published datasets.
const DEFAULT_TOWNS: &str = "university_towns.txt";
const DEFAULT_GDP: &str = "gdplev.xls";
const DEFAULT_HOUSING: &str = "City_Zhvi_AllHomes.csv";

fn main() -> Result<()> {
    env_logger::init();

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut json = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            _ => paths.push(PathBuf::from(arg)),
        }
    }

    let (towns_path, gdp_path, housing_path) = match paths.len() {
        0 => (
            PathBuf::from(DEFAULT_TOWNS),
            PathBuf::from(DEFAULT_GDP),
            PathBuf::from(DEFAULT_HOUSING),
        ),
        3 => {
            let mut it = paths.into_iter();
            // Length checked above, so all three are present.
            let towns = it.next().unwrap_or_default();
            let gdp = it.next().unwrap_or_default();
            let housing = it.next().unwrap_or_default();
            (towns, gdp, housing)
        }
        n => bail!("expected 0 or 3 dataset paths, got {} (see --help)", n),
    };

    if !json {
        println!("🏘️  University-Town Housing Resilience");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("\n📂 Loading datasets...");
    }

    let towns = load_university_towns(&towns_path)?;
    let series = load_gdp_series(&gdp_path)?;
    let housing = load_quarterly_housing(&housing_path)?;

    if !json {
        println!("✓ {} university towns", towns.len());
        if let (Some(first), Some(last)) = (series.first_quarter(), series.last_quarter()) {
            println!("✓ {} GDP quarters ({} → {})", series.len(), first, last);
        }
        println!("✓ {} housing regions", housing.len());
    }

    let report = run_analysis(&towns, &series, &housing)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n📉 Recession window");
    println!("   start:  {}", report.window.start);
    println!("   bottom: {}", report.window.bottom);
    println!("   end:    {}", report.window.end);

    let c = &report.comparison;
    println!("\n📊 Price-ratio t-test");
    println!(
        "   samples: {} university-town, {} non-university-town",
        c.university_count, c.non_university_count
    );
    println!("   p-value: {:.6}", c.p_value);
    println!(
        "   different at the 1% level: {}",
        if c.different { "yes" } else { "no" }
    );
    println!("   lower mean price loss: {}s", c.better);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if c.different {
        println!("✅ University-town and other housing moved differently through the recession");
    } else {
        println!("✓ No significant difference between the two groups");
    }

    Ok(())
}

fn print_usage() {
    println!("housing-resilience {}", housing_resilience::VERSION);
    println!();
    println!("Usage: housing-resilience [TOWNS_TXT GDP_XLS HOUSING_CSV] [--json]");
    println!();
    println!("Defaults: {DEFAULT_TOWNS} {DEFAULT_GDP} {DEFAULT_HOUSING}");
    println!("  --json   Print the report as JSON instead of the text summary");
}
