// Housing Resilience - Core Library
// Did university-town housing hold its value through the recession better
// than everywhere else? Exposes the loaders, the recession detector, the
// region reconciler, and the price-ratio analyzer for the CLI and tests.

pub mod analysis;       // Price ratios + two-sample t-test
pub mod error;          // Domain error taxonomy
pub mod loaders;        // The three dataset ingestors
pub mod quarter;        // `<year>q<1-4>` labels
pub mod recession;      // GDP series + window detector
pub mod reconciliation; // University-town / other partition
pub mod states;         // Static state code ↔ name table

// Re-export commonly used types
pub use analysis::{
    analyze, run_analysis, students_t_test, AnalysisReport, Comparison, SIGNIFICANCE,
};
pub use error::AnalysisError;
pub use loaders::{
    load_gdp_series, load_quarterly_housing, load_university_towns, parse_university_towns,
    read_quarterly_housing, HousingTable,
};
pub use quarter::{ParseQuarterError, Quarter};
pub use recession::{detect, GdpPoint, GdpSeries, RecessionWindow};
pub use reconciliation::{partition, Cohort, Partition, RegionKey};
pub use states::{state_code, state_name, STATES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
