// Supermarket Sales Dashboard - Core Library
// Exposes the filter-aggregate pipeline for the TUI, the API server, and tests

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod dimension;
pub mod error;
pub mod filter;
pub mod logging;
pub mod pages;
pub mod record;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use aggregate::{
    box_stats, count_by, group_by, key_metrics, mean_by, pivot, product_line_summary,
    resample_daily, resample_monthly, scatter, sum_by,
    Agg, BoxStats, DayPoint, GroupRow, GroupedTable, KeyMetrics, MonthBucket, PivotTable,
    ProductLineSummary, ScatterPoint, ShareRow,
};
pub use config::{load_config, Config, ConfigSource};
pub use dataset::{Dataset, FilterOptions};
pub use dimension::{Dimension, Measure};
pub use error::DatasetLoadError;
pub use filter::{filter, FilterSelection, Subset, FILTER_DIMENSIONS};
pub use pages::{build_report, page_data, report_for_subset, Page, PageData, PageReport, UnknownPage};
pub use record::SalesRecord;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
