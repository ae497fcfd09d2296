// Sales Analytics System - Core Library
// Exposes all pipeline stages for use in the CLI and tests

pub mod error;
pub mod transaction;
pub mod parser;
pub mod data_quality;   // Second validation pass + filters
pub mod aggregation;    // Seven analytical views
pub mod catalog;        // External product list → mapping
pub mod enrichment;     // Catalog join + enriched file
pub mod report;
pub mod config;
pub mod pipeline;

// Re-export commonly used types
pub use error::{PipelineError, RecordIssue};
pub use transaction::{round2, EnrichedTransaction, Transaction};
pub use parser::{
    decode_text, parse_transactions, read_sales_data, split_data_lines,
    ParseOutcome, TextEncoding,
};
pub use data_quality::{
    compute_insights, passes_business_rules, validate_and_filter,
    DataInsights, FilterOptions, FilterOutcome, FilterSummary,
};
pub use aggregation::{
    calculate_total_revenue, customer_analysis, daily_sales_trend, find_peak_sales_day,
    low_performing_products, region_wise_sales, top_selling_products,
    CustomerStats, DailyStats, PeakDay, ProductStats, RegionStats,
};
pub use catalog::{
    create_product_mapping, ApiProduct, HttpProductProvider, ProductInfo, ProductMapping,
    ProductProvider, StaticProductProvider,
};
pub use enrichment::{
    enrich_sales_data, enrich_transactions, extract_numeric_id, save_enriched_data,
    EnrichmentStats,
};
pub use report::{format_currency, ReportOptions, SalesReport};
pub use config::{Cli, PipelineConfig};
pub use pipeline::{get_provider, RunOutcome, SalesPipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
