// ⚙️ Configuration - defaults + command-line flags

use crate::aggregation::{DEFAULT_LOW_THRESHOLD, DEFAULT_TOP_N};
use crate::catalog::{DEFAULT_API_URL, DEFAULT_PRODUCT_LIMIT, DEFAULT_TIMEOUT_SECS};
use crate::data_quality::FilterOptions;
use crate::report::ReportOptions;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INPUT_PATH: &str = "data/sales_data.txt";
pub const DEFAULT_ENRICHED_PATH: &str = "data/enriched_sales_data.txt";
pub const DEFAULT_REPORT_PATH: &str = "output/sales_report.txt";

/// Everything a pipeline run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub enriched_output_path: PathBuf,
    pub report_output_path: PathBuf,

    pub api_url: String,
    pub product_limit: usize,
    pub api_timeout_secs: u64,

    pub top_n: usize,
    pub low_stock_threshold: i64,

    pub filters: FilterOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            enriched_output_path: PathBuf::from(DEFAULT_ENRICHED_PATH),
            report_output_path: PathBuf::from(DEFAULT_REPORT_PATH),
            api_url: DEFAULT_API_URL.to_string(),
            product_limit: DEFAULT_PRODUCT_LIMIT,
            api_timeout_secs: DEFAULT_TIMEOUT_SECS,
            top_n: DEFAULT_TOP_N,
            low_stock_threshold: DEFAULT_LOW_THRESHOLD,
            filters: FilterOptions::none(),
        }
    }
}

impl PipelineConfig {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.top_n,
            low_threshold: self.low_stock_threshold,
        }
    }
}

/// Sales analytics: clean, filter, enrich and report on a sales log
#[derive(Parser, Debug)]
#[command(name = "sales-analytics", version)]
pub struct Cli {
    /// Pipe-delimited sales log (first line is a header)
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// Where the enriched dataset is written
    #[arg(long, default_value = DEFAULT_ENRICHED_PATH)]
    pub enriched_output: PathBuf,

    /// Where the text report is written
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    pub report: PathBuf,

    /// Keep only this region (case-insensitive)
    #[arg(long)]
    pub region: Option<String>,

    /// Minimum transaction amount (inclusive)
    #[arg(long)]
    pub min_amount: Option<f64>,

    /// Maximum transaction amount (inclusive)
    #[arg(long)]
    pub max_amount: Option<f64>,

    /// Product catalog endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Number of catalog products to fetch
    #[arg(long, default_value_t = DEFAULT_PRODUCT_LIMIT)]
    pub product_limit: usize,

    /// Skip the catalog fetch (every record ends up unmatched)
    #[arg(long)]
    pub offline: bool,

    /// Do not ask for filters interactively
    #[arg(long)]
    pub no_prompt: bool,
}

impl Cli {
    /// True when any filter came from the command line
    pub fn has_filter_flags(&self) -> bool {
        self.region.is_some() || self.min_amount.is_some() || self.max_amount.is_some()
    }

    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_path: self.input.clone(),
            enriched_output_path: self.enriched_output.clone(),
            report_output_path: self.report.clone(),
            api_url: self.api_url.clone(),
            product_limit: self.product_limit,
            filters: FilterOptions {
                region: self.region.clone().filter(|r| !r.trim().is_empty()),
                min_amount: self.min_amount,
                max_amount: self.max_amount,
            },
            ..PipelineConfig::default()
        }
    }
}

/// Interpret the answer to "minimum amount" the lenient way:
/// blank or unparsable means no bound.
pub fn parse_amount_input(input: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<f64>().map(Some)
}
