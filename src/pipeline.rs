// 🔄 Sales Pipeline - read → parse → validate/filter → enrich → report
//
// Each stage takes an immutable input and returns a new value; nothing is
// shared between stages except what is passed explicitly.

use crate::catalog::{
    create_product_mapping, HttpProductProvider, ProductMapping, ProductProvider,
    StaticProductProvider,
};
use crate::config::PipelineConfig;
use crate::data_quality::{validate_and_filter, DataInsights, FilterOptions, FilterOutcome, FilterSummary};
use crate::enrichment::{enrich_sales_data, EnrichmentStats};
use crate::error::PipelineError;
use crate::parser::{parse_transactions, read_sales_data, ParseOutcome};
use crate::report::SalesReport;
use crate::transaction::{EnrichedTransaction, Transaction};
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of progress steps the CLI shows
pub const TOTAL_STEPS: usize = 10;

/// Pick the catalog provider for a run
///
/// Factory pattern: returns Box<dyn ProductProvider> for polymorphism
pub fn get_provider(config: &PipelineConfig, offline: bool) -> Box<dyn ProductProvider> {
    if offline {
        Box::new(StaticProductProvider::empty())
    } else {
        Box::new(HttpProductProvider::new(&config.api_url, config.api_timeout_secs))
    }
}

/// Catalog fetch result
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFetch {
    pub products_fetched: usize,
    pub mapping: ProductMapping,
}

/// Summary of a complete run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub lines_read: usize,
    pub total_parsed: usize,
    pub invalid_removed: usize,
    pub filter_summary: FilterSummary,
    pub products_fetched: usize,
    pub enrichment: EnrichmentStats,
    pub enriched_path: PathBuf,
    pub report_path: PathBuf,
}

pub struct SalesPipeline {
    config: PipelineConfig,
    provider: Box<dyn ProductProvider>,
}

impl SalesPipeline {
    pub fn new(config: PipelineConfig, provider: Box<dyn ProductProvider>) -> Self {
        SalesPipeline { config, provider }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // ========================================================================
    // STAGES
    // ========================================================================

    /// Step 1: data lines of the input file (never empty on success)
    pub fn read_lines(&self) -> Result<Vec<String>> {
        let lines = read_sales_data(&self.config.input_path)?;
        if lines.is_empty() {
            return Err(PipelineError::no_data("read", "No data found or file could not be read.").into());
        }
        info!("Read {} data lines from {}", lines.len(), self.config.input_path.display());
        Ok(lines)
    }

    /// Step 2: parse and clean (at least one valid transaction on success)
    pub fn parse(&self, lines: &[String]) -> Result<ParseOutcome> {
        let outcome = parse_transactions(lines);
        if outcome.transactions.is_empty() {
            return Err(PipelineError::no_data("parse", "No transactions remained after parsing.").into());
        }
        Ok(outcome)
    }

    /// Step 3: regions and amount range of the valid set, no filters applied
    pub fn insights(&self, transactions: &[Transaction]) -> DataInsights {
        validate_and_filter(transactions, &FilterOptions::none()).insights
    }

    /// Step 4: validate and apply filters
    pub fn filter(&self, transactions: &[Transaction], filters: &FilterOptions) -> FilterOutcome {
        validate_and_filter(transactions, filters)
    }

    /// Step 6: fetch the catalog; failures yield an empty mapping
    pub fn fetch_catalog(&self) -> CatalogFetch {
        let products = self.provider.fetch_products(self.config.product_limit);
        if products.is_empty() {
            warn!("Provider '{}' returned no products; enrichment will match nothing", self.provider.name());
        }
        CatalogFetch {
            products_fetched: products.len(),
            mapping: create_product_mapping(&products),
        }
    }

    /// Steps 7-8: enrich and persist
    pub fn enrich(
        &self,
        transactions: &[Transaction],
        mapping: &ProductMapping,
    ) -> Result<Vec<EnrichedTransaction>> {
        enrich_sales_data(transactions, mapping, &self.config.enriched_output_path)
            .context("Saving enriched data failed")
    }

    /// Step 9: assemble and write the report
    pub fn report(
        &self,
        transactions: &[Transaction],
        enriched: &[EnrichedTransaction],
    ) -> Result<SalesReport> {
        let report = SalesReport::assemble_now(transactions, enriched, self.config.report_options());
        report
            .write_report(&self.config.report_output_path)
            .context("Writing report failed")?;
        Ok(report)
    }

    // ========================================================================
    // FULL RUN
    // ========================================================================

    /// Run every stage with the configured filters
    pub fn run(&self) -> Result<RunOutcome> {
        let lines = self.read_lines()?;
        let parsed = self.parse(&lines)?;
        let filtered = self.filter(&parsed.transactions, &self.config.filters);

        let catalog = self.fetch_catalog();
        let enriched = self.enrich(&filtered.transactions, &catalog.mapping)?;
        let report = self.report(&filtered.transactions, &enriched)?;

        Ok(RunOutcome {
            lines_read: lines.len(),
            total_parsed: parsed.total_parsed,
            invalid_removed: parsed.invalid_removed,
            filter_summary: filtered.summary,
            products_fetched: catalog.products_fetched,
            enrichment: report.enrichment,
            enriched_path: self.config.enriched_output_path.clone(),
            report_path: self.config.report_output_path.clone(),
        })
    }
}
