// 🔗 Enrichment - join transactions to the product catalog
//
// Join key: the digits of ProductID ("P101" → 101). No digits, no match.

use crate::catalog::ProductMapping;
use crate::error::PipelineError;
use crate::transaction::{EnrichedTransaction, Transaction, FIELD_NAMES};
use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;

/// Columns appended after the 8 transaction fields
pub const ENRICHMENT_FIELDS: [&str; 4] = ["API_Category", "API_Brand", "API_Rating", "API_Match"];

// ============================================================================
// JOIN
// ============================================================================

/// Keep only the digit characters of a product code and read them as a number
pub fn extract_numeric_id(product_id: &str) -> Option<i64> {
    let digits: String = product_id.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Enrich one transaction against the mapping
pub fn enrich_transaction(tx: &Transaction, mapping: &ProductMapping) -> EnrichedTransaction {
    let info = extract_numeric_id(&tx.product_id).and_then(|id| mapping.get(&id));

    match info {
        Some(info) => EnrichedTransaction {
            transaction: tx.clone(),
            api_category: info.category.clone(),
            api_brand: info.brand.clone(),
            api_rating: info.rating,
            api_match: true,
        },
        None => {
            debug!("{}: no catalog entry for {}", tx.transaction_id, tx.product_id);
            EnrichedTransaction::unmatched(tx.clone())
        }
    }
}

/// Enrich every transaction; the input is left untouched
pub fn enrich_transactions(
    transactions: &[Transaction],
    mapping: &ProductMapping,
) -> Vec<EnrichedTransaction> {
    transactions
        .iter()
        .map(|tx| enrich_transaction(tx, mapping))
        .collect()
}

/// Enrich and persist to `output_path` in one step
pub fn enrich_sales_data(
    transactions: &[Transaction],
    mapping: &ProductMapping,
    output_path: &Path,
) -> Result<Vec<EnrichedTransaction>> {
    let enriched = enrich_transactions(transactions, mapping);
    save_enriched_data(&enriched, output_path)?;
    Ok(enriched)
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentStats {
    pub matched: usize,
    pub total: usize,
    /// Sorted, distinct product names without a catalog entry
    pub unmatched_products: Vec<String>,
}

impl EnrichmentStats {
    pub fn from_records(records: &[EnrichedTransaction]) -> Self {
        let matched = records.iter().filter(|r| r.api_match).count();
        let unmatched_products = records
            .iter()
            .filter(|r| !r.api_match)
            .map(|r| r.transaction.product_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        EnrichmentStats {
            matched,
            total: records.len(),
            unmatched_products,
        }
    }

    /// matched ÷ total × 100 (0 for an empty set)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 / self.total as f64 * 100.0
    }
}

// ============================================================================
// PERSISTENCE
// ============================================================================

/// Plain decimal form with at least one fractional digit: 10 → "10.0"
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn optional_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "None".to_string())
}

fn row(record: &EnrichedTransaction) -> [String; 12] {
    let tx = &record.transaction;
    [
        tx.transaction_id.clone(),
        tx.date.clone(),
        tx.product_id.clone(),
        tx.product_name.clone(),
        tx.quantity.to_string(),
        format_number(tx.unit_price),
        tx.customer_id.clone(),
        tx.region.clone(),
        optional_text(&record.api_category),
        optional_text(&record.api_brand),
        record
            .api_rating
            .map(format_number)
            .unwrap_or_else(|| "None".to_string()),
        if record.api_match { "True" } else { "False" }.to_string(),
    ]
}

/// Write the enriched set as a pipe-delimited file with a header line
pub fn save_enriched_data(records: &[EnrichedTransaction], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::OutputWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(output_path).map_err(|source| PipelineError::OutputWrite {
        path: output_path.to_path_buf(),
        source,
    })?;

    let mut writer = WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(QuoteStyle::Never)
        .from_writer(file);

    let header: Vec<&str> = FIELD_NAMES.iter().chain(ENRICHMENT_FIELDS.iter()).copied().collect();
    writer
        .write_record(&header)
        .with_context(|| format!("Failed to write header to {}", output_path.display()))?;

    for record in records {
        writer.write_record(&row(record)).with_context(|| {
            format!(
                "Failed to write {} to {}",
                record.transaction.transaction_id,
                output_path.display()
            )
        })?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", output_path.display()))?;

    info!("Saved {} enriched records to {}", records.len(), output_path.display());
    Ok(())
}
