// 🧾 Transaction Model
// Fixed-shape sales records: one row of the pipe-delimited sales log

use crate::error::RecordIssue;
use serde::{Deserialize, Serialize};

/// Number of `|`-separated fields in one sales line
pub const FIELD_COUNT: usize = 8;

/// Column order of the sales log (and the first 8 columns of the enriched file)
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
];

/// Transaction - one validated sale event
///
/// Revenue is never stored; use [`Transaction::revenue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,

    /// Raw calendar-date token, compared as a string
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "ProductID")]
    pub product_id: String,

    #[serde(rename = "ProductName")]
    pub product_name: String,

    #[serde(rename = "Quantity")]
    pub quantity: i64,

    #[serde(rename = "UnitPrice")]
    pub unit_price: f64,

    #[serde(rename = "CustomerID")]
    pub customer_id: String,

    #[serde(rename = "Region")]
    pub region: String,
}

impl Transaction {
    /// Parse one raw sales line.
    ///
    /// Splits on `|`, trims every field, strips commas from the product name
    /// and from both numeric fields, then applies the parser rule set:
    /// TransactionID starts with "T", Quantity > 0, UnitPrice > 0,
    /// CustomerID and Region non-empty.
    pub fn from_line(line: &str) -> Result<Self, RecordIssue> {
        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() != FIELD_COUNT {
            return Err(RecordIssue::FieldCount(parts.len()));
        }

        let transaction_id = parts[0].trim().to_string();
        let date = parts[1].trim().to_string();
        let product_id = parts[2].trim().to_string();
        let product_name = parts[3].replace(',', "").trim().to_string();

        let quantity_raw = parts[4].replace(',', "");
        let quantity: i64 = quantity_raw
            .trim()
            .parse()
            .map_err(|_| RecordIssue::InvalidNumber {
                field: "Quantity",
                value: quantity_raw.trim().to_string(),
            })?;

        let price_raw = parts[5].replace(',', "");
        let unit_price: f64 = price_raw
            .trim()
            .parse()
            .ok()
            .filter(|p: &f64| p.is_finite())
            .ok_or_else(|| RecordIssue::InvalidNumber {
                field: "UnitPrice",
                value: price_raw.trim().to_string(),
            })?;

        let customer_id = parts[6].trim().to_string();
        let region = parts[7].trim().to_string();

        let tx = Transaction {
            transaction_id,
            date,
            product_id,
            product_name,
            quantity,
            unit_price,
            customer_id,
            region,
        };
        tx.check_parser_rules()?;
        Ok(tx)
    }

    /// Parser rule set (first pass)
    fn check_parser_rules(&self) -> Result<(), RecordIssue> {
        if !self.transaction_id.starts_with('T') {
            return Err(RecordIssue::Rule {
                field: "TransactionID",
                rule: "must start with 'T'",
            });
        }
        if self.quantity <= 0 {
            return Err(RecordIssue::Rule {
                field: "Quantity",
                rule: "must be greater than 0",
            });
        }
        if self.unit_price <= 0.0 {
            return Err(RecordIssue::Rule {
                field: "UnitPrice",
                rule: "must be greater than 0",
            });
        }
        if self.customer_id.is_empty() {
            return Err(RecordIssue::Rule {
                field: "CustomerID",
                rule: "must not be empty",
            });
        }
        if self.region.is_empty() {
            return Err(RecordIssue::Rule {
                field: "Region",
                rule: "must not be empty",
            });
        }
        Ok(())
    }

    /// Quantity × UnitPrice
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// EnrichedTransaction - a Transaction plus catalog metadata
///
/// Built once by the enricher, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,

    #[serde(rename = "API_Category")]
    pub api_category: Option<String>,

    #[serde(rename = "API_Brand")]
    pub api_brand: Option<String>,

    #[serde(rename = "API_Rating")]
    pub api_rating: Option<f64>,

    #[serde(rename = "API_Match")]
    pub api_match: bool,
}

impl EnrichedTransaction {
    /// Unmatched record: all API fields empty
    pub fn unmatched(transaction: Transaction) -> Self {
        EnrichedTransaction {
            transaction,
            api_category: None,
            api_brand: None,
            api_rating: None,
            api_match: false,
        }
    }
}

/// Round to 2 decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
