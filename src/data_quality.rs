// ✅ Data Quality - second validation pass + optional filters
//
// Runs independently of the parser and with a different rule set:
// adds the ProductID prefix check, drops the Region non-empty check.

use crate::transaction::Transaction;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// FILTER OPTIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Case-insensitive exact match on Region
    pub region: Option<String>,

    /// Inclusive lower bound on Quantity × UnitPrice
    pub min_amount: Option<f64>,

    /// Inclusive upper bound on Quantity × UnitPrice
    pub max_amount: Option<f64>,
}

impl FilterOptions {
    pub fn none() -> Self {
        FilterOptions::default()
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn with_min_amount(mut self, min: f64) -> Self {
        self.min_amount = Some(min);
        self
    }

    pub fn with_max_amount(mut self, max: f64) -> Self {
        self.max_amount = Some(max);
        self
    }

    pub fn has_amount_bounds(&self) -> bool {
        self.min_amount.is_some() || self.max_amount.is_some()
    }

    fn amount_in_range(&self, amount: f64) -> bool {
        self.min_amount.map_or(true, |min| amount >= min)
            && self.max_amount.map_or(true, |max| amount <= max)
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// What the valid set looks like before any filter is applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataInsights {
    /// Distinct regions, sorted
    pub available_regions: Vec<String>,

    /// (min, max) of Quantity × UnitPrice; None when nothing is valid
    pub amount_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub total_input: usize,
    pub invalid: usize,
    pub filtered_by_region: usize,
    pub filtered_by_amount: usize,
    pub final_count: usize,

    /// Records left after the region filter (None if it did not run)
    pub after_region: Option<usize>,

    /// Records left after the amount filter (None if it did not run)
    pub after_amount: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub transactions: Vec<Transaction>,
    pub invalid_count: usize,
    pub summary: FilterSummary,
    pub insights: DataInsights,
}

// ============================================================================
// VALIDATION RULES
// ============================================================================

/// Second-pass business rules
///
/// Quantity > 0, UnitPrice > 0, TransactionID starts with "T",
/// ProductID starts with "P", CustomerID starts with "C".
pub fn passes_business_rules(tx: &Transaction) -> bool {
    tx.quantity > 0
        && tx.unit_price > 0.0
        && tx.transaction_id.starts_with('T')
        && tx.product_id.starts_with('P')
        && tx.customer_id.starts_with('C')
}

/// Regions and revenue range of a set of transactions
pub fn compute_insights(transactions: &[Transaction]) -> DataInsights {
    let available_regions: Vec<String> = transactions
        .iter()
        .map(|tx| tx.region.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let amount_range = transactions.iter().map(Transaction::revenue).fold(
        None,
        |range: Option<(f64, f64)>, amount| match range {
            None => Some((amount, amount)),
            Some((min, max)) => Some((min.min(amount), max.max(amount))),
        },
    );

    DataInsights {
        available_regions,
        amount_range,
    }
}

// ============================================================================
// VALIDATE + FILTER
// ============================================================================

/// Re-validate transactions, compute insights, then apply the filters.
///
/// Pure: the input slice is untouched and repeated calls are independent.
pub fn validate_and_filter(transactions: &[Transaction], filters: &FilterOptions) -> FilterOutcome {
    let mut valid = Vec::with_capacity(transactions.len());
    let mut invalid_count = 0;

    // A Transaction always carries all eight fields, so the structural
    // re-check reduces to the business rules. Blank text is allowed here.
    for tx in transactions {
        if !passes_business_rules(tx) {
            debug!("{}: failed business rules", tx.transaction_id);
            invalid_count += 1;
            continue;
        }
        valid.push(tx.clone());
    }

    let insights = compute_insights(&valid);
    let mut filtered = valid;

    let mut filtered_by_region = 0;
    let mut after_region = None;
    if let Some(region) = filters.region.as_deref().filter(|r| !r.is_empty()) {
        let before = filtered.len();
        let wanted = region.to_lowercase();
        filtered.retain(|tx| tx.region.to_lowercase() == wanted);
        filtered_by_region = before - filtered.len();
        after_region = Some(filtered.len());
        info!("Records after region filter: {}", filtered.len());
    }

    let mut filtered_by_amount = 0;
    let mut after_amount = None;
    if filters.has_amount_bounds() {
        let before = filtered.len();
        filtered.retain(|tx| filters.amount_in_range(tx.revenue()));
        filtered_by_amount = before - filtered.len();
        after_amount = Some(filtered.len());
        info!("Records after amount filter: {}", filtered.len());
    }

    let summary = FilterSummary {
        total_input: transactions.len(),
        invalid: invalid_count,
        filtered_by_region,
        filtered_by_amount,
        final_count: filtered.len(),
        after_region,
        after_amount,
    };

    FilterOutcome {
        transactions: filtered,
        invalid_count,
        summary,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_transaction(
        id: &str,
        product_id: &str,
        customer_id: &str,
        region: &str,
        quantity: i64,
        unit_price: f64,
    ) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            date: "2024-01-05".to_string(),
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            quantity,
            unit_price,
            customer_id: customer_id.to_string(),
            region: region.to_string(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            create_test_transaction("T001", "P101", "C001", "East", 5, 10.0),   // 50
            create_test_transaction("T002", "P102", "C002", "West", 2, 100.0),  // 200
            create_test_transaction("T003", "P103", "C003", "east", 1, 20.0),   // 20
            create_test_transaction("T004", "X104", "C004", "North", 1, 20.0),  // bad product id
            create_test_transaction("T005", "P105", "Z005", "North", 1, 20.0),  // bad customer id
            create_test_transaction("T006", "P106", "C006", "South", 10, 30.0), // 300
        ]
    }

    #[test]
    fn test_business_rules() {
        let set = sample();
        let passed: Vec<bool> = set.iter().map(passes_business_rules).collect();
        assert_eq!(passed, vec![true, true, true, false, false, true]);
    }

    #[test]
    fn test_no_filters_reports_insights() {
        let outcome = validate_and_filter(&sample(), &FilterOptions::none());

        assert_eq!(outcome.invalid_count, 2);
        assert_eq!(outcome.transactions.len(), 4);
        assert_eq!(
            outcome.insights.available_regions,
            vec!["East", "South", "West", "east"]
        );
        assert_eq!(outcome.insights.amount_range, Some((20.0, 300.0)));
        assert_eq!(outcome.summary.total_input, 6);
        assert_eq!(outcome.summary.filtered_by_region, 0);
        assert_eq!(outcome.summary.filtered_by_amount, 0);
        assert_eq!(outcome.summary.after_region, None);
        assert_eq!(outcome.summary.final_count, 4);
    }

    #[test]
    fn test_region_filter_is_case_insensitive() {
        let filters = FilterOptions::none().with_region("EAST");
        let outcome = validate_and_filter(&sample(), &filters);

        let ids: Vec<&str> = outcome
            .transactions
            .iter()
            .map(|tx| tx.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T001", "T003"]);
        assert_eq!(outcome.summary.filtered_by_region, 2);
        assert_eq!(outcome.summary.after_region, Some(2));
    }

    #[test]
    fn test_amount_bounds_are_inclusive() {
        let filters = FilterOptions::none().with_min_amount(50.0).with_max_amount(200.0);
        let outcome = validate_and_filter(&sample(), &filters);

        let ids: Vec<&str> = outcome
            .transactions
            .iter()
            .map(|tx| tx.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T001", "T002"]);
        assert_eq!(outcome.summary.filtered_by_amount, 2);
        assert_eq!(outcome.summary.final_count, 2);
    }

    #[test]
    fn test_min_only_and_combined_filters() {
        let filters = FilterOptions::none().with_region("east").with_min_amount(30.0);
        let outcome = validate_and_filter(&sample(), &filters);

        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.transactions[0].transaction_id, "T001");
        assert_eq!(outcome.summary.filtered_by_region, 2);
        assert_eq!(outcome.summary.filtered_by_amount, 1);
        // Insights are taken before filtering
        assert_eq!(outcome.insights.available_regions.len(), 4);
    }

    #[test]
    fn test_blank_text_fields_survive_second_pass() {
        let lines = [
            "T001|2024-01-05|P101||5|10.00|C001|East",
            "T002||P102|Gadget|2|4.00|C002|West",
        ];
        let parsed = crate::parser::parse_transactions(&lines);
        assert_eq!(parsed.valid_count(), 2);

        let outcome = validate_and_filter(&parsed.transactions, &FilterOptions::none());
        assert_eq!(outcome.invalid_count, 0);
        assert_eq!(outcome.summary.final_count, 2);
        assert_eq!(outcome.transactions[0].product_name, "");
        assert_eq!(outcome.transactions[1].date, "");
    }

    #[test]
    fn test_blank_region_is_not_checked_here() {
        // Only the parser insists on a Region
        let tx = create_test_transaction("T001", "P101", "C001", "", 1, 1.0);

        let outcome = validate_and_filter(&[tx], &FilterOptions::none());
        assert_eq!(outcome.invalid_count, 0);
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.insights.available_regions, vec![""]);
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let input = sample();
        let first = validate_and_filter(&input, &FilterOptions::none());
        let filtered = validate_and_filter(&input, &FilterOptions::none().with_region("West"));
        let again = validate_and_filter(&input, &FilterOptions::none());

        assert_eq!(first, again);
        assert_eq!(filtered.invalid_count, first.invalid_count);
        assert_eq!(filtered.transactions.len(), 1);
        assert_eq!(input.len(), 6);

        println!("✅ Validate/filter purity test passed");
    }
}
