// 📊 Aggregation Engine - seven analytical views over a transaction set
//
// Every function is pure: same input slice, same output, no hidden state.
// Grouping keys use exact string equality.

use crate::transaction::{round2, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_LOW_THRESHOLD: i64 = 10;

// ============================================================================
// VIEW TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub region: String,
    pub total_sales: f64,
    pub transaction_count: usize,
    /// Share of total revenue, 2 decimals
    pub percentage: f64,
}

impl RegionStats {
    pub fn average_transaction_value(&self) -> f64 {
        if self.transaction_count == 0 {
            return 0.0;
        }
        self.total_sales / self.transaction_count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStats {
    pub name: String,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStats {
    pub customer_id: String,
    pub total_spent: f64,
    pub purchase_count: usize,
    pub avg_order_value: f64,
    /// Distinct product names, sorted
    pub products_bought: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub revenue: f64,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDay {
    pub date: String,
    pub revenue: f64,
    pub transaction_count: usize,
}

// ============================================================================
// GROUPING HELPER
// ============================================================================

/// Keeps groups in first-seen order so stable sorts break ties predictably
struct OrderedGroups<V> {
    index: HashMap<String, usize>,
    groups: Vec<(String, V)>,
}

impl<V: Default> OrderedGroups<V> {
    fn new() -> Self {
        OrderedGroups {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut V {
        let existing = self.index.get(key).copied();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                self.groups.push((key.to_string(), V::default()));
                self.index.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[slot].1
    }

    fn into_vec(self) -> Vec<(String, V)> {
        self.groups
    }
}

#[derive(Default)]
struct ProductTotals {
    quantity: i64,
    revenue: f64,
}

fn group_products(transactions: &[Transaction]) -> Vec<ProductStats> {
    let mut groups: OrderedGroups<ProductTotals> = OrderedGroups::new();
    for tx in transactions {
        let totals = groups.entry(&tx.product_name);
        // Totals past i64::MAX pin at the maximum
        totals.quantity = totals.quantity.saturating_add(tx.quantity);
        totals.revenue += tx.revenue();
    }

    groups
        .into_vec()
        .into_iter()
        .map(|(name, totals)| ProductStats {
            name,
            quantity: totals.quantity,
            revenue: totals.revenue,
        })
        .collect()
}

fn by_descending(a: f64, b: f64) -> std::cmp::Ordering {
    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
}

// ============================================================================
// VIEWS
// ============================================================================

/// Sum of Quantity × UnitPrice
pub fn calculate_total_revenue(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(Transaction::revenue).sum()
}

/// Sales per region, highest total first
pub fn region_wise_sales(transactions: &[Transaction]) -> Vec<RegionStats> {
    let total = calculate_total_revenue(transactions);

    #[derive(Default)]
    struct RegionTotals {
        sales: f64,
        count: usize,
    }

    let mut groups: OrderedGroups<RegionTotals> = OrderedGroups::new();
    for tx in transactions {
        let totals = groups.entry(&tx.region);
        totals.sales += tx.revenue();
        totals.count += 1;
    }

    let mut regions: Vec<RegionStats> = groups
        .into_vec()
        .into_iter()
        .map(|(region, totals)| RegionStats {
            region,
            total_sales: totals.sales,
            transaction_count: totals.count,
            percentage: if total > 0.0 {
                round2(totals.sales / total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    regions.sort_by(|a, b| by_descending(a.total_sales, b.total_sales));
    regions
}

/// Top `n` products by quantity sold
pub fn top_selling_products(transactions: &[Transaction], n: usize) -> Vec<ProductStats> {
    let mut products = group_products(transactions);
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    products.truncate(n);
    products
}

/// Products whose total quantity is below `threshold`, lowest first
pub fn low_performing_products(transactions: &[Transaction], threshold: i64) -> Vec<ProductStats> {
    let mut products: Vec<ProductStats> = group_products(transactions)
        .into_iter()
        .filter(|p| p.quantity < threshold)
        .map(|p| ProductStats {
            revenue: round2(p.revenue),
            ..p
        })
        .collect();

    products.sort_by_key(|p| p.quantity);
    products
}

/// Spend per customer, biggest spender first
pub fn customer_analysis(transactions: &[Transaction]) -> Vec<CustomerStats> {
    #[derive(Default)]
    struct CustomerTotals {
        spent: f64,
        count: usize,
        products: BTreeSet<String>,
    }

    let mut groups: OrderedGroups<CustomerTotals> = OrderedGroups::new();
    for tx in transactions {
        let totals = groups.entry(&tx.customer_id);
        totals.spent += tx.revenue();
        totals.count += 1;
        totals.products.insert(tx.product_name.clone());
    }

    let mut customers: Vec<CustomerStats> = groups
        .into_vec()
        .into_iter()
        .map(|(customer_id, totals)| CustomerStats {
            customer_id,
            total_spent: round2(totals.spent),
            purchase_count: totals.count,
            avg_order_value: round2(totals.spent / totals.count as f64),
            products_bought: totals.products.into_iter().collect(),
        })
        .collect();

    customers.sort_by(|a, b| by_descending(a.total_spent, b.total_spent));
    customers
}

/// Revenue per date token, ascending by the literal date string
pub fn daily_sales_trend(transactions: &[Transaction]) -> Vec<DailyStats> {
    #[derive(Default)]
    struct DayTotals<'a> {
        revenue: f64,
        count: usize,
        customers: BTreeSet<&'a str>,
    }

    let mut days: BTreeMap<&str, DayTotals> = BTreeMap::new();
    for tx in transactions {
        let totals = days.entry(tx.date.as_str()).or_default();
        totals.revenue += tx.revenue();
        totals.count += 1;
        totals.customers.insert(tx.customer_id.as_str());
    }

    days.into_iter()
        .map(|(date, totals)| DailyStats {
            date: date.to_string(),
            revenue: round2(totals.revenue),
            transaction_count: totals.count,
            unique_customers: totals.customers.len(),
        })
        .collect()
}

/// Day with the highest revenue; earliest date wins a tie
pub fn find_peak_sales_day(transactions: &[Transaction]) -> Option<PeakDay> {
    daily_sales_trend(transactions)
        .into_iter()
        .fold(None, |best: Option<DailyStats>, day| match best {
            Some(current) if current.revenue >= day.revenue => Some(current),
            _ => Some(day),
        })
        .map(|day| PeakDay {
            date: day.date,
            revenue: day.revenue,
            transaction_count: day.transaction_count,
        })
}
