// 📝 Sales Report - assemble aggregate views + enrichment metrics, render as text
//
// The payload (SalesReport) is the contract; render() is one presentation of it.

use crate::aggregation::{
    calculate_total_revenue, customer_analysis, daily_sales_trend, find_peak_sales_day,
    low_performing_products, region_wise_sales, top_selling_products, CustomerStats, DailyStats,
    PeakDay, ProductStats, RegionStats, DEFAULT_LOW_THRESHOLD, DEFAULT_TOP_N,
};
use crate::enrichment::EnrichmentStats;
use crate::error::PipelineError;
use crate::transaction::{EnrichedTransaction, Transaction};
use chrono::{Local, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

const WIDTH: usize = 60;

// ============================================================================
// REPORT PAYLOAD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_revenue: f64,
    pub transaction_count: usize,
    pub average_order_value: f64,
    /// (first, last) date token of the daily trend
    pub date_range: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAverage {
    pub region: String,
    pub average_transaction_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub generated_at: NaiveDateTime,
    pub records_processed: usize,
    pub summary: OverallSummary,
    pub regions: Vec<RegionStats>,
    pub top_products: Vec<ProductStats>,
    pub top_customers: Vec<CustomerStats>,
    pub daily_trend: Vec<DailyStats>,
    pub peak_day: Option<PeakDay>,
    pub low_performers: Vec<ProductStats>,
    pub top_n: usize,
    pub low_threshold: i64,
    pub region_averages: Vec<RegionAverage>,
    pub enrichment: EnrichmentStats,
}

/// Knobs for report assembly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub top_n: usize,
    pub low_threshold: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            top_n: DEFAULT_TOP_N,
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }
}

impl SalesReport {
    /// Build every section from the filtered transactions and their enrichment
    pub fn assemble(
        transactions: &[Transaction],
        enriched: &[EnrichedTransaction],
        generated_at: NaiveDateTime,
        options: ReportOptions,
    ) -> Self {
        let total_revenue = calculate_total_revenue(transactions);
        let transaction_count = transactions.len();
        let average_order_value = if transaction_count > 0 {
            total_revenue / transaction_count as f64
        } else {
            0.0
        };

        let daily_trend = daily_sales_trend(transactions);
        let date_range = match (daily_trend.first(), daily_trend.last()) {
            (Some(first), Some(last)) => Some((first.date.clone(), last.date.clone())),
            _ => None,
        };

        let regions = region_wise_sales(transactions);
        let region_averages = regions
            .iter()
            .map(|r| RegionAverage {
                region: r.region.clone(),
                average_transaction_value: r.average_transaction_value(),
            })
            .collect();

        let mut top_customers = customer_analysis(transactions);
        top_customers.truncate(options.top_n);

        SalesReport {
            generated_at,
            records_processed: transaction_count,
            summary: OverallSummary {
                total_revenue,
                transaction_count,
                average_order_value,
                date_range,
            },
            regions,
            top_products: top_selling_products(transactions, options.top_n),
            top_customers,
            peak_day: find_peak_sales_day(transactions),
            daily_trend,
            low_performers: low_performing_products(transactions, options.low_threshold),
            top_n: options.top_n,
            low_threshold: options.low_threshold,
            region_averages,
            enrichment: EnrichmentStats::from_records(enriched),
        }
    }

    /// Same as [`SalesReport::assemble`], stamped with the local time
    pub fn assemble_now(
        transactions: &[Transaction],
        enriched: &[EnrichedTransaction],
        options: ReportOptions,
    ) -> Self {
        Self::assemble(transactions, enriched, Local::now().naive_local(), options)
    }

    /// Render the text layout
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Render and write to `path` (UTF-8), creating parent directories
    pub fn write_report(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PipelineError::OutputWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, self.render()).map_err(|source| PipelineError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Report written to {}", path.display());
        Ok(())
    }
}

impl fmt::Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(WIDTH);
        let banner = "=".repeat(WIDTH);

        // Header
        writeln!(f, "{}", banner)?;
        writeln!(f, "{:^width$}", "SALES ANALYTICS REPORT", width = WIDTH)?;
        writeln!(
            f,
            "{:^width$}",
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            width = WIDTH
        )?;
        writeln!(
            f,
            "{:^width$}",
            format!("Records Processed: {}", self.records_processed),
            width = WIDTH
        )?;
        writeln!(f, "{}\n", banner)?;

        // Overall summary
        writeln!(f, "OVERALL SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Revenue:       {}", format_currency(self.summary.total_revenue))?;
        writeln!(f, "Total Transactions:  {}", self.summary.transaction_count)?;
        writeln!(
            f,
            "Average Order Value: {}",
            format_currency(self.summary.average_order_value)
        )?;
        let range = match &self.summary.date_range {
            Some((first, last)) => format!("{} to {}", first, last),
            None => "N/A".to_string(),
        };
        writeln!(f, "Date Range:          {}\n", range)?;

        // Regions
        writeln!(f, "REGION-WISE PERFORMANCE")?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<15} {:<15} {:<15} {:<10}",
            "Region", "Sales", "% of Total", "Transactions"
        )?;
        for r in &self.regions {
            writeln!(
                f,
                "{:<15} {:<15} {:<15} {:<10}",
                r.region,
                format_currency(r.total_sales),
                format!("{:.2}%", r.percentage),
                r.transaction_count
            )?;
        }
        writeln!(f)?;

        // Top products
        writeln!(f, "TOP {} PRODUCTS", self.top_n)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<6} {:<25} {:<12} {:<15}",
            "Rank", "Product Name", "Qty Sold", "Revenue"
        )?;
        for (i, p) in self.top_products.iter().enumerate() {
            writeln!(
                f,
                "{:<6} {:<25} {:<12} {}",
                i + 1,
                p.name,
                p.quantity,
                format_currency(p.revenue)
            )?;
        }
        writeln!(f)?;

        // Top customers
        writeln!(f, "TOP {} CUSTOMERS", self.top_n)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<6} {:<15} {:<20} {:<10}",
            "Rank", "Customer ID", "Total Spent", "Orders"
        )?;
        for (i, c) in self.top_customers.iter().enumerate() {
            writeln!(
                f,
                "{:<6} {:<15} {:<20} {:<10}",
                i + 1,
                c.customer_id,
                format_currency(c.total_spent),
                c.purchase_count
            )?;
        }
        writeln!(f)?;

        // Daily trend
        writeln!(f, "DAILY SALES TREND")?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<15} {:<15} {:<15} {:<10}",
            "Date", "Revenue", "Transactions", "Customers"
        )?;
        for d in &self.daily_trend {
            writeln!(
                f,
                "{:<15} {:<15} {:<15} {:<10}",
                d.date,
                format_currency(d.revenue),
                d.transaction_count,
                d.unique_customers
            )?;
        }
        writeln!(f)?;

        // Product performance
        writeln!(f, "PRODUCT PERFORMANCE ANALYSIS")?;
        writeln!(f, "{}", rule)?;
        if let Some(peak) = &self.peak_day {
            writeln!(
                f,
                "Peak Sales Day: {} (Revenue: {}, TX: {})",
                peak.date,
                format_currency(peak.revenue),
                peak.transaction_count
            )?;
        }
        let low = if self.low_performers.is_empty() {
            "None".to_string()
        } else {
            self.low_performers
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(
            f,
            "Low Performing Products (<{} units): {}",
            self.low_threshold, low
        )?;
        writeln!(f, "\nAvg Transaction Value per Region:")?;
        for avg in &self.region_averages {
            writeln!(
                f,
                " - {}: {}",
                avg.region,
                format_currency(avg.average_transaction_value)
            )?;
        }
        writeln!(f)?;

        // Enrichment
        writeln!(f, "API ENRICHMENT SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total Products Enriched: {}", self.enrichment.matched)?;
        writeln!(
            f,
            "Success Rate:            {:.2}%",
            self.enrichment.success_rate()
        )?;
        if !self.enrichment.unmatched_products.is_empty() {
            writeln!(
                f,
                "Products Not Found in API: {}",
                self.enrichment.unmatched_products.join(", ")
            )?;
        }
        writeln!(f, "{}", rule)?;

        Ok(())
    }
}

/// "$1,234.56"; negatives as "-$1,234.56"
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_product_mapping, ApiProduct};
    use crate::enrichment::enrich_transactions;
    use chrono::NaiveDate;

    fn create_test_transaction(
        id: &str,
        date: &str,
        product_id: &str,
        product: &str,
        quantity: i64,
        unit_price: f64,
        customer: &str,
        region: &str,
    ) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            date: date.to_string(),
            product_id: product_id.to_string(),
            product_name: product.to_string(),
            quantity,
            unit_price,
            customer_id: customer.to_string(),
            region: region.to_string(),
        }
    }

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn sample() -> (Vec<Transaction>, Vec<EnrichedTransaction>) {
        let txs = vec![
            create_test_transaction("T001", "2024-01-02", "P1", "Laptop", 2, 500.0, "C001", "North"),
            create_test_transaction("T002", "2024-01-01", "P2", "Mouse", 20, 10.0, "C002", "South"),
            create_test_transaction("T003", "2024-01-03", "P3", "Cable", 4, 5.0, "C002", "South"),
        ];
        let mapping = create_product_mapping(&[
            ApiProduct::new(1).with_category("laptops"),
            ApiProduct::new(2).with_category("accessories"),
        ]);
        let enriched = enrich_transactions(&txs, &mapping);
        (txs, enriched)
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1234.567), "$1,234.57");
        assert_eq!(format_currency(1234567.0), "$1,234,567.00");
        assert_eq!(format_currency(-42.0), "-$42.00");
    }

    #[test]
    fn test_assemble_sections() {
        let (txs, enriched) = sample();
        let report = SalesReport::assemble(&txs, &enriched, fixed_time(), ReportOptions::default());

        assert_eq!(report.records_processed, 3);
        assert_eq!(report.summary.total_revenue, 1220.0);
        assert!((report.summary.average_order_value - 406.666).abs() < 0.01);
        assert_eq!(
            report.summary.date_range,
            Some(("2024-01-01".to_string(), "2024-01-03".to_string()))
        );
        assert_eq!(report.regions[0].region, "North");
        assert_eq!(report.top_products[0].name, "Mouse");
        assert_eq!(report.top_customers[0].customer_id, "C001");
        assert_eq!(report.peak_day.as_ref().unwrap().date, "2024-01-02");
        assert_eq!(report.low_performers.len(), 2);
        assert_eq!(report.region_averages[1].average_transaction_value, 110.0);
        assert_eq!(report.enrichment.matched, 2);
        assert_eq!(report.enrichment.unmatched_products, vec!["Cable"]);
    }

    #[test]
    fn test_render_section_order() {
        let (txs, enriched) = sample();
        let text = SalesReport::assemble(&txs, &enriched, fixed_time(), ReportOptions::default()).render();

        let sections = [
            "SALES ANALYTICS REPORT",
            "OVERALL SUMMARY",
            "REGION-WISE PERFORMANCE",
            "TOP 5 PRODUCTS",
            "TOP 5 CUSTOMERS",
            "DAILY SALES TREND",
            "PRODUCT PERFORMANCE ANALYSIS",
            "API ENRICHMENT SUMMARY",
        ];
        let positions: Vec<usize> = sections
            .iter()
            .map(|s| text.find(s).unwrap_or_else(|| panic!("missing section {}", s)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(text.contains("Generated: 2024-12-01 09:30:00"));
        assert!(text.contains("Total Revenue:       $1,220.00"));
        assert!(text.contains("Date Range:          2024-01-01 to 2024-01-03"));
        assert!(text.contains("Peak Sales Day: 2024-01-02 (Revenue: $1,000.00, TX: 1)"));
        assert!(text.contains("Low Performing Products (<10 units): Laptop, Cable"));
        assert!(text.contains(" - South: $110.00"));
        assert!(text.contains("Success Rate:            66.67%"));
        assert!(text.contains("Products Not Found in API: Cable"));
    }

    #[test]
    fn test_display_matches_render() {
        let (txs, enriched) = sample();
        let report = SalesReport::assemble(&txs, &enriched, fixed_time(), ReportOptions::default());

        let text = format!("{}", report);
        assert_eq!(text, report.render());

        let rule = "-".repeat(WIDTH);
        assert!(text.starts_with(&"=".repeat(WIDTH)));
        assert!(text.ends_with(&format!("{}\n", rule)));
        assert!(text.lines().all(|line| !line.ends_with('\r')));
    }

    #[test]
    fn test_empty_report() {
        let report = SalesReport::assemble(&[], &[], fixed_time(), ReportOptions::default());
        let text = report.render();

        assert!(report.peak_day.is_none());
        assert!(text.contains("Date Range:          N/A"));
        assert!(text.contains("Low Performing Products (<10 units): None"));
        assert!(text.contains("Success Rate:            0.00%"));
        assert!(!text.contains("Peak Sales Day"));
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("sales_report.txt");

        let (txs, enriched) = sample();
        let report = SalesReport::assemble(&txs, &enriched, fixed_time(), ReportOptions::default());
        report.write_report(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, report.render());

        println!("✅ Report file test passed");
    }
}
