use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::process;

use sales_analytics::config::parse_amount_input;
use sales_analytics::pipeline::TOTAL_STEPS;
use sales_analytics::{
    get_provider, format_currency, Cli, DataInsights, FilterOptions, PipelineError, SalesPipeline,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    println!("{}", "=".repeat(40));
    println!("SALES ANALYTICS SYSTEM");
    println!("{}", "=".repeat(40));

    match run(&cli) {
        Ok(()) => {}
        Err(e) => match e.downcast_ref::<PipelineError>() {
            // Stage short-circuits and a missing input are expected outcomes
            Some(PipelineError::MissingFile { .. }) | Some(PipelineError::NoData { .. }) => {
                eprintln!("Error: {} Exiting.", e);
                process::exit(1);
            }
            _ => {
                eprintln!("\nAN UNEXPECTED ERROR OCCURRED: {:#}", e);
                eprintln!("The program has terminated safely.");
                process::exit(1);
            }
        },
    }
}

fn step(n: usize, label: &str) {
    println!("\n[{}/{}] {}", n, TOTAL_STEPS, label);
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config();
    let provider = get_provider(&config, cli.offline);
    let pipeline = SalesPipeline::new(config, provider);

    // 1. Read
    step(1, "Reading sales data...");
    let lines = pipeline.read_lines()?;
    println!("✓ Successfully read {} raw lines from file", lines.len());

    // 2. Parse
    step(2, "Parsing and cleaning data...");
    let parsed = pipeline.parse(&lines)?;
    for line in parsed.summary_lines() {
        println!("{}", line);
    }

    // 3. Insights + filter choice
    step(3, "Filter Options Available:");
    let insights = pipeline.insights(&parsed.transactions);
    print_insights(&insights);

    let filters = if cli.no_prompt || cli.has_filter_flags() {
        pipeline.config().filters.clone()
    } else {
        prompt_filters(&mut io::stdin().lock())?
    };

    // 4. Validate + filter
    step(4, "Validating transactions...");
    let filtered = pipeline.filter(&parsed.transactions, &filters);
    if let Some(n) = filtered.summary.after_region {
        println!("Records after region filter: {}", n);
    }
    if let Some(n) = filtered.summary.after_amount {
        println!("Records after amount filter: {}", n);
    }
    println!(
        "✓ Valid: {} | Invalid: {}",
        filtered.summary.final_count, filtered.summary.invalid
    );

    // 5. Analysis happens during report assembly
    step(5, "Analyzing sales data...");
    println!("✓ Analysis complete");

    // 6. Catalog
    step(6, "Fetching product data from API...");
    let catalog = pipeline.fetch_catalog();
    if catalog.products_fetched == 0 {
        println!("! API Fetch failed, enrichment will be skipped.");
    } else {
        println!("✓ Fetched {} products", catalog.products_fetched);
    }

    // 7-8. Enrich + save
    step(7, "Enriching sales data...");
    let enriched = pipeline.enrich(&filtered.transactions, &catalog.mapping)?;
    let matched = enriched.iter().filter(|e| e.api_match).count();
    let pct = if enriched.is_empty() {
        0.0
    } else {
        matched as f64 / enriched.len() as f64 * 100.0
    };
    println!("✓ Enriched {}/{} transactions ({:.1}%)", matched, enriched.len(), pct);

    step(8, "Saving enriched data...");
    println!("✓ Saved to: {}", pipeline.config().enriched_output_path.display());

    // 9. Report
    step(9, "Generating report...");
    pipeline.report(&filtered.transactions, &enriched)?;
    println!("✓ Report saved to: {}", pipeline.config().report_output_path.display());

    step(10, "Process Complete!");
    println!("{}", "=".repeat(40));

    Ok(())
}

fn print_insights(insights: &DataInsights) {
    println!("\n--- Data Insights ---");
    println!("Available Regions: {}", insights.available_regions.join(", "));
    if let Some((min, max)) = insights.amount_range {
        println!(
            "Transaction Amount Range: {} - {}",
            format_currency(min),
            format_currency(max)
        );
    }
}

fn read_answer(input: &mut impl BufRead, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Interactive filter selection; a bad amount means "no amount filter"
fn prompt_filters(input: &mut impl BufRead) -> Result<FilterOptions> {
    let choice = read_answer(input, "\nDo you want to filter data? (y/n): ")?;
    if !choice.eq_ignore_ascii_case("y") {
        return Ok(FilterOptions::none());
    }

    let mut filters = FilterOptions::none();

    let region = read_answer(input, "Enter Region to filter by (or leave blank): ")?;
    if !region.is_empty() {
        filters = filters.with_region(&region);
    }

    let amount = read_answer(input, "Enter minimum transaction amount (or leave blank): ")?;
    match parse_amount_input(&amount) {
        Ok(Some(min)) => filters = filters.with_min_amount(min),
        Ok(None) => {}
        Err(_) => println!("! Invalid amount entered, skipping amount filter."),
    }

    Ok(filters)
}
