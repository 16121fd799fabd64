//! RfvForge: Customer Segmentation CLI using RFV quartile scoring
//!
//! This is the main entrypoint that orchestrates data loading, scoring,
//! group counting, export and prediction.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rfvforge::export::{export_scored_file, export_summary_file, SCORED_FILE_NAME, SUMMARY_FILE_NAME};
use rfvforge::{compute_rfv, load_transactions, summarize_groups, viz, Args, CustomerMetrics};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose, rust_log.as_deref())?)
        .with_writer(std::io::stderr)
        .init();

    if args.verbose {
        println!("RfvForge - Customer Segmentation using RFV Scoring");
        println!("==================================================\n");
    }

    // Check if in prediction mode
    if let Some(rfv_values) = args.parse_rfv_values()? {
        run_prediction_mode(&args, rfv_values)?;
    } else {
        run_full_pipeline(&args)?;
    }

    Ok(())
}

/// Build the log filter: `RUST_LOG` when set, `rfvforge=warn` otherwise.
/// `--verbose` adds `rfvforge=debug` on top.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
    let filter = match rust_log {
        Some(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec)?,
        _ => EnvFilter::new("rfvforge=warn"),
    };

    if verbose {
        Ok(filter.add_directive("rfvforge=debug".parse()?))
    } else {
        Ok(filter)
    }
}

/// Run prediction mode for a single customer
fn run_prediction_mode(args: &Args, rfv_values: CustomerMetrics) -> Result<()> {
    println!("=== Prediction Mode ===");
    println!(
        "Input RFV values: R={}, F={}, M={}",
        rfv_values.recency_days, rfv_values.frequency_count, rfv_values.monetary_sum
    );

    let start_time = Instant::now();

    // Load and score data to fit the quartile bins
    if args.verbose {
        println!("\nLoading reference data from: {}", args.input.display());
    }
    let transactions = load_transactions(&args.input)?;
    let scored = compute_rfv(&transactions)?;

    let (segment, strategy) = scored.predict(&rfv_values);
    let elapsed = start_time.elapsed();

    println!("\n✓ Predicted Segment: {}", segment);
    println!("  Strategy: {}", strategy);
    println!("  Processing time: {:.2}s", elapsed.as_secs_f64());

    // Show how large that segment is in the reference data
    let summary = summarize_groups(&scored);
    let members = summary.get(&segment).map_or(0, |g| g.member_count);
    let percentage = (members as f64 / scored.len() as f64) * 100.0;
    println!("\nSegment {} details:", segment);
    println!(
        "  Size: {} transactions ({:.1}% of total)",
        members, percentage
    );

    Ok(())
}

/// Run full scoring pipeline
fn run_full_pipeline(args: &Args) -> Result<()> {
    println!("=== Full RFV Pipeline ===\n");

    let start_time = Instant::now();

    // Step 1: Load data
    if args.verbose {
        println!("Step 1: Loading transactions");
        println!("  Input file: {}", args.input.display());
    }

    let data_start = Instant::now();
    let transactions = load_transactions(&args.input)?;
    let data_time = data_start.elapsed();

    println!("✓ Data loaded: {} transactions", transactions.len());
    if args.verbose {
        println!("  Loading time: {:.2}s", data_time.as_secs_f64());
    }

    // Step 2: Score
    if args.verbose {
        println!("\nStep 2: Computing RFV scores");
    }

    let score_start = Instant::now();
    let scored = compute_rfv(&transactions)?;
    let summary = summarize_groups(&scored);
    let score_time = score_start.elapsed();

    println!("✓ Scored {} rows into {} segments", scored.len(), summary.rows.len());
    if args.verbose {
        println!("  Scoring time: {:.2}s", score_time.as_secs_f64());
    }

    if args.preview > 0 {
        println!("\n=== Scored Rows (first {}) ===", args.preview.min(scored.len()));
        viz::print_preview(&scored, args.preview);
    }
    viz::print_segment_statistics(&scored, &summary);

    // Step 3: Export
    if args.verbose {
        println!("\nStep 3: Exporting tables");
        println!("  Output directory: {}", args.output_dir.display());
    }

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory '{}'", args.output_dir.display())
    })?;
    let scored_path = args.output_dir.join(SCORED_FILE_NAME);
    let summary_path = args.output_dir.join(SUMMARY_FILE_NAME);
    export_scored_file(&scored, &scored_path)?;
    export_summary_file(&summary, &summary_path)?;

    // Step 4: Optional chart
    if let Some(chart_path) = &args.chart {
        viz::create_segment_count_chart(&summary, chart_path)?;
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    println!("Scored dataset saved to: {}", scored_path.display());
    println!("Group counts saved to: {}", summary_path.display());
    if let Some(chart_path) = &args.chart {
        println!("Segment chart saved to: {}", chart_path);
    }

    Ok(())
}
