//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::data::CustomerMetrics;

/// Customer segmentation CLI using RFV quartile scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input transactions CSV file
    #[arg(short, long, default_value = "transactions.csv")]
    pub input: PathBuf,

    /// Directory for the exported CSV tables
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Optional path for a PNG bar chart of segment counts
    #[arg(short, long)]
    pub chart: Option<String>,

    /// Number of scored rows to print
    #[arg(long, default_value = "5")]
    pub preview: usize,

    /// Prediction mode: provide R,F,M values as comma-separated string
    /// Example: --predict "30,10,500.0" for Recency=30 days, Frequency=10, Monetary=500.0
    #[arg(short, long)]
    pub predict: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse RFV values from the predict string
    /// Expected format: "recency,frequency,monetary"
    pub fn parse_rfv_values(&self) -> crate::Result<Option<CustomerMetrics>> {
        let Some(ref predict_str) = self.predict else {
            return Ok(None);
        };

        let parts: Vec<&str> = predict_str.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            anyhow::bail!("Predict values must be in format 'recency,frequency,monetary'");
        }

        let recency_days: i64 = parts[0]
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid recency value: {}", parts[0]))?;
        if recency_days < 0 {
            anyhow::bail!("Recency must not be negative: {}", recency_days);
        }
        let frequency_count: usize = parts[1]
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid frequency value: {}", parts[1]))?;
        let monetary_sum: f64 = parts[2]
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| anyhow::anyhow!("Invalid monetary value: {}", parts[2]))?;

        Ok(Some(CustomerMetrics {
            recency_days,
            frequency_count,
            monetary_sum,
        }))
    }
}
