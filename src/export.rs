//! CSV export of scored datasets and group summaries

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::rfv::{ScoredDataset, ScoredRow};
use crate::score::ScoreLabel;
use crate::segment::{MarketingStrategy, SegmentCode};
use crate::summary::GroupSummary;

/// Default file name for the per-transaction analysis
pub const SCORED_FILE_NAME: &str = "rfv_analysis.csv";
/// Default file name for the segment counts
pub const SUMMARY_FILE_NAME: &str = "rfv_group_counts.csv";

/// Flat CSV row for a scored transaction
#[derive(Debug, Serialize)]
struct ScoredRecord<'a> {
    customer_id: &'a str,
    purchase_code: &'a str,
    purchase_date: String,
    total_value: f64,
    recency_days: i64,
    frequency_count: usize,
    monetary_sum: f64,
    r_score: ScoreLabel,
    f_score: ScoreLabel,
    m_score: ScoreLabel,
    segment_code: SegmentCode,
    marketing_strategy: MarketingStrategy,
}

impl<'a> From<&'a ScoredRow> for ScoredRecord<'a> {
    fn from(row: &'a ScoredRow) -> Self {
        ScoredRecord {
            customer_id: &row.transaction.customer_id,
            purchase_code: &row.transaction.purchase_code,
            purchase_date: format_date(&row.transaction.purchase_date),
            total_value: row.transaction.total_value,
            recency_days: row.metrics.recency_days,
            frequency_count: row.metrics.frequency_count,
            monetary_sum: row.metrics.monetary_sum,
            r_score: row.segment.recency(),
            f_score: row.segment.frequency(),
            m_score: row.segment.monetary(),
            segment_code: row.segment,
            marketing_strategy: row.strategy,
        }
    }
}

/// Dates without a time of day are written as plain `YYYY-MM-DD`
fn format_date(date: &NaiveDateTime) -> String {
    if date.num_seconds_from_midnight() == 0 && date.nanosecond() == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Write the scored dataset as CSV, one row per transaction
pub fn write_scored<W: Write>(dataset: &ScoredDataset, writer: W) -> crate::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in &dataset.rows {
        csv_writer.serialize(ScoredRecord::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the group summary as CSV
pub fn write_summary<W: Write>(summary: &GroupSummary, writer: W) -> crate::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in &summary.rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the scored dataset to a CSV file
pub fn export_scored_file(dataset: &ScoredDataset, path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?;
    write_scored(dataset, file)
}

/// Write the group summary to a CSV file
pub fn export_summary_file(summary: &GroupSummary, path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))?;
    write_summary(summary, file)
}
