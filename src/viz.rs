//! Segment count chart using Plotters, plus console reports

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::rfv::ScoredDataset;
use crate::score::Metric;
use crate::segment::MarketingStrategy;
use crate::summary::GroupSummary;

/// Bar color for each strategy
fn strategy_color(strategy: MarketingStrategy) -> RGBColor {
    match strategy {
        MarketingStrategy::MaintainLoyal => GREEN,
        MarketingStrategy::EncouragePurchases => BLUE,
        MarketingStrategy::ReactivateLost => RED,
        MarketingStrategy::OfferPromotions => MAGENTA,
        MarketingStrategy::Personalized => RGBColor(128, 128, 128),
    }
}

/// Create a bar chart of transactions per segment, colored by strategy
///
/// # Arguments
/// * `summary` - Group counts to plot, bars drawn in summary order
/// * `output_path` - Path to save the PNG chart
pub fn create_segment_count_chart(summary: &GroupSummary, output_path: &str) -> crate::Result<()> {
    if summary.rows.is_empty() {
        anyhow::bail!("No segments to plot");
    }

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_segment_counts(&root, summary, true)?;
    root.present()?;

    tracing::info!(path = output_path, segments = summary.rows.len(), "segment chart saved");
    Ok(())
}

/// Draw the segment bars onto any drawing area. Captions, axis labels and
/// the mesh are only drawn when `with_text` is set.
fn draw_segment_counts<DB>(
    root: &DrawingArea<DB, Shift>,
    summary: &GroupSummary,
    with_text: bool,
) -> crate::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let n_segments = summary.rows.len();
    let max_count = summary
        .rows
        .iter()
        .map(|r| r.member_count)
        .max()
        .unwrap_or(1) as f64;
    let codes: Vec<String> = summary.rows.iter().map(|r| r.segment_code.to_string()).collect();

    let mut builder = ChartBuilder::on(root);
    builder.margin(10);
    if with_text {
        builder
            .caption("Transactions per RFV Segment", ("sans-serif", 30))
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart =
        builder.build_cartesian_2d(-0.5f64..(n_segments as f64 - 0.5), 0f64..(max_count * 1.1))?;

    if with_text {
        let label_for = |x: &f64| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            codes.get(idx as usize).cloned().unwrap_or_default()
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n_segments)
            .x_label_formatter(&label_for)
            .x_desc("Segment (R F M)")
            .y_desc("Number of Transactions")
            .axis_desc_style(("sans-serif", 15))
            .draw()?;
    }

    for (i, row) in summary.rows.iter().enumerate() {
        let color = strategy_color(row.marketing_strategy);
        let x = i as f64;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, row.member_count as f64)],
            color.filled(),
        )))?;
    }

    Ok(())
}

/// Print the first `n` scored rows as a table
pub fn print_preview(dataset: &ScoredDataset, n: usize) {
    println!(
        "  {:<12} {:<10} {:<10} {:>10} {:>7} {:>5} {:>10}  {:<4} {}",
        "Customer", "Purchase", "Date", "Value", "R(d)", "F", "M", "RFV", "Strategy"
    );
    for row in dataset.rows.iter().take(n) {
        println!(
            "  {:<12} {:<10} {:<10} {:>10.2} {:>7} {:>5} {:>10.2}  {:<4} {}",
            row.transaction.customer_id,
            row.transaction.purchase_code,
            row.transaction.purchase_date.format("%Y-%m-%d"),
            row.transaction.total_value,
            row.metrics.recency_days,
            row.metrics.frequency_count,
            row.metrics.monetary_sum,
            row.segment.to_string(),
            row.strategy
        );
    }
}

/// Print bin edges and segment counts to the console
pub fn print_segment_statistics(dataset: &ScoredDataset, summary: &GroupSummary) {
    println!("\n=== Quartile Bins ===");
    for metric in [Metric::Recency, Metric::Frequency, Metric::Monetary] {
        let bins = dataset.bins.get(metric);
        let edges: Vec<String> = bins.edges().iter().map(|e| format!("{:.2}", e)).collect();
        println!(
            "  {:<9} | {} categories | edges [{}]",
            metric.to_string(),
            bins.n_bins(),
            edges.join(", ")
        );
    }

    let total = summary.total_members();
    println!("\n=== Segment Counts ===");
    println!("  Segment | Count | Share  | Strategy");
    println!("  --------|-------|--------|---------");
    for row in &summary.rows {
        let percentage = (row.member_count as f64 / total as f64) * 100.0;
        println!(
            "  {:<7} | {:5} | {:5.1}% | {}",
            row.segment_code.to_string(),
            row.member_count,
            percentage,
            row.marketing_strategy
        );
    }
    println!("  Total transactions: {}", total);
}
