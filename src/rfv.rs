//! End-to-end RFV scoring: metrics, quartile scores and segment strategies

use tracing::info;

use crate::data::{derive_metrics, CustomerMetrics, MetricRow, Transaction};
use crate::error::RfvError;
use crate::score::{Metric, QuartileBins, ScoreLabel};
use crate::segment::{classify, MarketingStrategy, SegmentCode};

/// Quartile bins fitted for each metric
#[derive(Debug, Clone, PartialEq)]
pub struct RfvBins {
    pub recency: QuartileBins,
    pub frequency: QuartileBins,
    pub monetary: QuartileBins,
}

impl RfvBins {
    /// Fit bins for all three metrics over the given rows
    pub fn fit(rows: &[MetricRow]) -> Result<Self, RfvError> {
        let fit_metric = |metric: Metric| {
            let values: Vec<f64> = rows.iter().map(|r| r.metrics.value(metric)).collect();
            QuartileBins::fit(metric, &values)
        };

        Ok(RfvBins {
            recency: fit_metric(Metric::Recency)?,
            frequency: fit_metric(Metric::Frequency)?,
            monetary: fit_metric(Metric::Monetary)?,
        })
    }

    pub fn get(&self, metric: Metric) -> &QuartileBins {
        match metric {
            Metric::Recency => &self.recency,
            Metric::Frequency => &self.frequency,
            Metric::Monetary => &self.monetary,
        }
    }

    /// Score a customer's metrics and resolve its segment
    pub fn classify(&self, metrics: &CustomerMetrics) -> (SegmentCode, MarketingStrategy) {
        classify(
            self.recency.assign(metrics.value(Metric::Recency)),
            self.frequency.assign(metrics.value(Metric::Frequency)),
            self.monetary.assign(metrics.value(Metric::Monetary)),
        )
    }
}

/// One transaction with its metrics, scores and strategy
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub transaction: Transaction,
    pub metrics: CustomerMetrics,
    pub segment: SegmentCode,
    pub strategy: MarketingStrategy,
}

impl ScoredRow {
    pub fn score(&self, metric: Metric) -> ScoreLabel {
        match metric {
            Metric::Recency => self.segment.recency(),
            Metric::Frequency => self.segment.frequency(),
            Metric::Monetary => self.segment.monetary(),
        }
    }
}

/// Output of [`compute_rfv`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDataset {
    pub rows: Vec<ScoredRow>,
    pub bins: RfvBins,
}

impl ScoredDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Score an arbitrary R/F/M triple against this dataset's bins
    pub fn predict(&self, metrics: &CustomerMetrics) -> (SegmentCode, MarketingStrategy) {
        self.bins.classify(metrics)
    }
}

/// Score a transaction log
///
/// # Arguments
/// * `transactions` - Every transaction to analyse; dates already parsed
///
/// # Returns
/// * One scored row per transaction (input order), or the first data
///   validation or scoring error encountered
pub fn compute_rfv(transactions: &[Transaction]) -> Result<ScoredDataset, RfvError> {
    let metric_rows = derive_metrics(transactions)?;
    let bins = RfvBins::fit(&metric_rows)?;

    let rows: Vec<ScoredRow> = metric_rows
        .into_iter()
        .map(|row| {
            let (segment, strategy) = bins.classify(&row.metrics);
            ScoredRow {
                transaction: row.transaction,
                metrics: row.metrics,
                segment,
                strategy,
            }
        })
        .collect();

    info!(
        rows = rows.len(),
        recency_bins = bins.recency.n_bins(),
        frequency_bins = bins.frequency.n_bins(),
        monetary_bins = bins.monetary.n_bins(),
        "scored transactions"
    );

    Ok(ScoredDataset { rows, bins })
}
