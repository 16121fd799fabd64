//! Quartile scoring of RFV metrics
//!
//! Each metric's distribution is cut at its 0/25/50/75/100% quantiles and
//! every value is mapped to an ordinal label. Binning is done by hand
//! (sort, interpolate, bucket) so tie handling and degenerate distributions
//! stay explicit.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RfvError;

/// Quantile levels used to build bin edges
pub const QUARTILE_LEVELS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// The three RFV metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Recency => "Recency",
            Metric::Frequency => "Frequency",
            Metric::Monetary => "Monetary",
        };
        f.write_str(name)
    }
}

/// Ordinal score label, in ascending bin order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreLabel {
    A,
    B,
    C,
    D,
}

impl ScoreLabel {
    /// Full label alphabet, lowest bin first
    pub const ALPHABET: [ScoreLabel; 4] = [ScoreLabel::A, ScoreLabel::B, ScoreLabel::C, ScoreLabel::D];

    pub fn as_char(self) -> char {
        match self {
            ScoreLabel::A => 'A',
            ScoreLabel::B => 'B',
            ScoreLabel::C => 'C',
            ScoreLabel::D => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(ScoreLabel::A),
            'B' => Some(ScoreLabel::B),
            'C' => Some(ScoreLabel::C),
            'D' => Some(ScoreLabel::D),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for ScoreLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

/// Fitted quartile bins for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct QuartileBins {
    /// Metric these bins were fitted on
    pub metric: Metric,
    /// Distinct, ascending bin edges (between 1 and 5 entries)
    edges: Vec<f64>,
}

impl QuartileBins {
    /// Fit bins to the full distribution of a metric
    ///
    /// Duplicate quantile edges are dropped, so a skewed distribution yields
    /// fewer than four bins. A constant column collapses to a single bin.
    ///
    /// # Arguments
    /// * `metric` - Metric being scored (used for error reporting)
    /// * `values` - Every value of the metric, one per dataset row
    ///
    /// # Returns
    /// * Fitted `QuartileBins`, or `RfvError::Scoring` for an empty column or
    ///   a non-finite value
    pub fn fit(metric: Metric, values: &[f64]) -> Result<Self, RfvError> {
        if values.is_empty() {
            return Err(RfvError::Scoring {
                metric,
                reason: "no values to bin".to_string(),
            });
        }

        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(RfvError::Scoring {
                metric,
                reason: format!("value at row {} is not finite", row),
            });
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut edges: Vec<f64> = QUARTILE_LEVELS
            .iter()
            .map(|&q| quantile(&sorted, q))
            .collect();
        edges.dedup();

        let bins = QuartileBins { metric, edges };
        debug!(%metric, edges = ?bins.edges, "fitted quartile bins");
        if bins.n_bins() < ScoreLabel::ALPHABET.len() {
            warn!(
                %metric,
                bins = bins.n_bins(),
                "duplicate quantile edges dropped, metric scored with fewer categories"
            );
        }

        Ok(bins)
    }

    /// Bin edges after duplicate removal
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of populated categories (1 to 4)
    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1).max(1)
    }

    /// Labels this metric can produce, lowest bin first
    pub fn labels(&self) -> Vec<ScoreLabel> {
        ScoreLabel::ALPHABET[..self.n_bins()].to_vec()
    }

    /// Assign a value to its bin label
    ///
    /// Bins are right-closed `(e_i, e_i+1]`, the first bin also includes its
    /// lower edge. Values outside the fitted range clamp to the first or last
    /// bin.
    pub fn assign(&self, value: f64) -> ScoreLabel {
        let n_bins = self.n_bins();
        if self.edges.len() < 2 {
            return ScoreLabel::A;
        }

        let bin = self.edges[1..]
            .iter()
            .position(|&upper| value <= upper)
            .unwrap_or(n_bins - 1);

        ScoreLabel::ALPHABET[bin]
    }
}

/// Score every value of a metric against bins fitted on the same values
pub fn score_metric(metric: Metric, values: &[f64]) -> Result<Vec<ScoreLabel>, RfvError> {
    let bins = QuartileBins::fit(metric, values)?;
    Ok(values.iter().map(|&v| bins.assign(v)).collect())
}

/// Linear-interpolated quantile of an ascending, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
