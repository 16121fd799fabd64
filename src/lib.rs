//! RfvForge: A Rust CLI application for customer segmentation using RFV scoring
//!
//! This library derives Recency, Frequency and Monetary (RFV) metrics from a
//! transaction log, bins each metric into quartile scores and maps the
//! resulting segment codes to marketing strategies.

pub mod cli;
pub mod data;
pub mod error;
pub mod export;
pub mod rfv;
pub mod score;
pub mod segment;
pub mod summary;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{derive_metrics, load_transactions, read_transactions, CustomerMetrics, Transaction};
pub use error::{ErrorKind, RfvError};
pub use rfv::{compute_rfv, RfvBins, ScoredDataset, ScoredRow};
pub use score::{Metric, QuartileBins, ScoreLabel};
pub use segment::{classify, MarketingStrategy, SegmentCode};
pub use summary::{summarize_groups, GroupSummary, GroupSummaryRow};
pub use viz::create_segment_count_chart;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
