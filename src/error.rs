//! Error taxonomy for the RFV scoring engine

use thiserror::Error;

use crate::score::Metric;

/// Broad category of an [`RfvError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing transaction fields
    DataValidation,
    /// A metric distribution could not be binned
    Scoring,
}

/// Errors raised by the scoring engine
///
/// Every variant is fatal to the invocation that produced it; the engine
/// never returns partial results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RfvError {
    #[error("Invalid transaction at row {row}: field '{field}' {reason}")]
    InvalidRow {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("No transactions to score")]
    EmptyDataset,

    #[error("Cannot score {metric}: {reason}")]
    Scoring { metric: Metric, reason: String },
}

impl RfvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RfvError::InvalidRow { .. } | RfvError::MissingColumn { .. } | RfvError::EmptyDataset => {
                ErrorKind::DataValidation
            }
            RfvError::Scoring { .. } => ErrorKind::Scoring,
        }
    }

    pub(crate) fn invalid_row(row: usize, field: &'static str, reason: impl Into<String>) -> Self {
        RfvError::InvalidRow {
            row,
            field,
            reason: reason.into(),
        }
    }
}
