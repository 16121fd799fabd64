//! Segment codes and the marketing strategy rule table

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::score::ScoreLabel;

/// Recency, Frequency and Monetary labels of a row, in that order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentCode([ScoreLabel; 3]);

impl SegmentCode {
    pub fn new(recency: ScoreLabel, frequency: ScoreLabel, monetary: ScoreLabel) -> Self {
        SegmentCode([recency, frequency, monetary])
    }

    pub fn recency(&self) -> ScoreLabel {
        self.0[0]
    }

    pub fn frequency(&self) -> ScoreLabel {
        self.0[1]
    }

    pub fn monetary(&self) -> ScoreLabel {
        self.0[2]
    }

    pub fn strategy(&self) -> MarketingStrategy {
        MarketingStrategy::for_code(&self.to_string())
    }
}

impl fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in self.0 {
            write!(f, "{}", label)?;
        }
        Ok(())
    }
}

impl Serialize for SegmentCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Error returned when a string is not a valid segment code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid segment code '{0}': expected 3 letters from A-D")]
pub struct ParseSegmentCodeError(pub String);

impl FromStr for SegmentCode {
    type Err = ParseSegmentCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let labels: Vec<ScoreLabel> = s
            .chars()
            .map(ScoreLabel::from_char)
            .collect::<Option<_>>()
            .ok_or_else(|| ParseSegmentCodeError(s.to_string()))?;

        match labels.as_slice() {
            &[r, f, m] => Ok(SegmentCode::new(r, f, m)),
            _ => Err(ParseSegmentCodeError(s.to_string())),
        }
    }
}

/// Recommended marketing action for a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketingStrategy {
    MaintainLoyal,
    EncouragePurchases,
    ReactivateLost,
    OfferPromotions,
    Personalized,
}

/// Exact-match rules, checked in order before falling back to
/// [`MarketingStrategy::Personalized`]
const STRATEGY_RULES: [(&str, MarketingStrategy); 4] = [
    ("AAA", MarketingStrategy::MaintainLoyal),
    ("AAD", MarketingStrategy::EncouragePurchases),
    ("DDD", MarketingStrategy::ReactivateLost),
    ("DDA", MarketingStrategy::OfferPromotions),
];

impl MarketingStrategy {
    /// Resolve the strategy for a segment code string
    ///
    /// Any code without an explicit rule, including malformed ones, gets the
    /// personalized strategy.
    pub fn for_code(code: &str) -> Self {
        STRATEGY_RULES
            .iter()
            .find(|(rule, _)| *rule == code)
            .map(|&(_, strategy)| strategy)
            .unwrap_or(MarketingStrategy::Personalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketingStrategy::MaintainLoyal => "Maintain loyal customer",
            MarketingStrategy::EncouragePurchases => "Encourage more purchases",
            MarketingStrategy::ReactivateLost => "Reactivate lost customers",
            MarketingStrategy::OfferPromotions => "Offer promotions to re-engage",
            MarketingStrategy::Personalized => "Develop personalized strategy",
        }
    }
}

impl fmt::Display for MarketingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MarketingStrategy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Build the segment code for a row's three labels and resolve its strategy
pub fn classify(
    recency: ScoreLabel,
    frequency: ScoreLabel,
    monetary: ScoreLabel,
) -> (SegmentCode, MarketingStrategy) {
    let code = SegmentCode::new(recency, frequency, monetary);
    (code, code.strategy())
}
