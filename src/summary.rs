//! Segment group counts

use std::collections::HashMap;

use serde::Serialize;

use crate::rfv::ScoredDataset;
use crate::segment::{MarketingStrategy, SegmentCode};

/// Member count and strategy of one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummaryRow {
    pub segment_code: SegmentCode,
    pub member_count: usize,
    pub marketing_strategy: MarketingStrategy,
}

/// One row per distinct segment code, largest group first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupSummary {
    pub rows: Vec<GroupSummaryRow>,
}

impl GroupSummary {
    /// Sum of member counts over all segments
    pub fn total_members(&self) -> usize {
        self.rows.iter().map(|r| r.member_count).sum()
    }

    pub fn get(&self, code: &SegmentCode) -> Option<&GroupSummaryRow> {
        self.rows.iter().find(|r| &r.segment_code == code)
    }
}

/// Count scored rows per segment code
///
/// Counts are per transaction row, so a customer with several purchases is
/// counted once for each of them.
pub fn summarize_groups(scored: &ScoredDataset) -> GroupSummary {
    let mut counts: HashMap<SegmentCode, usize> = HashMap::new();
    for row in &scored.rows {
        *counts.entry(row.segment).or_insert(0) += 1;
    }

    let mut rows: Vec<GroupSummaryRow> = counts
        .into_iter()
        .map(|(segment_code, member_count)| GroupSummaryRow {
            segment_code,
            member_count,
            marketing_strategy: segment_code.strategy(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.member_count
            .cmp(&a.member_count)
            .then_with(|| a.segment_code.cmp(&b.segment_code))
    });

    GroupSummary { rows }
}
