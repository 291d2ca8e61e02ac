//! Customer tiering by cumulative transaction volume.

use crate::{aggregator::CustomerAggregate, config::SegmentThresholds, types::CustomerId};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Platinum,
    Gold,
    Silver,
    Standard,
}

impl Segment {
    /// Highest tier first.
    pub const ALL: [Segment; 4] = [
        Segment::Platinum,
        Segment::Gold,
        Segment::Silver,
        Segment::Standard,
    ];

    /// Thresholds are checked from the top tier down and the first strict
    /// `>` match wins, so a total equal to a cut-off lands one tier lower.
    pub fn classify(total_amount: f64, thresholds: &SegmentThresholds) -> Segment {
        if total_amount > thresholds.platinum {
            Segment::Platinum
        } else if total_amount > thresholds.gold {
            Segment::Gold
        } else if total_amount > thresholds.silver {
            Segment::Silver
        } else {
            Segment::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Platinum => "Platinum",
            Segment::Gold => "Gold",
            Segment::Silver => "Silver",
            Segment::Standard => "Standard",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown segment '{0}'")]
pub struct ParseSegmentError(pub String);

impl FromStr for Segment {
    type Err = ParseSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Segment::ALL
            .into_iter()
            .find(|seg| seg.as_str() == s.trim())
            .ok_or_else(|| ParseSegmentError(s.to_string()))
    }
}

/// One `customer_segments` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSegment {
    pub customer_id: CustomerId,
    pub segment: Segment,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPopulation {
    pub segment: Segment,
    pub customers: usize,
    pub total_amount: f64,
}

/// One label per aggregate, in the aggregates' order.
pub fn segment_customers(
    aggregates: &[CustomerAggregate],
    thresholds: &SegmentThresholds,
) -> Vec<CustomerSegment> {
    aggregates
        .iter()
        .map(|agg| CustomerSegment {
            customer_id: agg.customer_id.clone(),
            segment: Segment::classify(agg.total_amount, thresholds),
            total_amount: agg.total_amount,
        })
        .collect()
}

/// Customer count and volume per tier. Every tier is present, Platinum first.
pub fn segment_population(segments: &[CustomerSegment]) -> Vec<SegmentPopulation> {
    Segment::ALL
        .into_iter()
        .map(|segment| {
            let members = segments.iter().filter(|s| s.segment == segment);
            let (customers, total_amount) = members
                .fold((0usize, 0.0f64), |(n, sum), s| (n + 1, sum + s.total_amount));
            SegmentPopulation {
                segment,
                customers,
                total_amount,
            }
        })
        .collect()
}
