//! Relationship strength scoring.
//!
//! `strength = round(f + a + d)` where each term saturates independently:
//! - `f = min(count / 100 * 40, 40)`
//! - `a = min(total_amount / 1_000_000 * 30, 30)`
//! - `d = min(days(first, last) / 365 * 30, 30)`
//!
//! The scales and caps come from [`StrengthWeights`].

use crate::types::{RelationshipRow, UserRelationship};
use chrono::{DateTime, Utc};
use econgraph_core::{
    config::StrengthWeights, domain::Domain, kernel::KernelMetadata, ratio,
    traits::AnalysisKernel,
};

/// Compute the bounded closeness score of a relationship.
#[must_use]
pub fn relationship_strength(
    count: u64,
    total_amount: f64,
    first_transaction: DateTime<Utc>,
    last_transaction: DateTime<Utc>,
    weights: &StrengthWeights,
) -> u8 {
    let days = (last_transaction - first_transaction).num_seconds().max(0) as f64 / 86_400.0;

    let f = capped_term(count as f64, weights.count_scale, weights.count_weight);
    let a = capped_term(total_amount, weights.amount_scale, weights.amount_weight);
    let d = capped_term(days, weights.duration_scale_days, weights.duration_weight);

    (f + a + d).round().clamp(0.0, 100.0) as u8
}

fn capped_term(value: f64, scale: f64, weight: f64) -> f64 {
    (ratio(value, scale) * weight).clamp(0.0, weight.max(0.0))
}

/// Relationship strength kernel.
#[derive(Debug, Clone)]
pub struct RelationshipStrengthScorer {
    metadata: KernelMetadata,
    weights: StrengthWeights,
}

impl Default for RelationshipStrengthScorer {
    fn default() -> Self {
        Self::new(StrengthWeights::default())
    }
}

impl RelationshipStrengthScorer {
    /// Create a scorer with the given weights.
    #[must_use]
    pub fn new(weights: StrengthWeights) -> Self {
        Self {
            metadata: KernelMetadata::new("graph/relationship-strength", Domain::GraphAnalytics)
                .with_description("Bounded 0-100 closeness from frequency, amount and duration")
                .with_complexity("O(1)"),
            weights,
        }
    }

    /// Score a single relationship row.
    #[must_use]
    pub fn score(&self, row: &RelationshipRow) -> u8 {
        relationship_strength(
            row.transaction_count,
            row.total_amount,
            row.first_transaction,
            row.last_transaction,
            &self.weights,
        )
    }

    /// Turn raw rows into scored relationships.
    pub fn score_all(&self, rows: Vec<RelationshipRow>) -> Vec<UserRelationship> {
        rows.into_iter()
            .map(|row| UserRelationship::from_row(row, &self.weights))
            .collect()
    }
}

impl AnalysisKernel for RelationshipStrengthScorer {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}
