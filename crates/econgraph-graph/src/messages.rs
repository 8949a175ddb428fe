//! Batch input and output types for the graph kernels.

use crate::centrality::PageRankResult;
use crate::types::{Community, CyclePattern, RelationshipAggregate, UserRelationship};
use serde::{Deserialize, Serialize};

// ============================================================================
// PageRank
// ============================================================================

/// Input for a PageRank batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRankInput {
    /// Undirected pairwise aggregates the graph is built from.
    pub edges: Vec<RelationshipAggregate>,
}

/// Output of a PageRank batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankOutput {
    /// Ranks in node order.
    pub result: PageRankResult,
    /// Compute time in microseconds.
    pub compute_time_us: u64,
}

// ============================================================================
// Communities
// ============================================================================

/// Input for a community detection batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityInput {
    /// Undirected pairwise aggregates the graph is built from.
    pub edges: Vec<RelationshipAggregate>,
}

/// Output of a community detection batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityOutput {
    /// Scored communities, most suspicious first.
    pub communities: Vec<Community>,
    /// Compute time in microseconds.
    pub compute_time_us: u64,
}

// ============================================================================
// Cycles
// ============================================================================

/// Input for a circular flow batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleInput {
    /// Scored relationships; they define both the graph and the link amounts.
    pub relationships: Vec<UserRelationship>,
}

/// Output of a circular flow batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutput {
    /// Scored cycles, most suspicious first.
    pub cycles: Vec<CyclePattern>,
    /// Compute time in microseconds.
    pub compute_time_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_deserializes_from_json() {
        let input: PageRankInput = serde_json::from_str(
            r#"{"edges":[{"user_id":"a","related_user_id":"b","transaction_count":3}]}"#,
        )
        .unwrap();
        assert_eq!(input.edges.len(), 1);
        assert_eq!(input.edges[0].transaction_count, 3);
    }
}
