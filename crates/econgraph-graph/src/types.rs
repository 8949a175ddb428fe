//! Relationship and result types shared by the graph kernels.

use crate::strength::relationship_strength;
use chrono::{DateTime, Utc};
use econgraph_core::config::StrengthWeights;
use econgraph_core::ratio;
use serde::{Deserialize, Serialize};

/// Anything that names an undirected account pair and a transaction count.
///
/// Implemented by every row shape the graph can be built from.
pub trait Pairwise {
    /// The two endpoints.
    fn endpoints(&self) -> (&str, &str);

    /// Transaction count between the endpoints.
    fn transaction_count(&self) -> u64;
}

/// Minimal pairwise aggregate: two accounts and how often they transacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipAggregate {
    /// First account.
    pub user_id: String,
    /// Second account.
    pub related_user_id: String,
    /// Transaction count between them.
    pub transaction_count: u64,
}

impl RelationshipAggregate {
    /// Create an aggregate.
    pub fn new(user_id: impl Into<String>, related_user_id: impl Into<String>, count: u64) -> Self {
        Self {
            user_id: user_id.into(),
            related_user_id: related_user_id.into(),
            transaction_count: count,
        }
    }
}

impl Pairwise for RelationshipAggregate {
    fn endpoints(&self) -> (&str, &str) {
        (&self.user_id, &self.related_user_id)
    }

    fn transaction_count(&self) -> u64 {
        self.transaction_count
    }
}

/// Raw relationship aggregate as returned by a data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRow {
    /// First account.
    pub user_id: String,
    /// Second account.
    pub related_user_id: String,
    /// Transaction count between them.
    pub transaction_count: u64,
    /// Sum of transferred amounts.
    pub total_amount: f64,
    /// Oldest transaction between the pair.
    pub first_transaction: DateTime<Utc>,
    /// Newest transaction between the pair.
    pub last_transaction: DateTime<Utc>,
}

impl RelationshipRow {
    /// Swap endpoints so `user_id` is `anchor`, when `anchor` is the related side.
    #[must_use]
    pub fn oriented_to(mut self, anchor: &str) -> Self {
        if self.user_id != anchor && self.related_user_id == anchor {
            std::mem::swap(&mut self.user_id, &mut self.related_user_id);
        }
        self
    }

    /// The endpoint that is not `id`, if `id` is one of the endpoints.
    #[must_use]
    pub fn counterpart(&self, id: &str) -> Option<&str> {
        if self.user_id == id {
            Some(&self.related_user_id)
        } else if self.related_user_id == id {
            Some(&self.user_id)
        } else {
            None
        }
    }
}

impl Pairwise for RelationshipRow {
    fn endpoints(&self) -> (&str, &str) {
        (&self.user_id, &self.related_user_id)
    }

    fn transaction_count(&self) -> u64 {
        self.transaction_count
    }
}

/// Scored relationship between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRelationship {
    /// Anchor account.
    pub user_id: String,
    /// Counterparty.
    pub related_user_id: String,
    /// Transaction count.
    pub transaction_count: u64,
    /// Sum of transferred amounts.
    pub total_amount: f64,
    /// Mean amount per transaction.
    pub avg_amount: f64,
    /// Oldest transaction.
    pub first_transaction: DateTime<Utc>,
    /// Newest transaction.
    pub last_transaction: DateTime<Utc>,
    /// Closeness score in `[0, 100]`.
    pub relationship_strength: u8,
}

impl UserRelationship {
    /// Score a raw row.
    pub fn from_row(row: RelationshipRow, weights: &StrengthWeights) -> Self {
        let relationship_strength = relationship_strength(
            row.transaction_count,
            row.total_amount,
            row.first_transaction,
            row.last_transaction,
            weights,
        );
        Self {
            avg_amount: ratio(row.total_amount, row.transaction_count as f64),
            user_id: row.user_id,
            related_user_id: row.related_user_id,
            transaction_count: row.transaction_count,
            total_amount: row.total_amount,
            first_transaction: row.first_transaction,
            last_transaction: row.last_transaction,
            relationship_strength,
        }
    }
}

impl Pairwise for UserRelationship {
    fn endpoints(&self) -> (&str, &str) {
        (&self.user_id, &self.related_user_id)
    }

    fn transaction_count(&self) -> u64 {
        self.transaction_count
    }
}

/// PageRank score for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRank {
    /// Account ID.
    pub user_id: String,
    /// Rank; all ranks of one graph sum to 1.
    pub rank: f64,
}

/// Community found by greedy local moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    /// Sequential ID within one analysis.
    pub community_id: usize,
    /// Member accounts, sorted.
    pub members: Vec<String>,
    /// Intra-community edge weight, each undirected edge counted once.
    pub internal_edges: u64,
    /// Edge weight leaving the community.
    pub external_edges: u64,
    /// Local density `internal / (internal + external)`.
    ///
    /// This is not the global modularity Q.
    pub modularity: f64,
    /// Suspicion score in `[0, 100]`.
    pub suspicion_score: u32,
    /// Human-readable reasons for the score.
    pub reasons: Vec<String>,
}

/// Closed chain of transactions among three or more accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclePattern {
    /// Accounts in traversal order, smallest ID first.
    pub cycle: Vec<String>,
    /// Amount summed over the cycle's links.
    pub total_amount: f64,
    /// Mean amount per link.
    pub avg_amount: f64,
    /// Transactions summed over the cycle's links.
    pub transaction_count: u64,
    /// Suspicion score in `[0, 100]`.
    pub suspicion_score: u32,
    /// Human-readable reasons for the score.
    pub reasons: Vec<String>,
}
