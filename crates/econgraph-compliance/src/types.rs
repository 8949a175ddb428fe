//! Compliance result and input types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Suspicious clusters
// ============================================================================

/// Rule that produced a suspicious cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    /// Several strong, high-count partners.
    HighFrequency,
    /// Large total and large average transfers.
    HighAmount,
    /// Several busy partners that only appeared recently.
    NewAccountBurst,
}

impl ClusterKind {
    /// Stable tag used in cluster IDs and serialized output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ClusterKind::HighFrequency => "high_frequency",
            ClusterKind::HighAmount => "high_amount",
            ClusterKind::NewAccountBurst => "new_account_burst",
        }
    }
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate activity of a cluster's qualifying relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPattern {
    /// Summed transaction count.
    pub total_transactions: u64,
    /// Summed amount.
    pub total_amount: f64,
    /// Days from the earliest first transaction to the latest last one.
    pub time_span_days: f64,
    /// Mean hours between transactions over the span.
    pub avg_interval_hours: f64,
}

/// Group of accounts flagged by one cluster rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousCluster {
    /// `<kind>:<target>`.
    pub cluster_id: String,
    /// Rule that fired.
    pub kind: ClusterKind,
    /// Target first, then qualifying partners.
    pub user_ids: Vec<String>,
    /// Fixed score of the rule.
    pub suspicion_score: u32,
    /// Human-readable reasons.
    pub reasons: Vec<String>,
    /// Aggregated activity.
    pub transaction_pattern: TransactionPattern,
}

// ============================================================================
// Guild correlation
// ============================================================================

/// Member active in a guild during the analysis window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMember {
    /// Account ID.
    pub user_id: String,
    /// Usage events in the window.
    pub usage_count: u64,
}

impl ActiveMember {
    /// Create an active member record.
    pub fn new(user_id: impl Into<String>, usage_count: u64) -> Self {
        Self {
            user_id: user_id.into(),
            usage_count,
        }
    }
}

/// Directional transfer aggregate between two guild members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferAggregate {
    /// Sender.
    pub from_user_id: String,
    /// Receiver.
    pub to_user_id: String,
    /// Transfers in this direction.
    pub transaction_count: u64,
    /// Amount moved in this direction.
    pub total_amount: f64,
}

impl TransferAggregate {
    /// Create a transfer aggregate.
    pub fn new(
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        transaction_count: u64,
        total_amount: f64,
    ) -> Self {
        Self {
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            transaction_count,
            total_amount,
        }
    }
}

/// Everything fetched for one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildSample {
    /// Guild ID.
    pub guild_id: String,
    /// Active members.
    pub members: Vec<ActiveMember>,
    /// Transfers among those members.
    pub transfers: Vec<TransferAggregate>,
}

/// Guild member flagged by the correlation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousMember {
    /// Account ID.
    pub user_id: String,
    /// Highest score among the rules that flagged the member.
    pub suspicion_score: u32,
    /// Human-readable reasons.
    pub reasons: Vec<String>,
    /// Transfers sent and received inside the guild.
    pub transaction_count: u64,
    /// Amount sent and received inside the guild.
    pub total_amount: f64,
    /// Received minus sent.
    pub net_flow: f64,
}

/// Guild-level transaction statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildStatistics {
    /// Transfers among sampled members.
    pub total_transactions: u64,
    /// Amount moved among sampled members.
    pub total_amount: f64,
    /// `total_transactions / member_count`.
    pub avg_transactions_per_member: f64,
    /// Members over the high-frequency threshold.
    pub high_frequency_members: usize,
    /// Balanced two-way pairs.
    pub circular_flow_pairs: usize,
}

/// Correlation result for one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildCorrelation {
    /// Guild ID.
    pub guild_id: String,
    /// Score in `[0, max_score]`.
    pub suspicion_score: u32,
    /// Sampled active members.
    pub member_count: usize,
    /// Flagged members, highest score first.
    pub suspicious_members: Vec<SuspiciousMember>,
    /// Guild-level findings.
    pub patterns: Vec<String>,
    /// Aggregate statistics.
    pub statistics: GuildStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_kind_serializes_as_tag() {
        let json = serde_json::to_string(&ClusterKind::NewAccountBurst).unwrap();
        assert_eq!(json, "\"new_account_burst\"");
        assert_eq!(ClusterKind::HighAmount.to_string(), "high_amount");
    }
}
