//! Batch input and output types for the compliance kernels.

use crate::types::{GuildCorrelation, GuildSample, SuspiciousCluster};
use chrono::{DateTime, Utc};
use econgraph_graph::types::UserRelationship;
use serde::{Deserialize, Serialize};

/// Input for a suspicious cluster batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterInput {
    /// Account the relationships belong to.
    pub target_user_id: String,
    /// Scored direct relationships of the target.
    pub relationships: Vec<UserRelationship>,
    /// Reference time for the new-account rule.
    pub as_of: DateTime<Utc>,
}

/// Output of a suspicious cluster batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterOutput {
    /// Clusters in rule order.
    pub clusters: Vec<SuspiciousCluster>,
    /// Compute time in microseconds.
    pub compute_time_us: u64,
}

/// Input for a guild correlation batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildInput {
    /// One sample per guild.
    pub samples: Vec<GuildSample>,
}

/// Output of a guild correlation batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildOutput {
    /// Analyzed guilds, most suspicious first.
    pub correlations: Vec<GuildCorrelation>,
    /// Compute time in microseconds.
    pub compute_time_us: u64,
}
