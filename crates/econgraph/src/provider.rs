//! Data provider boundary.
//!
//! The orchestrator reads every input through [`DataProvider`]. Failures are
//! typed [`ProviderError`]s and abort the analysis; an empty result is a
//! valid answer.

use async_trait::async_trait;
use econgraph_compliance::types::{ActiveMember, TransferAggregate};
use econgraph_core::error::ProviderError;
use econgraph_graph::types::RelationshipRow;

/// Source of relationship aggregates and guild activity.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Pairwise aggregates that involve `user_id`.
    async fn get_direct_relationships(
        &self,
        user_id: &str,
    ) -> Result<Vec<RelationshipRow>, ProviderError>;

    /// Aggregates with one endpoint among `user_id`'s direct connections and
    /// the other outside `exclude_ids`.
    async fn get_indirect_relationships(
        &self,
        user_id: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<RelationshipRow>, ProviderError>;

    /// Members used in `guild_id` at least `min_usage` times within
    /// `window_days`, busiest first, at most `limit`.
    async fn get_guild_active_members(
        &self,
        guild_id: &str,
        window_days: u32,
        min_usage: u64,
        limit: usize,
    ) -> Result<Vec<ActiveMember>, ProviderError>;

    /// Directional transfer aggregates among exactly `member_ids`.
    async fn get_member_transaction_matrix(
        &self,
        guild_id: &str,
        member_ids: &[String],
    ) -> Result<Vec<TransferAggregate>, ProviderError>;
}

