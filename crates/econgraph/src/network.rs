//! Relationship network analysis.
//!
//! [`NetworkAnalyzer`] fetches a target account's neighborhood through a
//! [`DataProvider`], then runs every kernel over it and assembles one
//! [`RelationshipNetwork`]:
//!
//! 1. direct relationships (top 50 by count), scored for strength
//! 2. indirect relationships through those partners (count >= 3, top 20)
//! 3. suspicious cluster rules over the direct relationships
//! 4. graph build, then PageRank, communities and circular flows
//! 5. guild correlation for the requested guilds
//! 6. network statistics
//!
//! Fetches are awaited on the caller's runtime; the CPU-bound stage runs on
//! the blocking pool. The whole analysis is bounded by the configured
//! timeout, and kernels poll the shared [`DeadlineContext`] so an abandoned
//! analysis stops computing.

use crate::provider::DataProvider;
use chrono::{DateTime, Utc};
use econgraph_compliance::{
    clusters::SuspiciousClusterDetector,
    guild::GuildCorrelationAnalyzer,
    types::{GuildCorrelation, GuildSample, SuspiciousCluster},
};
use econgraph_core::{
    config::{AnalysisConfig, DetectionThresholds},
    deadline::DeadlineContext,
    error::{AnalysisError, Result},
};
use econgraph_graph::{
    centrality::PageRank,
    community::LocalMoveCommunities,
    cycles::CycleDetector,
    graph::GraphBuilder,
    strength::RelationshipStrengthScorer,
    types::{Community, CyclePattern, NodeRank, RelationshipRow, UserRelationship},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Aggregate statistics of an analyzed network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Direct connections.
    pub total_connections: usize,
    /// Indirect connections.
    pub indirect_connections: usize,
    /// Transactions summed over direct connections.
    pub total_transactions: u64,
    /// Amount summed over direct connections.
    pub total_amount: f64,
    /// Mean strength of direct connections.
    pub avg_relationship_strength: f64,
    /// Nodes in the analyzed graph.
    pub graph_nodes: usize,
    /// Edges in the analyzed graph.
    pub graph_edges: usize,
}

/// Complete analysis result for one target account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipNetwork {
    /// Analyzed account.
    pub target_user_id: String,
    /// Reference time of the analysis.
    pub analyzed_at: DateTime<Utc>,
    /// Version of the threshold set used.
    pub thresholds_version: u32,
    /// 1-hop relationships, busiest first.
    pub direct_connections: Vec<UserRelationship>,
    /// 2-hop relationships, busiest first.
    pub indirect_connections: Vec<UserRelationship>,
    /// Scored communities, most suspicious first.
    pub communities: Vec<Community>,
    /// Scored circular flows, most suspicious first.
    pub cycle_patterns: Vec<CyclePattern>,
    /// Rule-based clusters around the target.
    pub suspicious_clusters: Vec<SuspiciousCluster>,
    /// Highest-ranked accounts by PageRank.
    pub key_nodes: Vec<NodeRank>,
    /// Guild correlations, most suspicious first.
    pub guild_correlations: Vec<GuildCorrelation>,
    /// Aggregate statistics.
    pub network_stats: NetworkStats,
}

/// Everything fetched for one analysis.
#[derive(Debug, Clone)]
struct Neighborhood {
    direct: Vec<RelationshipRow>,
    indirect: Vec<RelationshipRow>,
    guilds: Vec<GuildSample>,
}

/// Relationship network orchestrator.
#[derive(Clone)]
pub struct NetworkAnalyzer {
    provider: Arc<dyn DataProvider>,
    config: AnalysisConfig,
}

impl std::fmt::Debug for NetworkAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkAnalyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NetworkAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self::with_config(provider, AnalysisConfig::default())
    }

    /// Create an analyzer with an explicit configuration.
    pub fn with_config(provider: Arc<dyn DataProvider>, config: AnalysisConfig) -> Self {
        Self { provider, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `target` as of now.
    pub async fn analyze(
        &self,
        target: &str,
        top_guilds: Option<&[String]>,
    ) -> Result<RelationshipNetwork> {
        self.analyze_at(target, top_guilds, Utc::now()).await
    }

    /// Analyze `target` with an explicit reference time.
    pub async fn analyze_at(
        &self,
        target: &str,
        top_guilds: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<RelationshipNetwork> {
        let deadline = DeadlineContext::new(self.config.runtime.analysis_timeout());
        self.analyze_with_deadline(target, top_guilds, now, deadline)
            .await
    }

    /// Analyze `target` under a caller-owned deadline.
    ///
    /// Cancelling `deadline` from another task stops the analysis at the next
    /// kernel checkpoint with [`AnalysisError::Cancelled`].
    pub async fn analyze_with_deadline(
        &self,
        target: &str,
        top_guilds: Option<&[String]>,
        now: DateTime<Utc>,
        deadline: DeadlineContext,
    ) -> Result<RelationshipNetwork> {
        let budget = deadline.remaining();
        let work = self.run(target, top_guilds, now, deadline.clone());

        match tokio::time::timeout(budget, work).await {
            Ok(result) => result,
            Err(_elapsed) => {
                deadline.cancel();
                warn!(target_user = target, ?budget, "Relationship network analysis timed out");
                Err(AnalysisError::Timeout(budget))
            }
        }
    }

    async fn run(
        &self,
        target: &str,
        top_guilds: Option<&[String]>,
        now: DateTime<Utc>,
        deadline: DeadlineContext,
    ) -> Result<RelationshipNetwork> {
        if target.trim().is_empty() {
            return Err(AnalysisError::validation("target user ID must not be empty"));
        }

        let start = Instant::now();
        info!(target_user = target, "Starting relationship network analysis");

        let neighborhood = self.fetch(target, top_guilds, &deadline).await?;
        debug!(
            direct = neighborhood.direct.len(),
            indirect = neighborhood.indirect.len(),
            guilds = neighborhood.guilds.len(),
            "Neighborhood fetched"
        );

        let thresholds = self.config.thresholds.clone();
        let target_owned = target.to_string();
        let compute_deadline = deadline.clone();
        let compute = move || {
            Self::compute(&target_owned, neighborhood, &thresholds, now, &compute_deadline)
        };

        let network = if self.config.runtime.offload_compute {
            tokio::task::spawn_blocking(compute)
                .await
                .map_err(|e| AnalysisError::internal(format!("analysis worker failed: {}", e)))??
        } else {
            compute()?
        };

        info!(
            target_user = target,
            direct = network.network_stats.total_connections,
            communities = network.communities.len(),
            cycles = network.cycle_patterns.len(),
            clusters = network.suspicious_clusters.len(),
            guilds = network.guild_correlations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Relationship network analysis complete"
        );
        Ok(network)
    }

    async fn fetch(
        &self,
        target: &str,
        top_guilds: Option<&[String]>,
        deadline: &DeadlineContext,
    ) -> Result<Neighborhood> {
        let limits = &self.config.thresholds.network;

        let mut direct: Vec<RelationshipRow> = self
            .provider
            .get_direct_relationships(target)
            .await?
            .into_iter()
            .filter(|row| matches!(row.counterpart(target), Some(other) if other != target))
            .map(|row| row.oriented_to(target))
            .collect();
        direct.sort_by(|a, b| {
            b.transaction_count
                .cmp(&a.transaction_count)
                .then_with(|| a.related_user_id.cmp(&b.related_user_id))
        });
        direct.truncate(limits.direct_limit);
        deadline.check()?;

        let direct_ids: Vec<String> = direct.iter().map(|r| r.related_user_id.clone()).collect();
        let indirect = if direct_ids.is_empty() {
            Vec::new()
        } else {
            let mut exclude = direct_ids.clone();
            exclude.push(target.to_string());
            let rows = self
                .provider
                .get_indirect_relationships(target, &exclude)
                .await?;
            deadline.check()?;
            select_indirect(rows, target, &direct_ids, limits.indirect_min_count, limits.indirect_limit)
        };

        let mut guilds = Vec::new();
        if let Some(requested) = top_guilds {
            let rules = &self.config.thresholds.guild;
            for guild_id in requested.iter().take(rules.max_guilds) {
                deadline.check()?;
                let members = self
                    .provider
                    .get_guild_active_members(
                        guild_id,
                        rules.window_days,
                        rules.min_usage,
                        rules.member_limit,
                    )
                    .await?;
                if !GuildCorrelationAnalyzer::has_sufficient_sample(members.len(), rules) {
                    warn!(
                        guild_id = %guild_id,
                        members = members.len(),
                        "Skipping guild with insufficient active members"
                    );
                    continue;
                }
                let member_ids: Vec<String> = members.iter().map(|m| m.user_id.clone()).collect();
                let transfers = self
                    .provider
                    .get_member_transaction_matrix(guild_id, &member_ids)
                    .await?;
                guilds.push(GuildSample {
                    guild_id: guild_id.clone(),
                    members,
                    transfers,
                });
            }
        }

        Ok(Neighborhood {
            direct,
            indirect,
            guilds,
        })
    }

    fn compute(
        target: &str,
        neighborhood: Neighborhood,
        thresholds: &DetectionThresholds,
        now: DateTime<Utc>,
        deadline: &DeadlineContext,
    ) -> Result<RelationshipNetwork> {
        let scorer = RelationshipStrengthScorer::new(thresholds.strength.clone());
        let direct = scorer.score_all(neighborhood.direct);
        let indirect = scorer.score_all(neighborhood.indirect);

        let suspicious_clusters =
            SuspiciousClusterDetector::compute(target, &direct, &thresholds.clusters, now);

        let relationships: Vec<UserRelationship> =
            direct.iter().chain(indirect.iter()).cloned().collect();
        let graph = GraphBuilder::from_records(&relationships);
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Transaction graph built"
        );

        let ranks = PageRank::compute(&graph, &thresholds.pagerank, deadline)?;
        let key_nodes = ranks.top_k(thresholds.pagerank.key_node_limit);
        debug!(key_nodes = key_nodes.len(), "PageRank complete");

        let communities = LocalMoveCommunities::compute(&graph, &thresholds.community, deadline)?;
        debug!(communities = communities.len(), "Community detection complete");

        let cycle_patterns =
            CycleDetector::compute(&graph, &relationships, &thresholds.cycles, deadline)?;
        debug!(cycles = cycle_patterns.len(), "Circular flow detection complete");

        let guild_correlations =
            GuildCorrelationAnalyzer::compute_all(&neighborhood.guilds, &thresholds.guild, deadline)?;

        let network_stats = NetworkStats {
            total_connections: direct.len(),
            indirect_connections: indirect.len(),
            total_transactions: direct.iter().map(|r| r.transaction_count).sum(),
            total_amount: direct.iter().map(|r| r.total_amount).sum(),
            avg_relationship_strength: econgraph_core::ratio(
                direct.iter().map(|r| f64::from(r.relationship_strength)).sum(),
                direct.len() as f64,
            ),
            graph_nodes: graph.node_count(),
            graph_edges: graph.edge_count(),
        };

        Ok(RelationshipNetwork {
            target_user_id: target.to_string(),
            analyzed_at: now,
            thresholds_version: thresholds.version,
            direct_connections: direct,
            indirect_connections: indirect,
            communities,
            cycle_patterns,
            suspicious_clusters,
            key_nodes,
            guild_correlations,
            network_stats,
        })
    }
}

/// Keep 2-hop rows through a direct partner, busiest first.
///
/// Rows touching the target or joining two direct partners are dropped, as
/// are duplicate pairs after the first.
fn select_indirect(
    rows: Vec<RelationshipRow>,
    target: &str,
    direct_ids: &[String],
    min_count: u64,
    limit: usize,
) -> Vec<RelationshipRow> {
    let direct: HashSet<&str> = direct_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    let mut kept: Vec<RelationshipRow> = rows
        .into_iter()
        .filter(|row| row.transaction_count >= min_count)
        .filter_map(|row| {
            let (a, b) = (row.user_id.as_str(), row.related_user_id.as_str());
            if a == target || b == target || a == b {
                return None;
            }
            let anchor = match (direct.contains(a), direct.contains(b)) {
                (true, false) => a.to_string(),
                (false, true) => b.to_string(),
                _ => return None,
            };
            Some(row.oriented_to(&anchor))
        })
        .filter(|row| {
            let key = if row.user_id <= row.related_user_id {
                (row.user_id.clone(), row.related_user_id.clone())
            } else {
                (row.related_user_id.clone(), row.user_id.clone())
            };
            seen.insert(key)
        })
        .collect();

    kept.sort_by(|a, b| {
        b.transaction_count
            .cmp(&a.transaction_count)
            .then_with(|| a.user_id.cmp(&b.user_id))
            .then_with(|| a.related_user_id.cmp(&b.related_user_id))
    });
    kept.truncate(limit);
    kept
}
