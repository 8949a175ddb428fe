//! Community detection.
//!
//! A single-level greedy local-move pass, NOT multi-level Louvain: there is
//! no graph aggregation step and no global modularity objective, so results
//! are locally dense groups rather than a modularity-optimal partition.
//!
//! Every node starts in its own community. On each pass a node may move to a
//! neighboring community when
//!
//! `gain = w(node, candidate) - w(node, rest of current community)`
//!
//! is strictly positive. The largest gain wins; equal gains prefer the
//! candidate whose members are, on average, more strongly tied to the node,
//! then the lower community label. Passes stop after `max_passes` or when
//! nothing moved.
//!
//! Reported `modularity` is the local density ratio
//! `internal / (internal + external)`, not the canonical modularity Q.

use crate::graph::{GraphBuilder, NodeIndex, TransactionGraph};
use crate::messages::{CommunityInput, CommunityOutput};
use crate::types::Community;
use async_trait::async_trait;
use econgraph_core::{
    config::CommunityRules,
    deadline::DeadlineContext,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ratio,
    traits::{AnalysisKernel, BatchKernel},
};
use std::collections::BTreeMap;
use std::time::Instant;

/// Greedy local-move community detection kernel.
#[derive(Debug, Clone)]
pub struct LocalMoveCommunities {
    metadata: KernelMetadata,
    rules: CommunityRules,
}

impl Default for LocalMoveCommunities {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalMoveCommunities {
    /// Create a kernel with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(CommunityRules::default())
    }

    /// Create a kernel with explicit rules.
    #[must_use]
    pub fn with_rules(rules: CommunityRules) -> Self {
        Self {
            metadata: KernelMetadata::new("graph/local-move-communities", Domain::GraphAnalytics)
                .with_description("Single-level greedy local-move communities with suspicion scoring")
                .with_complexity("O(passes * edges)"),
            rules,
        }
    }

    /// Assign every node a community label.
    ///
    /// Labels are node indices of the community's founding node. The
    /// deadline is checked once per pass.
    pub fn assign(
        graph: &TransactionGraph,
        max_passes: u32,
        deadline: &DeadlineContext,
    ) -> Result<Vec<usize>> {
        let n = graph.node_count();
        let mut labels: Vec<usize> = (0..n).collect();
        let mut sizes = vec![1usize; n];

        for pass in 0..max_passes {
            deadline.check()?;
            let mut moved = 0usize;

            for node in 0..n {
                let current = labels[node];

                let mut ties: BTreeMap<usize, u64> = BTreeMap::new();
                for (neighbor, weight) in graph.neighbors(node) {
                    if neighbor == node {
                        continue;
                    }
                    *ties.entry(labels[neighbor]).or_insert(0) += weight;
                }

                let leaving = ties.get(&current).copied().unwrap_or(0) as f64;

                // (label, gain, affinity)
                let mut best: Option<(usize, f64, f64)> = None;
                for (&label, &weight) in &ties {
                    if label == current {
                        continue;
                    }
                    let gain = weight as f64 - leaving;
                    if gain <= 0.0 {
                        continue;
                    }
                    let affinity = ratio(weight as f64, sizes[label] as f64);
                    let better = match best {
                        None => true,
                        Some((_, best_gain, best_affinity)) => {
                            gain > best_gain || (gain == best_gain && affinity > best_affinity)
                        }
                    };
                    if better {
                        best = Some((label, gain, affinity));
                    }
                }

                if let Some((label, _, _)) = best {
                    sizes[current] -= 1;
                    sizes[label] += 1;
                    labels[node] = label;
                    moved += 1;
                }
            }

            tracing::trace!(pass, moved, "Community local-move pass");
            if moved == 0 {
                break;
            }
        }

        Ok(labels)
    }

    /// Detect and score communities.
    ///
    /// Groups smaller than `min_size` are dropped. Output is sorted by
    /// descending suspicion score.
    pub fn compute(
        graph: &TransactionGraph,
        rules: &CommunityRules,
        deadline: &DeadlineContext,
    ) -> Result<Vec<Community>> {
        let labels = Self::assign(graph, rules.max_passes, deadline)?;

        let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        for (node, &label) in labels.iter().enumerate() {
            groups.entry(label).or_default().push(node);
        }

        let mut communities: Vec<Community> = groups
            .into_values()
            .filter(|members| members.len() >= rules.min_size)
            .enumerate()
            .map(|(community_id, members)| {
                Self::score_group(graph, &labels, community_id, &members, rules)
            })
            .collect();

        communities.sort_by(|a, b| b.suspicion_score.cmp(&a.suspicion_score));
        Ok(communities)
    }

    fn score_group(
        graph: &TransactionGraph,
        labels: &[usize],
        community_id: usize,
        members: &[NodeIndex],
        rules: &CommunityRules,
    ) -> Community {
        let label = labels[members[0]];
        let mut internal_twice = 0u64;
        let mut external = 0u64;

        for &node in members {
            for (neighbor, weight) in graph.neighbors(node) {
                if neighbor == node {
                    continue;
                }
                if labels[neighbor] == label {
                    internal_twice += weight;
                } else {
                    external += weight;
                }
            }
        }

        let internal = internal_twice / 2;
        let total = (internal + external) as f64;
        let modularity = ratio(internal as f64, total);
        let external_share = ratio(external as f64, total);
        let size = members.len();

        let mut score = 0u32;
        let mut reasons = Vec::new();

        if modularity > rules.high_density_ratio && size >= rules.high_density_min_size {
            score += rules.high_density_score;
            reasons.push(format!(
                "Closed group: {:.0}% of transaction weight stays inside",
                modularity * 100.0
            ));
        }
        if (rules.small_group_min..=rules.small_group_max).contains(&size) {
            score += rules.small_group_score;
            reasons.push(format!("Group size {} matches a coordinated-account pattern", size));
        }
        let per_member = ratio(internal as f64, size as f64);
        if per_member > rules.heavy_internal_per_member {
            score += rules.heavy_internal_score;
            reasons.push(format!(
                "Heavy internal trading: {:.1} internal transactions per member",
                per_member
            ));
        }
        if external_share < rules.isolation_ratio {
            score += rules.isolation_score;
            reasons.push(format!(
                "Isolated from the wider economy: {:.0}% external weight",
                external_share * 100.0
            ));
        }

        let mut ids: Vec<String> = members
            .iter()
            .map(|&m| graph.node_id(m).to_string())
            .collect();
        ids.sort();

        Community {
            community_id,
            members: ids,
            internal_edges: internal,
            external_edges: external,
            modularity,
            suspicion_score: score.min(100),
            reasons,
        }
    }
}

impl AnalysisKernel for LocalMoveCommunities {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<CommunityInput, CommunityOutput> for LocalMoveCommunities {
    async fn execute(&self, input: CommunityInput) -> Result<CommunityOutput> {
        let start = Instant::now();
        let graph = GraphBuilder::from_records(&input.edges);
        let communities = Self::compute(&graph, &self.rules, &DeadlineContext::unbounded())?;
        Ok(CommunityOutput {
            communities,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationshipAggregate;

    fn clique(members: &[&str], weight: u64) -> Vec<RelationshipAggregate> {
        let mut edges = Vec::new();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                edges.push(RelationshipAggregate::new(*a, *b, weight));
            }
        }
        edges
    }

    fn two_cliques(cross_weight: u64) -> TransactionGraph {
        let mut edges = clique(&["a1", "a2", "a3", "a4"], 10);
        edges.extend(clique(&["b1", "b2", "b3", "b4"], 10));
        edges.push(RelationshipAggregate::new("a4", "b1", cross_weight));
        GraphBuilder::from_records(&edges)
    }

    fn detect(graph: &TransactionGraph) -> Vec<Community> {
        LocalMoveCommunities::compute(graph, &CommunityRules::default(), &DeadlineContext::unbounded())
            .unwrap()
    }

    #[test]
    fn test_metadata() {
        let kernel = LocalMoveCommunities::new();
        assert_eq!(kernel.metadata().id, "graph/local-move-communities");
    }

    #[test]
    fn test_two_cliques_split() {
        let communities = detect(&two_cliques(1));

        assert_eq!(communities.len(), 2);
        let mut member_sets: Vec<Vec<String>> =
            communities.iter().map(|c| c.members.clone()).collect();
        member_sets.sort();
        assert_eq!(member_sets[0], vec!["a1", "a2", "a3", "a4"]);
        assert_eq!(member_sets[1], vec!["b1", "b2", "b3", "b4"]);
    }

    #[test]
    fn test_two_cliques_split_with_equal_weights() {
        let mut edges = clique(&["a1", "a2", "a3", "a4"], 1);
        edges.extend(clique(&["b1", "b2", "b3", "b4"], 1));
        edges.push(RelationshipAggregate::new("a4", "b1", 1));
        let communities = detect(&GraphBuilder::from_records(&edges));

        assert_eq!(communities.len(), 2);
        for c in &communities {
            assert_eq!(c.members.len(), 4);
            let prefix = &c.members[0][..1];
            assert!(c.members.iter().all(|m| m.starts_with(prefix)));
        }
    }

    #[test]
    fn test_clique_statistics_and_score() {
        let communities = detect(&two_cliques(1));
        let a = communities
            .iter()
            .find(|c| c.members.contains(&"a1".to_string()))
            .unwrap();

        // 6 internal edges of weight 10, one bridge of weight 1.
        assert_eq!(a.internal_edges, 60);
        assert_eq!(a.external_edges, 1);
        assert!((a.modularity - 60.0 / 61.0).abs() < 1e-12);
        // dense (+30), size band (+20), isolated (+25); 15 per member is not heavy.
        assert_eq!(a.suspicion_score, 75);
        assert_eq!(a.reasons.len(), 3);
    }

    #[test]
    fn test_heavy_internal_trading_bonus() {
        let graph = GraphBuilder::from_records(&clique(&["x", "y", "z"], 50));
        let communities = detect(&graph);
        assert_eq!(communities.len(), 1);
        // internal 150 over 3 members = 50 > 20, no external edges.
        assert_eq!(communities[0].suspicion_score, 100);
    }

    #[test]
    fn test_pair_scores_only_isolation() {
        let graph = GraphBuilder::from_records(&[RelationshipAggregate::new("p", "q", 5)]);
        let communities = detect(&graph);
        assert_eq!(communities.len(), 1);
        assert_eq!(communities[0].members, vec!["p", "q"]);
        assert_eq!(communities[0].suspicion_score, 25);
    }

    #[test]
    fn test_isolated_nodes_produce_no_community() {
        let graph = GraphBuilder::from_records(&[RelationshipAggregate::new("solo", "solo", 3)]);
        assert!(detect(&graph).is_empty());
        assert!(detect(&TransactionGraph::default()).is_empty());
    }

    #[test]
    fn test_sorted_by_score() {
        let mut edges = clique(&["x", "y", "z"], 50);
        edges.push(RelationshipAggregate::new("p", "q", 1));
        let communities = detect(&GraphBuilder::from_records(&edges));
        assert!(communities
            .windows(2)
            .all(|w| w[0].suspicion_score >= w[1].suspicion_score));
    }
}
