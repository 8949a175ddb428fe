//! PageRank influence ranking.
//!
//! Power iteration with a fixed iteration count instead of a convergence
//! threshold, so cost and output depend only on the input graph:
//!
//! `new[v] = (1 - d) / n + d * Σ rank[u] / degree(u)` over neighbors `u` of `v`
//!
//! Ranks are renormalized to sum to 1 after the last iteration. Self-loops
//! neither contribute rank nor count toward a node's degree.

use crate::graph::{GraphBuilder, TransactionGraph};
use crate::messages::{PageRankInput, PageRankOutput};
use crate::types::NodeRank;
use async_trait::async_trait;
use econgraph_core::{
    config::PageRankParams,
    deadline::DeadlineContext,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    traits::{AnalysisKernel, BatchKernel},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// PageRank scores for one graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRankResult {
    /// Scores in node-index order.
    pub scores: Vec<NodeRank>,
    /// Iterations performed.
    pub iterations: u32,
}

impl PageRankResult {
    /// Get the top-k nodes by rank; ties are broken by account ID.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<NodeRank> {
        let mut sorted = self.scores.clone();
        sorted.sort_by(|a, b| {
            b.rank
                .partial_cmp(&a.rank)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        sorted.truncate(k);
        sorted
    }

    /// Sum of all ranks.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.scores.iter().map(|s| s.rank).sum()
    }
}

/// PageRank centrality kernel.
#[derive(Debug, Clone)]
pub struct PageRank {
    metadata: KernelMetadata,
    params: PageRankParams,
}

impl Default for PageRank {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRank {
    /// Create a new PageRank kernel with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(PageRankParams::default())
    }

    /// Create a PageRank kernel with explicit parameters.
    #[must_use]
    pub fn with_params(params: PageRankParams) -> Self {
        Self {
            metadata: KernelMetadata::new("graph/pagerank", Domain::GraphAnalytics)
                .with_description("PageRank centrality via fixed-iteration power iteration")
                .with_complexity("O(iterations * edges)"),
            params,
        }
    }

    /// Configured parameters.
    #[must_use]
    pub fn params(&self) -> &PageRankParams {
        &self.params
    }

    /// Run PageRank over `graph`.
    ///
    /// The deadline is checked once per iteration.
    pub fn compute(
        graph: &TransactionGraph,
        params: &PageRankParams,
        deadline: &DeadlineContext,
    ) -> Result<PageRankResult> {
        let n = graph.node_count();
        if n == 0 {
            return Ok(PageRankResult::default());
        }

        let d = params.damping;
        let teleport = (1.0 - d) / n as f64;

        let out_degree: Vec<f64> = (0..n)
            .map(|u| graph.neighbors(u).filter(|&(v, _)| v != u).count() as f64)
            .collect();

        let mut scores = vec![1.0 / n as f64; n];
        let mut next = vec![0.0; n];

        for _ in 0..params.iterations {
            deadline.check()?;

            for (v, slot) in next.iter_mut().enumerate() {
                let mut rank_sum = 0.0f64;
                for (u, _) in graph.neighbors(v) {
                    if u == v || out_degree[u] == 0.0 {
                        continue;
                    }
                    rank_sum += scores[u] / out_degree[u];
                }
                *slot = teleport + d * rank_sum;
            }

            std::mem::swap(&mut scores, &mut next);
        }

        let total: f64 = scores.iter().sum();
        if total > 0.0 && total.is_finite() {
            for s in &mut scores {
                *s /= total;
            }
        }

        Ok(PageRankResult {
            scores: scores
                .into_iter()
                .enumerate()
                .map(|(i, rank)| NodeRank {
                    user_id: graph.node_id(i).to_string(),
                    rank,
                })
                .collect(),
            iterations: params.iterations,
        })
    }
}

impl AnalysisKernel for PageRank {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<PageRankInput, PageRankOutput> for PageRank {
    async fn execute(&self, input: PageRankInput) -> Result<PageRankOutput> {
        let start = Instant::now();
        let graph = GraphBuilder::from_records(&input.edges);
        let result = Self::compute(&graph, &self.params, &DeadlineContext::unbounded())?;
        Ok(PageRankOutput {
            result,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RelationshipAggregate;
    use econgraph_core::error::AnalysisError;
    use std::time::Duration;

    fn rank_of(result: &PageRankResult, id: &str) -> f64 {
        result
            .scores
            .iter()
            .find(|s| s.user_id == id)
            .map(|s| s.rank)
            .unwrap()
    }

    fn compute(edges: &[RelationshipAggregate]) -> PageRankResult {
        let graph = GraphBuilder::from_records(edges);
        PageRank::compute(&graph, &PageRankParams::default(), &DeadlineContext::unbounded())
            .unwrap()
    }

    #[test]
    fn test_pagerank_metadata() {
        let kernel = PageRank::new();
        assert_eq!(kernel.metadata().id, "graph/pagerank");
        assert_eq!(kernel.metadata().domain, Domain::GraphAnalytics);
        assert_eq!(kernel.params().iterations, 20);
    }

    #[test]
    fn test_empty_graph() {
        let result = compute(&[]);
        assert!(result.scores.is_empty());
    }

    #[test]
    fn test_triangle_ranks_equal() {
        let result = compute(&[
            RelationshipAggregate::new("a", "b", 5),
            RelationshipAggregate::new("b", "c", 5),
            RelationshipAggregate::new("c", "a", 5),
        ]);

        let a = rank_of(&result, "a");
        assert!((a - 1.0 / 3.0).abs() < 1e-9);
        assert!((rank_of(&result, "b") - a).abs() < 1e-12);
        assert!((rank_of(&result, "c") - a).abs() < 1e-12);
    }

    #[test]
    fn test_ranks_sum_to_one() {
        let result = compute(&[
            RelationshipAggregate::new("hub", "a", 1),
            RelationshipAggregate::new("hub", "b", 1),
            RelationshipAggregate::new("hub", "c", 1),
            RelationshipAggregate::new("c", "d", 1),
            RelationshipAggregate::new("e", "f", 1),
        ]);
        assert!((result.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hub_ranks_highest() {
        let result = compute(&[
            RelationshipAggregate::new("hub", "a", 1),
            RelationshipAggregate::new("hub", "b", 1),
            RelationshipAggregate::new("hub", "c", 1),
            RelationshipAggregate::new("hub", "d", 1),
        ]);
        let top = result.top_k(2);
        assert_eq!(top[0].user_id, "hub");
        // Leaves tie; the ID breaks it.
        assert_eq!(top[1].user_id, "a");
    }

    #[test]
    fn test_self_loop_does_not_amplify() {
        let with_loop = compute(&[
            RelationshipAggregate::new("a", "b", 1),
            RelationshipAggregate::new("b", "c", 1),
            RelationshipAggregate::new("a", "a", 100),
        ]);
        let without_loop = compute(&[
            RelationshipAggregate::new("a", "b", 1),
            RelationshipAggregate::new("b", "c", 1),
        ]);

        assert!((rank_of(&with_loop, "a") - rank_of(&without_loop, "a")).abs() < 1e-12);
        assert!((with_loop.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadline_checked_per_iteration() {
        let graph = GraphBuilder::from_records(&[RelationshipAggregate::new("a", "b", 1)]);
        let deadline = DeadlineContext::new(Duration::ZERO);
        let err = PageRank::compute(&graph, &PageRankParams::default(), &deadline).unwrap_err();
        assert!(matches!(err, AnalysisError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_batch_execute() {
        let kernel = PageRank::new();
        let output = kernel
            .execute(PageRankInput {
                edges: vec![
                    RelationshipAggregate::new("a", "b", 1),
                    RelationshipAggregate::new("b", "c", 1),
                ],
            })
            .await
            .unwrap();
        assert_eq!(output.result.scores.len(), 3);
        assert_eq!(output.result.top_k(1)[0].user_id, "b");
    }
}
