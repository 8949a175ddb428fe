//! Circular flow detection.
//!
//! Enumerates closed chains of 3 to `max_cycle_length` accounts by bounded
//! depth-first search from every node. Closing back to the start is only
//! accepted once the path holds at least three nodes, so a plain two-way
//! relationship never registers as a cycle.
//!
//! Found cycles are rotated so the lexicographically smallest account ID
//! comes first and deduplicated on that sequence. Rotation is the only
//! normalization: a cycle and its reverse traversal are reported separately.
//!
//! Worst-case cost is exponential in the branching factor, bounded by
//! `max_cycle_length`; the deadline is checked on every DFS branch.

use crate::graph::{GraphBuilder, NodeIndex, TransactionGraph};
use crate::messages::{CycleInput, CycleOutput};
use crate::types::{CyclePattern, UserRelationship};
use async_trait::async_trait;
use econgraph_core::{
    config::CycleRules,
    deadline::DeadlineContext,
    domain::Domain,
    error::Result,
    kernel::KernelMetadata,
    ratio,
    traits::{AnalysisKernel, BatchKernel},
};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Fixed-size set of node indices backed by a bit vector.
#[derive(Debug, Clone)]
struct VisitedSet {
    words: Vec<u64>,
}

impl VisitedSet {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    fn insert(&mut self, idx: usize) {
        self.words[idx / 64] |= 1 << (idx % 64);
    }

    fn remove(&mut self, idx: usize) {
        self.words[idx / 64] &= !(1 << (idx % 64));
    }

    fn contains(&self, idx: usize) -> bool {
        self.words[idx / 64] & (1 << (idx % 64)) != 0
    }
}

/// DFS state reused across every start node of one search.
struct CycleSearch<'g> {
    graph: &'g TransactionGraph,
    max_len: usize,
    deadline: &'g DeadlineContext,
    path: Vec<NodeIndex>,
    on_path: VisitedSet,
    seen: HashSet<Vec<NodeIndex>>,
    found: Vec<Vec<NodeIndex>>,
}

impl<'g> CycleSearch<'g> {
    fn new(graph: &'g TransactionGraph, max_len: usize, deadline: &'g DeadlineContext) -> Self {
        Self {
            graph,
            max_len,
            deadline,
            path: Vec::with_capacity(max_len),
            on_path: VisitedSet::new(graph.node_count()),
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Vec<NodeIndex>>> {
        for start in 0..self.graph.node_count() {
            self.path.push(start);
            self.on_path.insert(start);
            self.extend(start, start)?;
            self.on_path.remove(start);
            self.path.pop();
        }
        Ok(self.found)
    }

    fn extend(&mut self, start: NodeIndex, current: NodeIndex) -> Result<()> {
        self.deadline.check()?;
        let graph = self.graph;

        for (next, _) in graph.neighbors(current) {
            if next == start && self.path.len() >= 3 {
                self.record();
                continue;
            }
            if self.on_path.contains(next) || self.path.len() >= self.max_len {
                continue;
            }
            self.path.push(next);
            self.on_path.insert(next);
            self.extend(start, next)?;
            self.on_path.remove(next);
            self.path.pop();
        }
        Ok(())
    }

    fn record(&mut self) {
        let graph = self.graph;
        let pivot = (0..self.path.len())
            .min_by(|&a, &b| graph.node_id(self.path[a]).cmp(graph.node_id(self.path[b])))
            .unwrap_or(0);

        let mut canonical = Vec::with_capacity(self.path.len());
        canonical.extend_from_slice(&self.path[pivot..]);
        canonical.extend_from_slice(&self.path[..pivot]);

        if self.seen.insert(canonical.clone()) {
            self.found.push(canonical);
        }
    }
}

/// Link totals looked up for consecutive cycle members, in either direction.
#[derive(Debug, Default)]
struct LinkLedger<'a> {
    links: HashMap<(&'a str, &'a str), (u64, f64)>,
}

impl<'a> LinkLedger<'a> {
    fn new(relationships: &'a [UserRelationship]) -> Self {
        let mut links = HashMap::with_capacity(relationships.len());
        for rel in relationships {
            let a = rel.user_id.as_str();
            let b = rel.related_user_id.as_str();
            let key = if a <= b { (a, b) } else { (b, a) };
            links.insert(key, (rel.transaction_count, rel.total_amount));
        }
        Self { links }
    }

    fn get(&self, a: &str, b: &str) -> (u64, f64) {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.links.get(&key).copied().unwrap_or((0, 0.0))
    }
}

/// Circular transaction chain detection kernel.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    metadata: KernelMetadata,
    rules: CycleRules,
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleDetector {
    /// Create a detector with default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(CycleRules::default())
    }

    /// Create a detector with explicit rules.
    #[must_use]
    pub fn with_rules(rules: CycleRules) -> Self {
        Self {
            metadata: KernelMetadata::new("graph/circular-flow", Domain::GraphAnalytics)
                .with_description("Bounded-depth DFS enumeration of circular transaction chains")
                .with_complexity("O(branching ^ max_cycle_length)"),
            rules,
        }
    }

    /// Enumerate distinct cycles as rotation-canonical node index sequences.
    pub fn enumerate(
        graph: &TransactionGraph,
        max_cycle_length: usize,
        deadline: &DeadlineContext,
    ) -> Result<Vec<Vec<NodeIndex>>> {
        if graph.node_count() < 3 || max_cycle_length < 3 {
            return Ok(Vec::new());
        }
        CycleSearch::new(graph, max_cycle_length, deadline).run()
    }

    /// Detect, score and rank circular flows.
    ///
    /// `relationships` supplies amounts and counts for each link; the graph
    /// is expected to be built from the same list.
    pub fn compute(
        graph: &TransactionGraph,
        relationships: &[UserRelationship],
        rules: &CycleRules,
        deadline: &DeadlineContext,
    ) -> Result<Vec<CyclePattern>> {
        let cycles = Self::enumerate(graph, rules.max_cycle_length, deadline)?;
        let ledger = LinkLedger::new(relationships);

        let mut patterns: Vec<CyclePattern> = cycles
            .iter()
            .map(|cycle| {
                let ids: Vec<String> = cycle.iter().map(|&n| graph.node_id(n).to_string()).collect();
                Self::score(ids, &ledger, rules)
            })
            .collect();

        tracing::debug!(found = patterns.len(), "Circular flows enumerated");

        patterns.sort_by(|a, b| b.suspicion_score.cmp(&a.suspicion_score));
        patterns.truncate(rules.max_results);
        Ok(patterns)
    }

    fn score(cycle: Vec<String>, ledger: &LinkLedger<'_>, rules: &CycleRules) -> CyclePattern {
        let len = cycle.len();
        let mut total_amount = 0.0;
        let mut transaction_count = 0u64;
        for i in 0..len {
            let (count, amount) = ledger.get(&cycle[i], &cycle[(i + 1) % len]);
            transaction_count += count;
            total_amount += amount;
        }

        let (base, shape) = match len {
            3 => (rules.triangle_score, "Triangular"),
            4 => (rules.square_score, "Four-account"),
            _ => (rules.long_cycle_score, "Extended"),
        };
        let mut score = base;
        let mut reasons = vec![format!("{} circular flow through {} accounts", shape, len)];

        if total_amount > rules.high_amount {
            score += rules.high_amount_score;
            reasons.push(format!("High circulating volume: {:.0}", total_amount));
        }
        if transaction_count > rules.high_count {
            score += rules.high_count_score;
            reasons.push(format!("High transfer frequency: {} transactions", transaction_count));
        }

        CyclePattern {
            avg_amount: ratio(total_amount, len as f64),
            cycle,
            total_amount,
            transaction_count,
            suspicion_score: score.min(100),
            reasons,
        }
    }
}

impl AnalysisKernel for CycleDetector {
    fn metadata(&self) -> &KernelMetadata {
        &self.metadata
    }
}

#[async_trait]
impl BatchKernel<CycleInput, CycleOutput> for CycleDetector {
    async fn execute(&self, input: CycleInput) -> Result<CycleOutput> {
        let start = Instant::now();
        let graph = GraphBuilder::from_records(&input.relationships);
        let cycles = Self::compute(
            &graph,
            &input.relationships,
            &self.rules,
            &DeadlineContext::unbounded(),
        )?;
        Ok(CycleOutput {
            cycles,
            compute_time_us: start.elapsed().as_micros() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use econgraph_core::error::AnalysisError;
    use std::time::Duration;

    fn rel(a: &str, b: &str, count: u64, amount: f64) -> UserRelationship {
        let now = Utc::now();
        UserRelationship {
            user_id: a.into(),
            related_user_id: b.into(),
            transaction_count: count,
            total_amount: amount,
            avg_amount: ratio(amount, count as f64),
            first_transaction: now,
            last_transaction: now,
            relationship_strength: 0,
        }
    }

    fn detect(rels: &[UserRelationship]) -> Vec<CyclePattern> {
        let graph = GraphBuilder::from_records(rels);
        CycleDetector::compute(&graph, rels, &CycleRules::default(), &DeadlineContext::unbounded())
            .unwrap()
    }

    #[test]
    fn test_metadata() {
        assert_eq!(CycleDetector::new().metadata().id, "graph/circular-flow");
    }

    #[test]
    fn test_visited_set() {
        let mut set = VisitedSet::new(130);
        set.insert(0);
        set.insert(129);
        assert!(set.contains(0) && set.contains(129));
        assert!(!set.contains(64));
        set.remove(129);
        assert!(!set.contains(129));
    }

    #[test]
    fn test_triangle_base_score() {
        let cycles = detect(&[
            rel("A", "B", 10, 5_000.0),
            rel("B", "C", 10, 5_000.0),
            rel("C", "A", 10, 5_000.0),
        ]);

        assert!(!cycles.is_empty());
        for c in &cycles {
            assert_eq!(c.cycle.len(), 3);
            assert_eq!(c.cycle[0], "A");
            assert_eq!(c.suspicion_score, 40);
            assert_eq!(c.transaction_count, 30);
            assert!((c.total_amount - 15_000.0).abs() < f64::EPSILON);
            assert!((c.avg_amount - 5_000.0).abs() < f64::EPSILON);
            assert_eq!(c.reasons.len(), 1);
        }
    }

    #[test]
    fn test_reverse_direction_kept_separately() {
        let cycles = detect(&[
            rel("A", "B", 10, 5_000.0),
            rel("B", "C", 10, 5_000.0),
            rel("C", "A", 10, 5_000.0),
        ]);

        let mut sequences: Vec<Vec<String>> = cycles.iter().map(|c| c.cycle.clone()).collect();
        sequences.sort();
        assert_eq!(
            sequences,
            vec![vec!["A", "B", "C"], vec!["A", "C", "B"]]
                .into_iter()
                .map(|v| v.into_iter().map(String::from).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_two_node_exchange_is_not_a_cycle() {
        assert!(detect(&[rel("A", "B", 500, 9_000_000.0)]).is_empty());
    }

    #[test]
    fn test_path_is_not_a_cycle() {
        assert!(detect(&[rel("A", "B", 1, 1.0), rel("B", "C", 1, 1.0), rel("C", "D", 1, 1.0)])
            .is_empty());
    }

    #[test]
    fn test_square_with_bonuses() {
        let cycles = detect(&[
            rel("w", "x", 20, 40_000.0),
            rel("x", "y", 20, 40_000.0),
            rel("y", "z", 20, 40_000.0),
            rel("z", "w", 20, 40_000.0),
        ]);
        assert_eq!(cycles.len(), 2);
        // 35 base + 30 amount (160k) + 30 count (80), capped at 100.
        assert_eq!(cycles[0].suspicion_score, 95);
        assert_eq!(cycles[0].reasons.len(), 3);
    }

    #[test]
    fn test_duplicate_pair_last_row_wins() {
        let rels = [
            rel("A", "B", 10, 5_000.0),
            rel("B", "C", 10, 5_000.0),
            rel("C", "A", 10, 5_000.0),
            rel("B", "A", 40, 200_000.0),
        ];
        let graph = GraphBuilder::from_records(&rels);
        let a = graph.index_of("A").unwrap();
        let b = graph.index_of("B").unwrap();
        assert_eq!(graph.weight(a, b), Some(40));

        let cycles = detect(&rels);
        assert_eq!(cycles.len(), 2);
        for c in &cycles {
            assert_eq!(c.transaction_count, 60);
            assert!((c.total_amount - 210_000.0).abs() < f64::EPSILON);
            assert_eq!(c.suspicion_score, 100);
        }
    }

    #[test]
    fn test_cycle_length_bound() {
        let ring: Vec<UserRelationship> = (0..6)
            .map(|i| rel(&format!("n{}", i), &format!("n{}", (i + 1) % 6), 1, 1.0))
            .collect();
        assert!(detect(&ring).is_empty());

        let graph = GraphBuilder::from_records(&ring);
        let rules = CycleRules {
            max_cycle_length: 6,
            ..CycleRules::default()
        };
        let found =
            CycleDetector::compute(&graph, &ring, &rules, &DeadlineContext::unbounded()).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].suspicion_score, 30);
    }

    #[test]
    fn test_results_capped_and_sorted() {
        // K5 holds many 3-, 4- and 5-cycles.
        let ids = ["a", "b", "c", "d", "e"];
        let mut rels = Vec::new();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                rels.push(rel(a, b, 1, 1.0));
            }
        }
        let cycles = detect(&rels);
        assert_eq!(cycles.len(), 10);
        assert!(cycles.iter().all(|c| c.suspicion_score == 40));
        assert!(cycles.windows(2).all(|w| w[0].suspicion_score >= w[1].suspicion_score));
    }

    #[test]
    fn test_deadline_aborts_search() {
        let rels = [rel("A", "B", 1, 1.0), rel("B", "C", 1, 1.0), rel("C", "A", 1, 1.0)];
        let graph = GraphBuilder::from_records(&rels);
        let deadline = DeadlineContext::new(Duration::ZERO);
        let err = CycleDetector::compute(&graph, &rels, &CycleRules::default(), &deadline)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_batch_execute() {
        let output = CycleDetector::new()
            .execute(CycleInput {
                relationships: vec![
                    rel("A", "B", 10, 5_000.0),
                    rel("B", "C", 10, 5_000.0),
                    rel("C", "A", 10, 5_000.0),
                ],
            })
            .await
            .unwrap();
        assert_eq!(output.cycles.len(), 2);
    }
}
