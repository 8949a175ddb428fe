//! Undirected transaction graph.
//!
//! Nodes live in an arena indexed by `NodeIndex`; account IDs are hashed
//! only while building. Every algorithm walks indices, so the hot paths never
//! touch the ID map. A graph is built per analysis and dropped with it.

use crate::types::Pairwise;
use std::collections::{BTreeMap, HashMap};

/// Index of a node in a [`TransactionGraph`].
pub type NodeIndex = usize;

/// Account node with its weighted adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Account ID.
    pub id: String,
    /// Neighbor index to edge weight (transaction count).
    pub connections: BTreeMap<NodeIndex, u64>,
}

/// Undirected weighted edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEdge {
    /// One endpoint.
    pub from: NodeIndex,
    /// Other endpoint.
    pub to: NodeIndex,
    /// Transaction count.
    pub weight: u64,
}

/// Undirected weighted graph over accounts.
///
/// Invariant: every edge appears in both endpoints' `connections` with the
/// same weight.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, NodeIndex>,
    edges: Vec<GraphEdge>,
}

impl TransactionGraph {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in index order.
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Account ID of a node.
    #[must_use]
    pub fn node_id(&self, node: NodeIndex) -> &str {
        &self.nodes[node].id
    }

    /// Index of an account, if present.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Neighbors of a node with edge weights, ordered by index.
    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, u64)> + '_ {
        self.nodes[node].connections.iter().map(|(&n, &w)| (n, w))
    }

    /// Size of a node's adjacency map.
    #[must_use]
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.nodes[node].connections.len()
    }

    /// Edge weight between two nodes.
    #[must_use]
    pub fn weight(&self, a: NodeIndex, b: NodeIndex) -> Option<u64> {
        self.nodes.get(a)?.connections.get(&b).copied()
    }

    /// Edge weight between two accounts.
    #[must_use]
    pub fn connection(&self, a: &str, b: &str) -> Option<u64> {
        self.weight(self.index_of(a)?, self.index_of(b)?)
    }
}

/// Builds a [`TransactionGraph`] from pairwise aggregates.
///
/// Duplicate pairs are last-write-wins; callers are expected to pre-aggregate.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: TransactionGraph,
    edge_slots: HashMap<(NodeIndex, NodeIndex), usize>,
}

impl GraphBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from any slice of pairwise rows.
    pub fn from_records<P: Pairwise>(records: &[P]) -> TransactionGraph {
        let mut builder = Self::new();
        builder.extend(records);
        builder.build()
    }

    /// Add every record.
    pub fn extend<P: Pairwise>(&mut self, records: &[P]) -> &mut Self {
        for record in records {
            let (a, b) = record.endpoints();
            self.add_edge(a, b, record.transaction_count());
        }
        self
    }

    /// Add or overwrite the edge between `a` and `b`.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: u64) -> &mut Self {
        let ia = self.ensure_node(a);
        let ib = self.ensure_node(b);

        self.graph.nodes[ia].connections.insert(ib, weight);
        self.graph.nodes[ib].connections.insert(ia, weight);

        let key = (ia.min(ib), ia.max(ib));
        match self.edge_slots.get(&key) {
            Some(&slot) => self.graph.edges[slot].weight = weight,
            None => {
                self.edge_slots.insert(key, self.graph.edges.len());
                self.graph.edges.push(GraphEdge {
                    from: ia,
                    to: ib,
                    weight,
                });
            }
        }
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> TransactionGraph {
        self.graph
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.graph.index.get(id) {
            return idx;
        }
        let idx = self.graph.nodes.len();
        self.graph.nodes.push(GraphNode {
            id: id.to_string(),
            connections: BTreeMap::new(),
        });
        self.graph.index.insert(id.to_string(), idx);
        idx
    }
}
