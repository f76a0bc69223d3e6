//! Undirected, node-attributed social graph.
//!
//! Nodes are identified by dense integer ids `0..N`. The graph is built once
//! from an edge list and an attribute table and never mutated afterwards.

use crate::{Error, Result};
use ndarray::Array2;
use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a member inside the club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Club administrator ("Officer").
    Administrator,
    /// Karate instructor ("Mr. Hi").
    Instructor,
    /// Everybody else.
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Administrator => write!(f, "Administrator"),
            Role::Instructor => write!(f, "Instructor"),
            Role::Member => write!(f, "Member"),
        }
    }
}

/// The faction a member joined after the club split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Community {
    Administrator,
    Instructor,
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Community::Administrator => write!(f, "Administrator"),
            Community::Instructor => write!(f, "Instructor"),
        }
    }
}

/// Per-node attributes from the attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub role: Role,
    pub community: Community,
}

/// Undirected, unweighted graph over nodes `0..N`.
///
/// Uses petgraph's undirected graph internally; node id `i` is always
/// `NodeIndex::new(i)`.
#[derive(Debug, Clone)]
pub struct Graph {
    graph: UnGraph<NodeAttributes, ()>,
}

impl Graph {
    /// Build a graph from an edge list and a dense attribute table.
    ///
    /// `attributes[i]` describes node `i`, so the node count is
    /// `attributes.len()`. Duplicate edges collapse into one; self-loops and
    /// endpoints outside `0..N` are rejected.
    pub fn from_parts(edges: &[(usize, usize)], attributes: Vec<NodeAttributes>) -> Result<Self> {
        let n = attributes.len();
        let mut graph = UnGraph::with_capacity(n, edges.len());
        for attrs in attributes {
            graph.add_node(attrs);
        }

        for &(u, v) in edges {
            if u >= n || v >= n {
                return Err(Error::malformed(format!(
                    "edge ({u}, {v}) references a node outside the attribute table (0..{n})"
                )));
            }
            if u == v {
                return Err(Error::malformed(format!("self-loop on node {u}")));
            }
            graph.update_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }

        Ok(Self { graph })
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Attributes of `node`, or `None` if out of range.
    pub fn attributes(&self, node: usize) -> Option<&NodeAttributes> {
        self.graph.node_weight(NodeIndex::new(node))
    }

    /// Neighbors of `node` in ascending id order.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        if node >= self.node_count() {
            return Vec::new();
        }
        let mut out: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(node))
            .map(|idx| idx.index())
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of neighbors of `node` (0 if out of range).
    pub fn degree(&self, node: usize) -> usize {
        if node >= self.node_count() {
            return 0;
        }
        self.graph.neighbors(NodeIndex::new(node)).count()
    }

    /// All nodes carrying `role`, ascending.
    pub fn nodes_with_role(&self, role: Role) -> Vec<usize> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].role == role)
            .map(|idx| idx.index())
            .collect()
    }

    /// Edges as `(u, v)` pairs with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            (a.min(b), a.max(b))
        })
    }

    /// Dense symmetric {0, 1} adjacency matrix with zero diagonal.
    pub fn adjacency(&self) -> Array2<f32> {
        let n = self.node_count();
        let mut adj = Array2::zeros((n, n));
        for (u, v) in self.edges() {
            adj[[u, v]] = 1.0;
            adj[[v, u]] = 1.0;
        }
        adj
    }

    /// Hop distance from `from` to every node; `None` where unreachable.
    pub fn hop_distances(&self, from: usize) -> Result<Vec<Option<usize>>> {
        let n = self.node_count();
        if from >= n {
            return Err(Error::malformed(format!("node {from} is not in the graph (0..{n})")));
        }
        let dist = dijkstra(&self.graph, NodeIndex::new(from), None, |_| 1usize);
        Ok((0..n).map(|i| dist.get(&NodeIndex::new(i)).copied()).collect())
    }
}
