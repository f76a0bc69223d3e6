//! Labeled node sets for semi-supervised training.
//!
//! Only the two faction leaders carry a training label. Every other member
//! is held out and scored against the community it eventually joined.

use crate::graph::{Community, Graph, Role};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A node with its binary label (`true` = Administrator community).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledNode {
    pub node: usize,
    pub label: bool,
}

/// Ordered sequence of labeled nodes. Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSet {
    nodes: Vec<LabeledNode>,
}

impl LabeledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: usize, label: bool) {
        self.nodes.push(LabeledNode { node, label });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledNode> {
        self.nodes.iter()
    }

    /// Node ids in order.
    pub fn indices(&self) -> Vec<usize> {
        self.nodes.iter().map(|n| n.node).collect()
    }

    /// Labels in order.
    pub fn labels(&self) -> Vec<bool> {
        self.nodes.iter().map(|n| n.label).collect()
    }
}

impl FromIterator<(usize, bool)> for LabeledSet {
    fn from_iter<I: IntoIterator<Item = (usize, bool)>>(iter: I) -> Self {
        Self {
            nodes: iter
                .into_iter()
                .map(|(node, label)| LabeledNode { node, label })
                .collect(),
        }
    }
}

/// Disjoint train/test partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: LabeledSet,
    pub test: LabeledSet,
}

/// The two faction leaders: `(administrator, instructor)`.
///
/// When a role is held by several nodes the lowest id wins.
pub fn seed_nodes(graph: &Graph) -> Result<(usize, usize)> {
    let first = |role: Role| {
        graph
            .nodes_with_role(role)
            .first()
            .copied()
            .ok_or_else(|| Error::malformed(format!("no node has role {role}")))
    };
    Ok((first(Role::Administrator)?, first(Role::Instructor)?))
}

/// Train on `[administrator, instructor]`, test on every member.
pub fn seed_split(graph: &Graph) -> Result<Split> {
    let (admin, instructor) = seed_nodes(graph)?;
    let label = |node: usize| {
        graph
            .attributes(node)
            .map(|a| a.community == Community::Administrator)
            .unwrap_or(false)
    };

    let train = [admin, instructor].into_iter().map(|n| (n, label(n))).collect();
    let test = graph
        .nodes_with_role(Role::Member)
        .into_iter()
        .map(|n| (n, label(n)))
        .collect();

    Ok(Split { train, test })
}
