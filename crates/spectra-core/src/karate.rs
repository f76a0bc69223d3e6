//! Zachary's Karate Club.
//!
//! 34 members, 78 friendships. The club split after a dispute between the
//! instructor (node 0, "Mr. Hi") and the administrator (node 33, "Officer");
//! `community` records which side each member joined.
//!
//! # Reference
//!
//! Zachary, "An Information Flow Model for Conflict and Fission in Small
//! Groups", Journal of Anthropological Research, 1977.

use crate::formats::{AttributeTable, EdgeList};
use crate::{Graph, Result};

const EDGES: &str = include_str!("../data/karate_edges.txt");
const ATTRIBUTES: &str = include_str!("../data/karate_attributes.csv");

/// Number of club members.
pub const NODES: usize = 34;
/// Number of friendships.
pub const EDGE_COUNT: usize = 78;
/// Node id of the administrator.
pub const ADMINISTRATOR: usize = 33;
/// Node id of the instructor.
pub const INSTRUCTOR: usize = 0;

/// Load the bundled Karate Club graph.
pub fn karate_club() -> Result<Graph> {
    let edges = EdgeList::from_str(EDGES)?;
    let attributes = AttributeTable::from_str(ATTRIBUTES)?;
    let graph = Graph::from_parts(&edges, attributes)?;
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded karate club"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Community, Role};
    use crate::split::seed_split;

    #[test]
    fn test_counts() {
        let g = karate_club().unwrap();
        assert_eq!(g.node_count(), NODES);
        assert_eq!(g.edge_count(), EDGE_COUNT);
        assert_eq!(g.degree(INSTRUCTOR), 16);
        assert_eq!(g.degree(ADMINISTRATOR), 17);
    }

    #[test]
    fn test_leaders() {
        let g = karate_club().unwrap();
        assert_eq!(g.nodes_with_role(Role::Administrator), vec![ADMINISTRATOR]);
        assert_eq!(g.nodes_with_role(Role::Instructor), vec![INSTRUCTOR]);
        assert_eq!(g.nodes_with_role(Role::Member).len(), NODES - 2);
    }

    #[test]
    fn test_factions_are_even() {
        let g = karate_club().unwrap();
        let admins = (0..NODES)
            .filter(|&n| g.attributes(n).unwrap().community == Community::Administrator)
            .count();
        assert_eq!(admins, 17);
    }

    #[test]
    fn test_leaders_two_hops_apart() {
        let g = karate_club().unwrap();
        assert_eq!(g.hop_distances(INSTRUCTOR).unwrap()[ADMINISTRATOR], Some(2));
    }

    #[test]
    fn test_seed_split() {
        let g = karate_club().unwrap();
        let split = seed_split(&g).unwrap();
        assert_eq!(split.train.indices(), vec![ADMINISTRATOR, INSTRUCTOR]);
        assert_eq!(split.train.labels(), vec![true, false]);
        assert_eq!(split.test.len(), NODES - 2);
    }
}
