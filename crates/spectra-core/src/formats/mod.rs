//! Input formats for the social graph.
//!
//! A graph arrives as two files:
//! - an edge list (`u v` per line, see [`EdgeList`])
//! - an attribute table (`node,role,community` CSV, see [`AttributeTable`])

mod attributes;
mod edgelist;

pub use attributes::AttributeTable;
pub use edgelist::EdgeList;

use crate::{Graph, Result};
use std::fs::File;
use std::path::Path;

/// Load a graph from an edge-list file and an attribute-table file.
pub fn load_graph(edges: impl AsRef<Path>, attributes: impl AsRef<Path>) -> Result<Graph> {
    let edges = EdgeList::read(File::open(edges.as_ref())?)?;
    let attributes = AttributeTable::read(File::open(attributes.as_ref())?)?;
    Graph::from_parts(&edges, attributes)
}
