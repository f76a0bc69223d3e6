//! Graph substrate for spectral GCN node classification.
//!
//! `spectra-core` owns everything that happens before a tensor exists:
//! parsing the edge list and attribute table, the [`Graph`] entity, the
//! symmetric-normalized [`PropagationOperator`], node feature matrices and
//! the labeled seed/test split.
//!
//! # Example
//!
//! ```rust
//! use spectra_core::{karate, FeatureSet, PropagationOperator};
//!
//! let graph = karate::karate_club().unwrap();
//! let op = PropagationOperator::from_adjacency(&graph.adjacency()).unwrap();
//! let x = FeatureSet::LandmarkDistances.build(&graph).unwrap();
//!
//! assert_eq!(op.len(), 34);
//! assert_eq!(x.dim(), (34, 36));
//! ```

#![allow(clippy::should_implement_trait)]

pub mod error;
pub mod features;
pub mod formats;
pub mod graph;
pub mod karate;
pub mod normalize;
pub mod split;

pub use error::{Error, Result};
pub use features::FeatureSet;
pub use graph::{Community, Graph, NodeAttributes, Role};
pub use normalize::{self_loop_degrees, PropagationOperator};
pub use split::{seed_nodes, seed_split, LabeledNode, LabeledSet, Split};
