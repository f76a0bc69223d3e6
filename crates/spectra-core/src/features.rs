//! Per-node input feature matrices.
//!
//! Two feature sets are supported:
//!
//! | Set | Columns | Shape |
//! |-----|---------|-------|
//! | [`FeatureSet::Identity`] | one-hot node id | `N x N` |
//! | [`FeatureSet::LandmarkDistances`] | one-hot id, hops to administrator, hops to instructor | `N x (N + 2)` |

use crate::split::seed_nodes;
use crate::{Error, Graph, Result};
use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which input features to feed the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FeatureSet {
    /// Identity matrix only.
    #[default]
    #[serde(rename = "identity")]
    Identity,
    /// Identity plus hop distance to each faction leader.
    #[serde(rename = "distances")]
    LandmarkDistances,
}

impl FeatureSet {
    /// Build the feature matrix for `graph`.
    pub fn build(self, graph: &Graph) -> Result<Array2<f32>> {
        match self {
            FeatureSet::Identity => Ok(identity(graph.node_count())),
            FeatureSet::LandmarkDistances => {
                let (admin, instructor) = seed_nodes(graph)?;
                with_landmark_distances(graph, &[admin, instructor])
            }
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSet::Identity => write!(f, "identity"),
            FeatureSet::LandmarkDistances => write!(f, "distances"),
        }
    }
}

impl FromStr for FeatureSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "identity" => Ok(FeatureSet::Identity),
            "distances" => Ok(FeatureSet::LandmarkDistances),
            other => Err(Error::InvalidConfig(format!(
                "unknown feature set {other:?} (expected identity or distances)"
            ))),
        }
    }
}

/// `N x N` identity features.
pub fn identity(n: usize) -> Array2<f32> {
    Array2::eye(n)
}

/// Identity features followed by one hop-distance column per landmark.
///
/// Fails if any node cannot reach a landmark.
pub fn with_landmark_distances(graph: &Graph, landmarks: &[usize]) -> Result<Array2<f32>> {
    let n = graph.node_count();
    let mut dist = Array2::<f32>::zeros((n, landmarks.len()));

    for (col, &landmark) in landmarks.iter().enumerate() {
        for (node, hops) in graph.hop_distances(landmark)?.into_iter().enumerate() {
            let hops = hops.ok_or_else(|| {
                Error::malformed(format!("node {node} cannot reach landmark {landmark}"))
            })?;
            dist[[node, col]] = hops as f32;
        }
    }

    concatenate(Axis(1), &[identity(n).view(), dist.view()]).map_err(|e| Error::ShapeMismatch {
        expected: format!("{n} rows"),
        got: e.to_string(),
    })
}
