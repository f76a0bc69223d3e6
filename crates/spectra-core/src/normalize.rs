//! Symmetric normalization of the adjacency matrix.
//!
//! Produces the propagation operator used by every spectral convolution:
//!
//! ```text
//! A_hat = D^{-1/2} (A + I) D^{-1/2},   D_ii = sum_j (A + I)_ij
//! ```
//!
//! Adding the self-loop before measuring degree guarantees `D_ii >= 1`, so
//! the inverse square root is always defined.
//!
//! # Reference
//!
//! Kipf & Welling, "Semi-Supervised Classification with Graph Convolutional
//! Networks", ICLR 2017.

use crate::{Error, Result};
use ndarray::{Array1, Array2, Axis};

/// Frozen `N x N` propagation operator `A_hat`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationOperator {
    matrix: Array2<f32>,
}

impl PropagationOperator {
    /// Normalize a symmetric, zero-diagonal, non-negative adjacency matrix.
    pub fn from_adjacency(adjacency: &Array2<f32>) -> Result<Self> {
        let degrees = self_loop_degrees(adjacency)?;
        let inv_sqrt = degrees.mapv(|d| d.sqrt().recip());
        let n = adjacency.nrows();

        let matrix = Array2::from_shape_fn((n, n), |(i, j)| {
            let a = if i == j { 1.0 } else { adjacency[[i, j]] };
            inv_sqrt[i] * a * inv_sqrt[j]
        });

        Ok(Self { matrix })
    }

    /// Number of nodes the operator mixes over.
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.matrix
    }

    /// Row-major copy of the entries.
    pub fn to_vec(&self) -> Vec<f32> {
        self.matrix.iter().copied().collect()
    }
}

/// Diagonal of `D`, the degree matrix of `A + I`.
///
/// Validates that `adjacency` is square, symmetric, non-negative and has a
/// zero diagonal.
pub fn self_loop_degrees(adjacency: &Array2<f32>) -> Result<Array1<f32>> {
    let (rows, cols) = adjacency.dim();
    if rows != cols {
        return Err(Error::ShapeMismatch {
            expected: format!("square adjacency ({rows} x {rows})"),
            got: format!("{rows} x {cols}"),
        });
    }

    for i in 0..rows {
        if adjacency[[i, i]] != 0.0 {
            return Err(Error::malformed(format!(
                "adjacency has a non-zero diagonal entry at node {i}"
            )));
        }
        for j in (i + 1)..cols {
            let (a, b) = (adjacency[[i, j]], adjacency[[j, i]]);
            if a != b {
                return Err(Error::malformed(format!(
                    "adjacency is not symmetric at ({i}, {j}): {a} vs {b}"
                )));
            }
            if a < 0.0 || !a.is_finite() {
                return Err(Error::malformed(format!(
                    "adjacency entry ({i}, {j}) = {a} is not a non-negative weight"
                )));
            }
        }
    }

    Ok(adjacency.sum_axis(Axis(1)).mapv(|d| d + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_isolated_node_maps_to_identity() {
        let adj = Array2::<f32>::zeros((3, 3));
        let op = PropagationOperator::from_adjacency(&adj).unwrap();
        assert_eq!(op.as_array(), &Array2::<f32>::eye(3));
    }

    #[test]
    fn test_single_edge() {
        let adj = array![[0.0, 1.0], [1.0, 0.0]];
        let op = PropagationOperator::from_adjacency(&adj).unwrap();
        // Both degrees are 2, so every entry is 1/2.
        for v in op.as_array().iter() {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_star_graph_entries() {
        // Center 0 connected to 1, 2, 3.
        let mut adj = Array2::<f32>::zeros((4, 4));
        for leaf in 1..4 {
            adj[[0, leaf]] = 1.0;
            adj[[leaf, 0]] = 1.0;
        }
        let degrees = self_loop_degrees(&adj).unwrap();
        assert_eq!(degrees.to_vec(), vec![4.0, 2.0, 2.0, 2.0]);

        let op = PropagationOperator::from_adjacency(&adj).unwrap();
        let m = op.as_array();
        assert!((m[[0, 0]] - 0.25).abs() < 1e-6);
        assert!((m[[1, 1]] - 0.5).abs() < 1e-6);
        assert!((m[[0, 1]] - 1.0 / 8f32.sqrt()).abs() < 1e-6);
        assert_eq!(m[[1, 2]], 0.0);
    }

    #[test]
    fn test_rejects_non_square() {
        let adj = Array2::<f32>::zeros((2, 3));
        assert!(matches!(
            PropagationOperator::from_adjacency(&adj),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_asymmetric() {
        let adj = array![[0.0, 1.0], [0.0, 0.0]];
        assert!(matches!(
            PropagationOperator::from_adjacency(&adj),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_rejects_self_loop() {
        let adj = array![[1.0, 0.0], [0.0, 0.0]];
        assert!(PropagationOperator::from_adjacency(&adj).is_err());
    }
}
