//! Thresholded predictions and accuracy.

use crate::model::Gcn;
use crate::{Error, Result};
use candle_core::Tensor;
use spectra_core::LabeledSet;

/// Decision boundary on the classifier probability.
pub const THRESHOLD: f32 = 0.5;

/// `p >= 0.5` maps to `true`.
pub fn threshold(probs: &[f32]) -> Vec<bool> {
    probs.iter().map(|&p| p >= THRESHOLD).collect()
}

/// Binary labels for `nodes`, in the order given.
///
/// Runs one forward pass over all of `x`; parameters are not touched.
pub fn predict(model: &Gcn, x: &Tensor, nodes: &[usize]) -> Result<Vec<bool>> {
    let probs = model.probabilities(x)?;
    let selected = nodes
        .iter()
        .map(|&node| {
            probs.get(node).copied().ok_or(Error::NodeOutOfRange {
                node,
                nodes: probs.len(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(threshold(&selected))
}

/// Fraction of `predicted` matching the labels of `truth`, position by position.
///
/// Returns 0 for an empty set.
pub fn accuracy(predicted: &[bool], truth: &LabeledSet) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| **p == t.label)
        .count();
    correct as f64 / truth.len() as f64
}
