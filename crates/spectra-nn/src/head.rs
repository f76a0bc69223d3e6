//! Logistic classifier over node embeddings.
//!
//! ```text
//! y = sigmoid(X w^T + b)
//! ```

use crate::init::ParamInit;
use crate::Result;
use candle_core::{Tensor, Var};
use candle_nn::Module;

/// Affine map to one logit per node, followed by a sigmoid.
pub struct LogisticHead {
    /// `1 x in_features`
    weight: Var,
    /// `1 x 1`, broadcast over rows.
    bias: Var,
}

impl LogisticHead {
    pub fn new(in_features: usize, init: &mut ParamInit) -> Result<Self> {
        let weight = init.var(1, in_features)?;
        let bias = init.var(1, 1)?;
        Ok(Self { weight, bias })
    }

    pub fn from_parts(weight: Var, bias: Var) -> Self {
        Self { weight, bias }
    }

    pub fn in_features(&self) -> usize {
        self.weight.dims()[1]
    }

    /// Pre-sigmoid scores, `N x 1`.
    pub fn logits(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        x.matmul(&self.weight.t()?)?.broadcast_add(self.bias.as_tensor())
    }

    pub fn vars(&self) -> Vec<Var> {
        vec![self.weight.clone(), self.bias.clone()]
    }
}

impl Module for LogisticHead {
    /// Probabilities in `(0, 1)`, `N x 1`.
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        candle_nn::ops::sigmoid(&self.logits(x)?)
    }
}
