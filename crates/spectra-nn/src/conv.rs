//! Spectral graph convolution.
//!
//! Implements the propagation rule of Kipf & Welling:
//!
//! ```text
//! H' = sigma(A_hat H W),   A_hat = D^{-1/2} (A + I) D^{-1/2}
//! ```
//!
//! Aggregation is one dense multiply by the frozen operator `A_hat`: every
//! node's new representation is a fixed linear combination of all nodes'
//! current representations. Only `W` is trainable.
//!
//! # Reference
//!
//! Kipf & Welling, "Semi-Supervised Classification with Graph Convolutional
//! Networks", ICLR 2017.

use crate::activation::Activation;
use crate::init::ParamInit;
use crate::model::LayerSpec;
use crate::{Error, Result};
use candle_core::{Device, Tensor, Var};
use candle_nn::Module;
use spectra_core::PropagationOperator;

/// Upload a propagation operator as an `N x N` tensor.
pub fn operator_tensor(op: &PropagationOperator, device: &Device) -> Result<Tensor> {
    let n = op.len();
    Ok(Tensor::from_vec(op.to_vec(), (n, n), device)?)
}

/// One spectral convolution layer.
///
/// Holds a read-only handle on the shared operator and its own weight.
pub struct SpectralConv {
    operator: Tensor,
    weight: Var,
    activation: Activation,
}

impl SpectralConv {
    /// Create a layer with a freshly initialized weight.
    ///
    /// # Arguments
    /// - `operator`: Normalized adjacency `A_hat` (N x N), self-loops included
    /// - `in_features`: Input feature dimension
    /// - `out_features`: Output feature dimension
    /// - `activation`: Nonlinearity applied after the projection
    /// - `init`: Seeded parameter source
    pub fn new(
        operator: Tensor,
        in_features: usize,
        out_features: usize,
        activation: Activation,
        init: &mut ParamInit,
    ) -> Result<Self> {
        let weight = init.var(in_features, out_features)?;
        Self::from_weight(operator, weight, activation)
    }

    /// Wrap an existing weight.
    pub fn from_weight(operator: Tensor, weight: Var, activation: Activation) -> Result<Self> {
        let (n, m) = operator.dims2()?;
        if n != m {
            return Err(Error::shape("square operator", format!("{n} x {m}")));
        }
        weight.dims2()?;
        Ok(Self {
            operator,
            weight,
            activation,
        })
    }

    pub fn in_features(&self) -> usize {
        self.weight.dims()[0]
    }

    pub fn out_features(&self) -> usize {
        self.weight.dims()[1]
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weight(&self) -> &Var {
        &self.weight
    }
}

impl Module for SpectralConv {
    /// `(N x in) -> (N x out)`.
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // Neighborhood aggregation: A_hat * X
        let aggregate = self.operator.matmul(x)?;
        // Projection: (A_hat X) * W
        let h = aggregate.matmul(self.weight.as_tensor())?;
        self.activation.apply(&h)
    }
}

/// Ordered stack of spectral convolutions sharing one operator.
pub struct FeatureStack {
    operator: Tensor,
    layers: Vec<SpectralConv>,
}

impl FeatureStack {
    /// Build layers for `specs`, threading each layer's width into the next.
    pub fn new(
        operator: Tensor,
        in_features: usize,
        specs: &[LayerSpec],
        init: &mut ParamInit,
    ) -> Result<Self> {
        if specs.is_empty() {
            return Err(Error::InvalidConfig("feature stack needs at least one layer".into()));
        }
        let mut layers = Vec::with_capacity(specs.len());
        let mut width = in_features;
        for spec in specs {
            layers.push(SpectralConv::new(
                operator.clone(),
                width,
                spec.units,
                spec.activation,
                init,
            )?);
            width = spec.units;
        }
        Ok(Self { operator, layers })
    }

    pub fn layers(&self) -> &[SpectralConv] {
        &self.layers
    }

    pub fn operator(&self) -> &Tensor {
        &self.operator
    }

    /// Number of nodes the operator covers.
    pub fn nodes(&self) -> usize {
        self.operator.dims()[0]
    }

    pub fn in_features(&self) -> usize {
        self.layers.first().map_or(0, SpectralConv::in_features)
    }

    /// Width of the final embedding.
    pub fn out_features(&self) -> usize {
        self.layers.last().map_or(0, SpectralConv::out_features)
    }

    /// Trainable weights, first layer first.
    pub fn vars(&self) -> Vec<Var> {
        self.layers.iter().map(|l| l.weight.clone()).collect()
    }
}

impl Module for FeatureStack {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for layer in &self.layers {
            h = layer.forward(&h)?;
        }
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;

    fn specs() -> Vec<LayerSpec> {
        vec![
            LayerSpec::new(4, Activation::Tanh),
            LayerSpec::new(2, Activation::Tanh),
        ]
    }

    #[test]
    fn test_spectral_conv_forward_shape() {
        let device = Device::Cpu;
        let mut init = ParamInit::new(0, 1.0, &device).unwrap();
        let adj = Tensor::eye(10, DType::F32, &device).unwrap();
        let conv = SpectralConv::new(adj, 6, 3, Activation::Relu, &mut init).unwrap();

        let x = Tensor::ones((10, 6), DType::F32, &device).unwrap();
        let out = conv.forward(&x).unwrap();
        assert_eq!(out.dims(), &[10, 3]);
    }

    #[test]
    fn test_spectral_conv_matches_formula() {
        let device = Device::Cpu;
        // Two nodes, one edge: A_hat is all 0.5.
        let adj = Tensor::new(&[[0.5f32, 0.5], [0.5, 0.5]], &device).unwrap();
        let w = Var::from_tensor(&Tensor::new(&[[2f32], [-1.0]], &device).unwrap()).unwrap();
        let conv = SpectralConv::from_weight(adj, w, Activation::Identity).unwrap();

        let x = Tensor::new(&[[1f32, 0.0], [0.0, 1.0]], &device).unwrap();
        let out = conv.forward(&x).unwrap().to_vec2::<f32>().unwrap();
        // A_hat X = 0.5 * ones; times W = 0.5 * (2 - 1) = 0.5
        assert_eq!(out, vec![vec![0.5], vec![0.5]]);
    }

    #[test]
    fn test_rejects_rectangular_operator() {
        let device = Device::Cpu;
        let mut init = ParamInit::new(0, 1.0, &device).unwrap();
        let adj = Tensor::zeros((3, 4), DType::F32, &device).unwrap();
        assert!(SpectralConv::new(adj, 2, 2, Activation::Tanh, &mut init).is_err());
    }

    #[test]
    fn test_stack_threads_widths() {
        let device = Device::Cpu;
        let mut init = ParamInit::new(0, 1.0, &device).unwrap();
        let adj = Tensor::eye(5, DType::F32, &device).unwrap();
        let stack = FeatureStack::new(adj, 7, &specs(), &mut init).unwrap();

        assert_eq!(stack.in_features(), 7);
        assert_eq!(stack.out_features(), 2);
        assert_eq!(stack.layers()[1].in_features(), 4);
        assert_eq!(stack.vars().len(), 2);

        let x = Tensor::ones((5, 7), DType::F32, &device).unwrap();
        assert_eq!(stack.forward(&x).unwrap().dims(), &[5, 2]);
    }

    #[test]
    fn test_stack_rejects_empty_spec() {
        let device = Device::Cpu;
        let mut init = ParamInit::new(0, 1.0, &device).unwrap();
        let adj = Tensor::eye(3, DType::F32, &device).unwrap();
        assert!(matches!(
            FeatureStack::new(adj, 3, &[], &mut init),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tanh_output_bounded() {
        let device = Device::Cpu;
        let mut init = ParamInit::new(3, 1.0, &device).unwrap();
        let adj = Tensor::eye(4, DType::F32, &device).unwrap();
        let stack = FeatureStack::new(adj, 4, &specs(), &mut init).unwrap();
        let x = (Tensor::ones((4, 4), DType::F32, &device).unwrap() * 100.0).unwrap();
        let out = stack.forward(&x).unwrap().flatten_all().unwrap();
        for v in out.to_vec1::<f32>().unwrap() {
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}
