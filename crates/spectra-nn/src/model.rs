//! Model assembly: feature stack chained into the logistic head.

use crate::activation::Activation;
use crate::conv::{operator_tensor, FeatureStack};
use crate::head::LogisticHead;
use crate::init::ParamInit;
use crate::{Error, Result};
use candle_core::{Device, Tensor, Var};
use candle_nn::Module;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use spectra_core::PropagationOperator;

/// Width and nonlinearity of one hidden layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
}

impl LayerSpec {
    pub fn new(units: usize, activation: Activation) -> Self {
        Self { units, activation }
    }
}

/// Model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Hidden layers, input side first.
    pub layers: Vec<LayerSpec>,
    /// Parameters start uniform in `[-init_scale, init_scale]`.
    pub init_scale: f32,
    /// Seed for parameter initialization.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            layers: vec![
                LayerSpec::new(4, Activation::Tanh),
                LayerSpec::new(2, Activation::Tanh),
            ],
            init_scale: 1.0,
            seed: 42,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig("at least one hidden layer is required".into()));
        }
        if let Some(i) = self.layers.iter().position(|l| l.units == 0) {
            return Err(Error::InvalidConfig(format!("layer {i} has zero units")));
        }
        if !(self.init_scale.is_finite() && self.init_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "init_scale must be positive, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}

/// Two-stage node classifier: spectral feature stack, then logistic head.
///
/// Parameters live in candle [`Var`]s shared with the optimizer; only the
/// trainer updates them.
pub struct Gcn {
    stack: FeatureStack,
    head: LogisticHead,
}

impl Gcn {
    /// Build a model over `operator` for inputs with `in_features` columns.
    pub fn new(
        operator: &PropagationOperator,
        in_features: usize,
        config: &ModelConfig,
        device: &Device,
    ) -> Result<Self> {
        config.validate()?;
        if in_features == 0 {
            return Err(Error::shape("at least one input feature", "0"));
        }
        let mut init = ParamInit::new(config.seed, config.init_scale, device)?;
        let adj = operator_tensor(operator, device)?;
        let stack = FeatureStack::new(adj, in_features, &config.layers, &mut init)?;
        let head = LogisticHead::new(stack.out_features(), &mut init)?;
        Ok(Self { stack, head })
    }

    pub fn stack(&self) -> &FeatureStack {
        &self.stack
    }

    pub fn head(&self) -> &LogisticHead {
        &self.head
    }

    pub fn nodes(&self) -> usize {
        self.stack.nodes()
    }

    pub fn in_features(&self) -> usize {
        self.stack.in_features()
    }

    pub fn embedding_dim(&self) -> usize {
        self.stack.out_features()
    }

    pub fn device(&self) -> &Device {
        self.stack.operator().device()
    }

    /// Every trainable parameter: layer weights, then head weight and bias.
    pub fn vars(&self) -> Vec<Var> {
        let mut vars = self.stack.vars();
        vars.extend(self.head.vars());
        vars
    }

    /// Fail unless `x` is `nodes x in_features`.
    pub fn check_features(&self, x: &Tensor) -> Result<()> {
        let (rows, cols) = x.dims2()?;
        if rows != self.nodes() || cols != self.in_features() {
            return Err(Error::shape(
                format!("{} x {} features", self.nodes(), self.in_features()),
                format!("{rows} x {cols}"),
            ));
        }
        Ok(())
    }

    /// Feature-stack output, `N x embedding_dim`.
    pub fn embed(&self, x: &Tensor) -> Result<Tensor> {
        self.check_features(x)?;
        Ok(self.stack.forward(x)?)
    }

    /// Head logits, `N x 1`.
    pub fn logits(&self, x: &Tensor) -> Result<Tensor> {
        let h = self.embed(x)?;
        Ok(self.head.logits(&h)?)
    }

    /// Per-node probabilities in node order.
    pub fn probabilities(&self, x: &Tensor) -> Result<Vec<f32>> {
        self.check_features(x)?;
        Ok(self.forward(x)?.flatten_all()?.to_vec1::<f32>()?)
    }
}

impl Module for Gcn {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        self.head.forward(&self.stack.forward(x)?)
    }
}

/// Upload a dense feature matrix.
pub fn feature_tensor(features: &Array2<f32>, device: &Device) -> Result<Tensor> {
    let values: Vec<f32> = features.iter().copied().collect();
    Ok(Tensor::from_vec(values, features.dim(), device)?)
}
