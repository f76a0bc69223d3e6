//! Per-example training loop.
//!
//! Each epoch walks the labeled seeds in insertion order. For every seed it
//! runs a full forward pass over all nodes, picks that node's logit, scores
//! it with binary cross-entropy and takes one optimizer step. There is one
//! parameter update per labeled example, never per batch, and no early
//! stopping: the loop always runs the configured number of epochs.
//!
//! After each epoch the feature-stack output over every node is recorded,
//! giving the trajectory of the learned embedding.

use crate::model::Gcn;
use crate::optim::{ParamsSgd, SgdMomentum};
use crate::{Error, Result};
use candle_core::{Tensor, TensorId};
use candle_nn::Optimizer;
use serde::{Deserialize, Serialize};
use spectra_core::LabeledSet;
use tracing::{debug, info};

/// Binary cross-entropy on a logit, averaged over elements.
///
/// Uses `max(z, 0) - z * y + ln(1 + exp(-|z|))`, which stays finite when the
/// sigmoid saturates to exactly 0 or 1 in `f32`.
pub fn bce_with_logits(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let softplus = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    logits
        .relu()?
        .sub(&logits.mul(targets)?)?
        .add(&softplus)?
        .mean_all()
}

/// Training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Full passes over the labeled seeds.
    pub epochs: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    /// Report interval in epochs. `None` means `epochs / 10` (at least 1).
    pub report_every: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 250,
            learning_rate: 0.001,
            momentum: 1.0,
            report_every: None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.momentum.is_finite() && self.momentum >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "momentum must be non-negative, got {}",
                self.momentum
            )));
        }
        if self.report_every == Some(0) {
            return Err(Error::InvalidConfig("report_every must be at least 1".into()));
        }
        Ok(())
    }

    /// Effective report interval.
    pub fn report_interval(&self) -> usize {
        self.report_every.unwrap_or(self.epochs / 10).max(1)
    }

    pub fn sgd_params(&self) -> ParamsSgd {
        ParamsSgd {
            lr: self.learning_rate,
            momentum: self.momentum,
        }
    }
}

/// Checkpoint report: cumulative loss and raw seed predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: f32,
    /// Probability for each seed, in seed order, as seen during the epoch.
    pub predictions: Vec<f32>,
}

/// Passed to the per-epoch observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub epochs: usize,
    pub loss: f32,
}

/// Everything recorded during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Cumulative loss of each epoch.
    pub epoch_losses: Vec<f32>,
    /// Checkpoint reports, every `report_interval` epochs.
    pub reports: Vec<EpochReport>,
    /// Feature-stack output after each epoch, `N x embedding_dim`.
    pub embeddings: Vec<Vec<Vec<f32>>>,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }
}

/// Drives per-example updates of a [`Gcn`].
///
/// A trainer is bound to the model it was built for: its optimizer holds
/// that model's parameters, and [`fit`](Self::fit) refuses any other model.
/// Generic over the optimizer; [`SgdMomentum`] by default.
pub struct Trainer<O: Optimizer = SgdMomentum> {
    config: TrainConfig,
    optimizer: O,
    params: Vec<TensorId>,
}

fn param_ids(model: &Gcn) -> Vec<TensorId> {
    model.vars().iter().map(|v| v.id()).collect()
}

impl Trainer<SgdMomentum> {
    /// Trainer with momentum SGD over every parameter of `model`.
    pub fn new(model: &Gcn, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let optimizer = SgdMomentum::new(model.vars(), config.sgd_params())?;
        Ok(Self {
            config,
            optimizer,
            params: param_ids(model),
        })
    }
}

impl<O: Optimizer> Trainer<O> {
    /// Trainer with a caller-built optimizer over the parameters of `model`.
    pub fn with_optimizer(model: &Gcn, config: TrainConfig, optimizer: O) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            optimizer,
            params: param_ids(model),
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Train `model` on `seeds` over the full feature matrix `x`.
    ///
    /// Parameters are updated in place through their `Var`s.
    pub fn fit(&mut self, model: &Gcn, x: &Tensor, seeds: &LabeledSet) -> Result<TrainingHistory> {
        self.fit_with(model, x, seeds, |_| {})
    }

    /// Like [`fit`](Self::fit), calling `on_epoch` after every epoch.
    ///
    /// # Arguments
    /// - `model`: The model this trainer was built for
    /// - `x`: Full feature matrix (N x in_features)
    /// - `seeds`: Labeled nodes, visited in order every epoch
    /// - `on_epoch`: Observer, called once per epoch after its last update
    ///
    /// # Returns
    /// - Per-epoch losses, checkpoint reports and embedding snapshots
    pub fn fit_with<F>(
        &mut self,
        model: &Gcn,
        x: &Tensor,
        seeds: &LabeledSet,
        mut on_epoch: F,
    ) -> Result<TrainingHistory>
    where
        F: FnMut(&EpochSummary),
    {
        if param_ids(model) != self.params {
            return Err(Error::InvalidConfig(
                "model parameters do not belong to this trainer".into(),
            ));
        }
        model.check_features(x)?;
        let nodes = model.nodes();
        if let Some(bad) = seeds.iter().find(|s| s.node >= nodes) {
            return Err(Error::NodeOutOfRange {
                node: bad.node,
                nodes,
            });
        }

        // Targets are fixed for the whole run.
        let device = model.device().clone();
        let targets = seeds
            .iter()
            .map(|s| Tensor::new(&[[if s.label { 1f32 } else { 0f32 }]], &device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let epochs = self.config.epochs;
        let interval = self.config.report_interval();
        let mut history = TrainingHistory {
            epoch_losses: Vec::with_capacity(epochs),
            reports: Vec::with_capacity(epochs / interval + 1),
            embeddings: Vec::with_capacity(epochs),
        };

        info!(
            epochs,
            seeds = seeds.len(),
            lr = self.config.learning_rate,
            momentum = self.config.momentum,
            "training started"
        );

        for epoch in 0..epochs {
            let mut cum_loss = 0f32;
            let mut predictions = Vec::with_capacity(seeds.len());

            for (seed, target) in seeds.iter().zip(&targets) {
                let logit = model.logits(x)?.narrow(0, seed.node, 1)?;
                let loss = bce_with_logits(&logit, target)?;
                self.optimizer.backward_step(&loss)?;

                cum_loss += loss.to_scalar::<f32>()?;
                let prob = candle_nn::ops::sigmoid(&logit)?.reshape(())?.to_scalar::<f32>()?;
                predictions.push(prob);
            }

            history.embeddings.push(model.embed(x)?.to_vec2::<f32>()?);
            history.epoch_losses.push(cum_loss);
            debug!(epoch, loss = cum_loss, "epoch finished");

            if epoch % interval == 0 {
                info!(epoch, loss = cum_loss, ?predictions, "checkpoint");
                history.reports.push(EpochReport {
                    epoch,
                    loss: cum_loss,
                    predictions,
                });
            }

            on_epoch(&EpochSummary {
                epoch,
                epochs,
                loss: cum_loss,
            });
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{feature_tensor, ModelConfig};
    use candle_core::Device;
    use spectra_core::{karate, seed_split, FeatureSet, PropagationOperator};

    fn setup(features: FeatureSet) -> (Gcn, Tensor, LabeledSet) {
        let device = Device::Cpu;
        let g = karate::karate_club().unwrap();
        let op = PropagationOperator::from_adjacency(&g.adjacency()).unwrap();
        let x = features.build(&g).unwrap();
        let model = Gcn::new(&op, x.ncols(), &ModelConfig::default(), &device).unwrap();
        let x = feature_tensor(&x, &device).unwrap();
        (model, x, seed_split(&g).unwrap().train)
    }

    #[test]
    fn test_bce_matches_probability_form() {
        let device = Device::Cpu;
        for (z, y) in [(0.3f32, 1f32), (-1.2, 0.0), (2.0, 0.0), (-0.5, 1.0)] {
            let logits = Tensor::new(&[[z]], &device).unwrap();
            let target = Tensor::new(&[[y]], &device).unwrap();
            let loss = bce_with_logits(&logits, &target).unwrap().to_scalar::<f32>().unwrap();
            let p = 1.0 / (1.0 + (-z).exp());
            let expected = -(y * p.ln() + (1.0 - y) * (1.0 - p).ln());
            assert!((loss - expected).abs() < 1e-5, "z={z} y={y}: {loss} vs {expected}");
        }
    }

    #[test]
    fn test_bce_finite_when_saturated() {
        let device = Device::Cpu;
        let logits = Tensor::new(&[[200f32]], &device).unwrap();
        let target = Tensor::new(&[[0f32]], &device).unwrap();
        let loss = bce_with_logits(&logits, &target).unwrap().to_scalar::<f32>().unwrap();
        assert!((loss - 200.0).abs() < 1e-3);

        let target = Tensor::new(&[[1f32]], &device).unwrap();
        let loss = bce_with_logits(&logits, &target).unwrap().to_scalar::<f32>().unwrap();
        assert!(loss.abs() < 1e-6);
    }

    #[test]
    fn test_report_interval() {
        let config = TrainConfig {
            epochs: 250,
            ..Default::default()
        };
        assert_eq!(config.report_interval(), 25);
        let config = TrainConfig {
            epochs: 5,
            ..Default::default()
        };
        assert_eq!(config.report_interval(), 1);
        let config = TrainConfig {
            report_every: Some(7),
            ..Default::default()
        };
        assert_eq!(config.report_interval(), 7);
    }

    #[test]
    fn test_invalid_train_config() {
        let bad_lr = TrainConfig {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(bad_lr.validate().is_err());
        let bad_report = TrainConfig {
            report_every: Some(0),
            ..Default::default()
        };
        assert!(bad_report.validate().is_err());
    }

    #[test]
    fn test_history_lengths() {
        let (model, x, seeds) = setup(FeatureSet::Identity);
        let config = TrainConfig {
            epochs: 20,
            ..Default::default()
        };
        let mut trainer = Trainer::new(&model, config).unwrap();
        let mut seen = Vec::new();
        let history = trainer
            .fit_with(&model, &x, &seeds, |s| seen.push(s.epoch))
            .unwrap();

        assert_eq!(history.epoch_losses.len(), 20);
        assert_eq!(history.embeddings.len(), 20);
        assert_eq!(history.embeddings[0].len(), 34);
        assert_eq!(history.embeddings[0][0].len(), 2);
        // Epochs 0, 2, 4, ..., 18
        assert_eq!(history.reports.len(), 10);
        assert_eq!(history.reports[1].epoch, 2);
        assert_eq!(history.reports[0].predictions.len(), 2);
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_training_changes_parameters() {
        let (model, x, seeds) = setup(FeatureSet::Identity);
        let before = model.probabilities(&x).unwrap();
        let mut trainer = Trainer::new(
            &model,
            TrainConfig {
                epochs: 3,
                ..Default::default()
            },
        )
        .unwrap();
        trainer.fit(&model, &x, &seeds).unwrap();
        assert_ne!(before, model.probabilities(&x).unwrap());
    }

    #[test]
    fn test_rejects_mismatched_features() {
        let (model, _, seeds) = setup(FeatureSet::LandmarkDistances);
        let x = Tensor::eye(34, candle_core::DType::F32, &Device::Cpu).unwrap();
        let before = model.vars()[0].to_vec2::<f32>().unwrap();
        let mut trainer = Trainer::new(&model, TrainConfig::default()).unwrap();
        let err = trainer.fit(&model, &x, &seeds).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        // Nothing was updated.
        assert_eq!(before, model.vars()[0].to_vec2::<f32>().unwrap());
    }

    #[test]
    fn test_rejects_out_of_range_seed() {
        let (model, x, _) = setup(FeatureSet::Identity);
        let seeds: LabeledSet = [(40, true)].into_iter().collect();
        let mut trainer = Trainer::new(&model, TrainConfig::default()).unwrap();
        assert!(matches!(
            trainer.fit(&model, &x, &seeds),
            Err(Error::NodeOutOfRange { node: 40, nodes: 34 })
        ));
    }

    #[test]
    fn test_with_candle_sgd() {
        let (model, x, seeds) = setup(FeatureSet::Identity);
        let before = model.probabilities(&x).unwrap();
        let sgd = candle_nn::SGD::new(model.vars(), 0.1).unwrap();
        let config = TrainConfig {
            epochs: 3,
            ..Default::default()
        };
        let mut trainer = Trainer::with_optimizer(&model, config, sgd).unwrap();
        let history = trainer.fit(&model, &x, &seeds).unwrap();
        assert_eq!(history.epoch_losses.len(), 3);
        assert_ne!(before, model.probabilities(&x).unwrap());
    }

    #[test]
    fn test_rejects_foreign_model() {
        let (a, x, seeds) = setup(FeatureSet::Identity);
        let (b, _, _) = setup(FeatureSet::Identity);
        let before = b.probabilities(&x).unwrap();
        let mut trainer = Trainer::new(
            &a,
            TrainConfig {
                epochs: 50,
                ..Default::default()
            },
        )
        .unwrap();
        let err = trainer.fit(&b, &x, &seeds).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(before, b.probabilities(&x).unwrap());
        assert!(trainer.fit(&a, &x, &seeds).is_ok());
    }

    #[test]
    fn test_zero_epochs_is_a_no_op() {
        let (model, x, seeds) = setup(FeatureSet::Identity);
        let before = model.probabilities(&x).unwrap();
        let mut trainer = Trainer::new(
            &model,
            TrainConfig {
                epochs: 0,
                ..Default::default()
            },
        )
        .unwrap();
        let history = trainer.fit(&model, &x, &seeds).unwrap();
        assert!(history.epoch_losses.is_empty());
        assert_eq!(history.final_loss(), None);
        assert_eq!(before, model.probabilities(&x).unwrap());
    }
}
