//! End-to-end experiment: features, model, training, evaluation.
//!
//! One run takes a graph, builds the propagation operator and the chosen
//! feature matrix, trains on the seed nodes and scores the held-out members.
//! Runs are independent, so several can execute concurrently with
//! [`run_many`]; within a run every update stays strictly sequential.

use crate::model::{feature_tensor, Gcn, ModelConfig};
use crate::predict::{accuracy, predict};
use crate::train::{EpochSummary, TrainConfig, Trainer, TrainingHistory};
use crate::Result;
use candle_core::Device;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spectra_core::{seed_split, FeatureSet, Graph, LabeledSet, PropagationOperator};
use std::path::Path;
use tracing::info;

/// Everything needed to reproduce one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub features: FeatureSet,
    pub model: ModelConfig,
    pub train: TrainConfig,
}

impl ExperimentConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub features: FeatureSet,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// Predicted label for every test node, in test order.
    pub predictions: LabeledSet,
    pub history: TrainingHistory,
}

/// Run one experiment on `graph`.
pub fn run(graph: &Graph, config: &ExperimentConfig) -> Result<ExperimentReport> {
    run_with(graph, config, |_| {})
}

/// Like [`run`], with a per-epoch observer.
pub fn run_with<F>(graph: &Graph, config: &ExperimentConfig, on_epoch: F) -> Result<ExperimentReport>
where
    F: FnMut(&EpochSummary),
{
    let device = Device::Cpu;
    let split = seed_split(graph)?;
    let operator = PropagationOperator::from_adjacency(&graph.adjacency())?;
    let features = config.features.build(graph)?;

    let model = Gcn::new(&operator, features.ncols(), &config.model, &device)?;
    let x = feature_tensor(&features, &device)?;

    let mut trainer = Trainer::new(&model, config.train.clone())?;
    let history = trainer.fit_with(&model, &x, &split.train, on_epoch)?;

    let train_pred = predict(&model, &x, &split.train.indices())?;
    let test_nodes = split.test.indices();
    let test_pred = predict(&model, &x, &test_nodes)?;

    let report = ExperimentReport {
        features: config.features,
        train_accuracy: accuracy(&train_pred, &split.train),
        test_accuracy: accuracy(&test_pred, &split.test),
        predictions: test_nodes.into_iter().zip(test_pred).collect(),
        history,
    };
    info!(
        features = %report.features,
        train_accuracy = report.train_accuracy,
        test_accuracy = report.test_accuracy,
        "experiment finished"
    );
    Ok(report)
}

/// Run independent experiments in parallel, results in input order.
pub fn run_many(graph: &Graph, configs: &[ExperimentConfig]) -> Vec<Result<ExperimentReport>> {
    configs.par_iter().map(|config| run(graph, config)).collect()
}
