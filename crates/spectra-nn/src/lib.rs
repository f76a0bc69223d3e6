//! Spectral graph convolution for semi-supervised node classification.
//!
//! A [`Gcn`] is a [`FeatureStack`] of [`SpectralConv`] layers feeding a
//! [`LogisticHead`]. Every layer mixes node features through the same frozen
//! propagation operator before a learned projection:
//!
//! ```text
//! H^{(l+1)} = sigma(A_hat H^{(l)} W^{(l)})
//! y         = sigmoid(H^{(L)} w^T + b)
//! ```
//!
//! Gradients come from candle's autodiff. The [`Trainer`] takes one optimizer
//! step per labeled seed node, in a fixed order, for a fixed number of epochs.
//!
//! # Modules
//!
//! - [`conv`]: spectral convolution layer and feature stack
//! - [`head`]: logistic classifier head
//! - [`model`]: model assembly and configuration
//! - [`optim`]: momentum SGD (`candle_nn::Optimizer`)
//! - [`train`]: per-example training loop and history
//! - [`predict`]: thresholding and accuracy
//! - [`experiment`]: end-to-end runs over a graph
//!
//! # Example
//!
//! ```rust,no_run
//! use spectra_core::{karate, FeatureSet};
//! use spectra_nn::experiment::{run, ExperimentConfig};
//!
//! let graph = karate::karate_club()?;
//! let config = ExperimentConfig {
//!     features: FeatureSet::LandmarkDistances,
//!     ..Default::default()
//! };
//! let report = run(&graph, &config)?;
//! println!("test accuracy: {:.3}", report.test_accuracy);
//! # Ok::<(), spectra_nn::Error>(())
//! ```

pub mod activation;
pub mod conv;
pub mod error;
pub mod experiment;
pub mod head;
pub mod init;
pub mod model;
pub mod optim;
pub mod predict;
pub mod train;

pub use activation::Activation;
pub use conv::{FeatureStack, SpectralConv};
pub use error::{Error, Result};
pub use experiment::{ExperimentConfig, ExperimentReport};
pub use head::LogisticHead;
pub use model::{feature_tensor, Gcn, LayerSpec, ModelConfig};
pub use optim::{ParamsSgd, SgdMomentum};
pub use predict::{accuracy, predict, threshold};
pub use train::{EpochReport, EpochSummary, TrainConfig, Trainer, TrainingHistory};
