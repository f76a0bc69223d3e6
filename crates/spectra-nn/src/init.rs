//! Seeded parameter initialization.
//!
//! Candle's CPU RNG cannot be seeded, so weights are drawn from a seeded
//! `StdRng` and wrapped in [`Var`]s. Parameters are drawn in construction
//! order, so the same seed and layer spec always produce the same model.

use crate::{Error, Result};
use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// Draws parameters uniformly from `[-scale, scale]`.
pub struct ParamInit {
    rng: StdRng,
    dist: Uniform<f32>,
    device: Device,
}

impl ParamInit {
    pub fn new(seed: u64, scale: f32, device: &Device) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "init scale must be positive and finite, got {scale}"
            )));
        }
        let dist = Uniform::new_inclusive(-scale, scale)
            .map_err(|e| Error::InvalidConfig(format!("init distribution: {e}")))?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            dist,
            device: device.clone(),
        })
    }

    /// A fresh trainable `rows x cols` parameter.
    pub fn var(&mut self, rows: usize, cols: usize) -> Result<Var> {
        let values: Vec<f32> = (0..rows * cols)
            .map(|_| self.dist.sample(&mut self.rng))
            .collect();
        let tensor = Tensor::from_vec(values, (rows, cols), &self.device)?;
        Ok(Var::from_tensor(&tensor)?)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}
