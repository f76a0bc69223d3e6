//! Stochastic gradient descent with momentum.
//!
//! Implements `candle_nn::Optimizer`, so the trainer can take any candle
//! optimizer. The update is:
//!
//! ```text
//! v_t = momentum * v_{t-1} + lr * grad
//! p_t = p_{t-1} - v_t
//! ```
//!
//! With `momentum = 1` the velocity never decays and accumulates every
//! gradient seen so far.

use candle_core::backprop::GradStore;
use candle_core::{Result, Tensor, Var};
use candle_nn::Optimizer;

/// Hyperparameters for [`SgdMomentum`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsSgd {
    pub lr: f64,
    pub momentum: f64,
}

impl Default for ParamsSgd {
    fn default() -> Self {
        Self {
            lr: 0.001,
            momentum: 1.0,
        }
    }
}

/// SGD with a per-parameter velocity buffer.
#[derive(Debug)]
pub struct SgdMomentum {
    vars: Vec<Var>,
    velocity: Vec<Tensor>,
    params: ParamsSgd,
}

impl SgdMomentum {
    pub fn params(&self) -> ParamsSgd {
        self.params
    }

    /// Current velocity buffers, aligned with the vars passed to `new`.
    pub fn velocity(&self) -> &[Tensor] {
        &self.velocity
    }
}

impl Optimizer for SgdMomentum {
    type Config = ParamsSgd;

    fn new(vars: Vec<Var>, params: ParamsSgd) -> Result<Self> {
        let vars: Vec<Var> = vars.into_iter().filter(|v| v.dtype().is_float()).collect();
        let velocity = vars
            .iter()
            .map(|v| v.zeros_like())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            vars,
            velocity,
            params,
        })
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        for (var, velocity) in self.vars.iter().zip(self.velocity.iter_mut()) {
            if let Some(grad) = grads.get(var.as_tensor()) {
                let next = velocity
                    .affine(self.params.momentum, 0.)?
                    .add(&grad.affine(self.params.lr, 0.)?)?
                    .detach();
                var.set(&var.sub(&next)?)?;
                *velocity = next;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.params.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.params.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn scalar(v: &Var) -> f32 {
        v.flatten_all().unwrap().to_vec1::<f32>().unwrap()[0]
    }

    #[test]
    fn test_plain_sgd_step() {
        let device = Device::Cpu;
        let w = Var::new(&[3f32], &device).unwrap();
        let mut opt = SgdMomentum::new(
            vec![w.clone()],
            ParamsSgd {
                lr: 0.1,
                momentum: 0.0,
            },
        )
        .unwrap();

        // loss = w^2, grad = 2w = 6
        let loss = w.sqr().unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();
        assert!((scalar(&w) - 2.4).abs() < 1e-6);
    }

    #[test]
    fn test_unit_momentum_accumulates() {
        let device = Device::Cpu;
        let w = Var::new(&[0f32], &device).unwrap();
        let mut opt = SgdMomentum::new(
            vec![w.clone()],
            ParamsSgd {
                lr: 0.5,
                momentum: 1.0,
            },
        )
        .unwrap();

        // loss = -w, grad = -1 every step.
        // v: 0.5, 1.0, 1.5  ->  w: 0.5, 1.5, 3.0
        for expected in [0.5f32, 1.5, 3.0] {
            let loss = w.neg().unwrap().sum_all().unwrap();
            opt.backward_step(&loss).unwrap();
            assert!((scalar(&w) - expected).abs() < 1e-6);
        }
        let v = opt.velocity()[0].to_vec1::<f32>().unwrap()[0];
        assert!((v + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_untouched_var_is_not_moved() {
        let device = Device::Cpu;
        let used = Var::new(&[1f32], &device).unwrap();
        let unused = Var::new(&[5f32], &device).unwrap();
        let mut opt =
            SgdMomentum::new(vec![used.clone(), unused.clone()], ParamsSgd::default()).unwrap();

        let loss = used.sqr().unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();
        assert_eq!(scalar(&unused), 5.0);
        assert!(scalar(&used) < 1.0);
    }

    #[test]
    fn test_learning_rate_accessors() {
        let w = Var::new(&[1f32], &Device::Cpu).unwrap();
        let mut opt = SgdMomentum::new(vec![w], ParamsSgd::default()).unwrap();
        assert_eq!(opt.learning_rate(), 0.001);
        opt.set_learning_rate(0.01);
        assert_eq!(opt.params().lr, 0.01);
    }
}
