//! Linear-dynamics reference model

use super::{Model, ModelInput, ModelOutput, Param};
use crate::error::Result;
use crate::instrument::TimerHandle;
use ndarray::{Array1, Array2};
use std::time::Instant;

/// Ballistic baseline: one learnable coefficient per future timestep.
///
/// `loc_pred_k = loc + w_k · vel`, `vel_pred_k = vel`. Coefficients start at
/// `(k+1)/T`, i.e. linear extrapolation toward the full prediction horizon.
/// Equivariant by construction and exactly differentiable, which makes it a
/// useful reference point for the full graph network.
#[derive(Debug)]
pub struct LinearDynamics {
    params: Vec<Param>,
    cache: Option<Array2<f32>>,
    training: bool,
    timers: Option<TimerHandle>,
}

impl LinearDynamics {
    pub fn new(num_timesteps: usize) -> Self {
        let coeffs: Vec<f32> = (0..num_timesteps)
            .map(|k| (k + 1) as f32 / num_timesteps as f32)
            .collect();
        Self {
            params: vec![Param::from_vec(coeffs)],
            cache: None,
            training: false,
            timers: None,
        }
    }

    /// Record per-layer forward times into a shared side-table.
    pub fn with_timers(mut self, timers: TimerHandle) -> Self {
        self.timers = Some(timers);
        self
    }

    fn coeffs(&self) -> &Param {
        &self.params[0]
    }
}

impl Model for LinearDynamics {
    fn forward(&mut self, input: ModelInput<'_>) -> Result<ModelOutput> {
        let start = Instant::now();
        let g = input.loc.nrows();
        let t = self.coeffs().len();
        let mut loc_pred = Array2::zeros((t * g, 3));
        let mut vel_pred = Array2::zeros((t * g, 3));
        for k in 0..t {
            let w = self.coeffs().data()[k];
            for j in 0..g {
                for c in 0..3 {
                    loc_pred[[k * g + j, c]] = input.loc[[j, c]] + w * input.vel[[j, c]];
                    vel_pred[[k * g + j, c]] = input.vel[[j, c]];
                }
            }
        }
        self.cache = Some(input.vel.clone());
        if let Some(timers) = &self.timers {
            timers.borrow_mut().record("linear.decoder", start.elapsed());
        }
        Ok(ModelOutput {
            loc_pred,
            vel_pred: Some(vel_pred),
            lp_loss: None,
        })
    }

    fn backward(&mut self, grad_loc_pred: &Array2<f32>) {
        let Some(vel) = self.cache.as_ref() else {
            return;
        };
        let g = vel.nrows();
        let t = self.coeffs().len();
        if grad_loc_pred.nrows() != t * g {
            return;
        }
        // dL/dw_k = Σ_j Σ_c grad[k·G + j, c] · vel[j, c]
        let mut gw = Array1::zeros(t);
        for k in 0..t {
            let mut acc = 0.0;
            for j in 0..g {
                for c in 0..3 {
                    acc += grad_loc_pred[[k * g + j, c]] * vel[[j, c]];
                }
            }
            gw[k] = acc;
        }
        self.params[0].accumulate_grad(gw);
    }

    fn params_mut(&mut self) -> &mut [Param] {
        &mut self.params
    }

    fn named_params(&self) -> Vec<(String, &Param)> {
        vec![("linear.coeffs".to_string(), &self.params[0])]
    }

    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn num_timesteps(&self) -> usize {
        self.coeffs().len()
    }
}
