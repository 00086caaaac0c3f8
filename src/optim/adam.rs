//! Adam optimizer

use super::Optimizer;
use crate::model::Param;
use ndarray::Array1;

/// Adam optimizer (Adaptive Moment Estimation) with optional L2 weight decay
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            weight_decay: 0.0,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Create Adam with default betas and epsilon
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    /// Set the L2 weight-decay coefficient (added to the gradient before the
    /// moment updates, as in the classic coupled formulation)
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Initialize moments if needed
    fn ensure_moments(&mut self, params: &[Param]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Param]) {
        self.ensure_moments(params);
        self.t += 1;

        // Bias correction factors
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };
            let grad = if self.weight_decay != 0.0 {
                grad + &(param.data() * self.weight_decay)
            } else {
                grad.clone()
            };

            // m_t = β1 * m_{t-1} + (1 - β1) * g
            let m_t = if let Some(m) = &self.m[i] {
                m * self.beta1 + &grad * (1.0 - self.beta1)
            } else {
                &grad * (1.0 - self.beta1)
            };

            // v_t = β2 * v_{t-1} + (1 - β2) * g²
            let grad_sq = &grad * &grad;
            let v_t = if let Some(v) = &self.v[i] {
                v * self.beta2 + &grad_sq * (1.0 - self.beta2)
            } else {
                &grad_sq * (1.0 - self.beta2)
            };

            // θ_t = θ_{t-1} - lr_t * m_t / (√v_t + ε)
            let update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;
            *param.data_mut() = param.data() - &update;

            self.m[i] = Some(m_t);
            self.v[i] = Some(v_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adam_quadratic_convergence() {
        // Test convergence on f(x) = x²
        let mut params = vec![Param::from_vec(vec![5.0, -3.0, 2.0])];
        let mut optimizer = Adam::default_params(0.1);

        for _ in 0..100 {
            // ∇(x²) = 2x
            let grad = params[0].data().mapv(|x| 2.0 * x);
            optimizer.zero_grad(&mut params);
            params[0].accumulate_grad(grad);
            optimizer.step(&mut params);
        }

        for &val in params[0].data().iter() {
            assert!(val.abs() < 0.5, "Value {} did not converge", val);
        }
    }

    #[test]
    fn test_weight_decay_shrinks_idle_params() {
        // A parameter with zero gradient still decays toward zero.
        let mut params = vec![Param::from_vec(vec![1.0])];
        let mut optimizer = Adam::default_params(0.01).with_weight_decay(0.1);

        for _ in 0..50 {
            optimizer.zero_grad(&mut params);
            params[0].accumulate_grad(Array1::zeros(1));
            optimizer.step(&mut params);
        }

        assert!(params[0].data()[0] < 1.0);
    }

    #[test]
    fn test_step_skips_params_without_grad() {
        let mut params = vec![Param::from_vec(vec![1.0, 2.0])];
        let mut optimizer = Adam::default_params(0.1);
        optimizer.step(&mut params);
        assert_eq!(params[0].data().to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_set_lr() {
        let mut optimizer = Adam::default_params(0.1);
        optimizer.set_lr(0.01);
        assert_eq!(optimizer.lr(), 0.01);
    }
}
