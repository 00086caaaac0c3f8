//! One pass over a data split

use super::step::run_step;
use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::optim::Optimizer;

/// Size-weighted split averages for one epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    /// Average final-timestep loss, weighted by batch size.
    pub loss: f32,
    /// Average auxiliary loss, same weighting.
    pub lp_loss: f32,
}

/// Run every batch of `dataset` through the step executor and return the
/// size-weighted averages.
///
/// The model is put in training mode for the duration of the pass iff an
/// optimizer is supplied; otherwise it runs in evaluation mode and no
/// parameter is touched.
pub fn run_epoch(
    model: &mut dyn Model,
    mut optimizer: Option<&mut dyn Optimizer>,
    dataset: &mut dyn Dataset,
    epoch: usize,
    num_timesteps: usize,
) -> Result<EpochStats> {
    let training = optimizer.is_some();
    model.set_training(training);

    let split = dataset.split().to_string();
    let mut loss_sum = 0.0f32;
    let mut lp_sum = 0.0f32;
    let mut counter = 0usize;
    for batch in dataset.batches() {
        let outcome = run_step(
            model,
            optimizer.as_mut().map(|o| &mut **o as &mut dyn Optimizer),
            &batch,
            num_timesteps,
        )?;
        loss_sum += outcome.final_step_loss * outcome.batch_size as f32;
        lp_sum += outcome.lp_loss * outcome.batch_size as f32;
        counter += outcome.batch_size;
    }
    if counter == 0 {
        return Err(Error::EmptySplit(split));
    }

    let stats = EpochStats {
        loss: loss_sum / counter as f32,
        lp_loss: lp_sum / counter as f32,
    };
    let prefix = if training { "" } else { "==> " };
    println!(
        "{}{} epoch {} avg loss: {:.5} avg lploss: {:.5}",
        prefix, split, epoch, stats.loss, stats.lp_loss
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryDataset;
    use crate::error::Result;
    use crate::graph::sample::tests::sample;
    use crate::graph::SampleGraph;
    use crate::model::{ModelInput, ModelOutput, Param};
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    /// Predicts current positions unchanged and remembers the last training
    /// mode it was put in.
    #[derive(Debug)]
    struct Hold {
        num_timesteps: usize,
        params: Vec<Param>,
        last_mode: Option<bool>,
    }

    impl Hold {
        fn new(num_timesteps: usize) -> Self {
            Self {
                num_timesteps,
                params: Vec::new(),
                last_mode: None,
            }
        }
    }

    impl Model for Hold {
        fn forward(&mut self, input: ModelInput<'_>) -> Result<ModelOutput> {
            let g = input.loc.nrows();
            let mut loc_pred = Array2::zeros((self.num_timesteps * g, 3));
            for k in 0..self.num_timesteps {
                for j in 0..g {
                    for c in 0..3 {
                        loc_pred[[k * g + j, c]] = input.loc[[j, c]];
                    }
                }
            }
            Ok(ModelOutput {
                loc_pred,
                vel_pred: None,
                lp_loss: None,
            })
        }

        fn backward(&mut self, _grad_loc_pred: &Array2<f32>) {}

        fn params_mut(&mut self) -> &mut [Param] {
            &mut self.params
        }

        fn named_params(&self) -> Vec<(String, &Param)> {
            Vec::new()
        }

        fn set_training(&mut self, training: bool) {
            self.last_mode = Some(training);
        }

        fn num_timesteps(&self) -> usize {
            self.num_timesteps
        }
    }

    fn offset_sample(offset: f32) -> SampleGraph {
        let mut s = sample(3, 1);
        for i in 0..3 {
            for c in 0..3 {
                s.loc_end[[i, c]] = s.loc[[i, c]] + offset;
            }
        }
        s
    }

    #[test]
    fn test_size_weighted_average() {
        // Batches of sizes 6 and 4 with final-timestep losses 2.0 and 1.0:
        // (2.0·6 + 1.0·4) / 10 = 1.6.
        let mut samples: Vec<SampleGraph> =
            (0..6).map(|_| offset_sample(2.0f32.sqrt())).collect();
        samples.extend((0..4).map(|_| offset_sample(1.0)));
        let mut dataset = InMemoryDataset::eval("val", samples, 6);

        let mut model = Hold::new(1);
        let stats = run_epoch(&mut model, None, &mut dataset, 0, 1).unwrap();
        assert_abs_diff_eq!(stats.loss, 1.6, epsilon = 1e-5);
        assert_eq!(stats.lp_loss, 0.0);
    }

    #[test]
    fn test_mode_follows_optimizer_presence() {
        let samples = vec![offset_sample(1.0); 2];
        let mut dataset = InMemoryDataset::eval("val", samples.clone(), 2);
        let mut model = Hold::new(1);

        run_epoch(&mut model, None, &mut dataset, 0, 1).unwrap();
        assert_eq!(model.last_mode, Some(false));

        let mut optimizer = crate::optim::Adam::default_params(0.001);
        let mut train_set = InMemoryDataset::train(samples, 2, 0);
        run_epoch(&mut model, Some(&mut optimizer), &mut train_set, 0, 1).unwrap();
        assert_eq!(model.last_mode, Some(true));
    }

    #[test]
    fn test_empty_split_fails() {
        let mut dataset = InMemoryDataset::eval("val", Vec::new(), 2);
        let mut model = Hold::new(1);
        let err = run_epoch(&mut model, None, &mut dataset, 0, 1).unwrap_err();
        assert!(matches!(err, Error::EmptySplit(_)));
    }
}
