//! Multi-epoch training loop
//!
//! Drives training across epochs and splits: every epoch trains on the
//! train split; every `test_interval` epochs (including epoch 0) the model
//! is additionally evaluated on the validation and test splits, and the
//! best-so-far metrics are updated on strict validation improvement. The
//! full results history is rewritten to disk after every epoch.

use super::epoch::run_epoch;
use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::optim::Optimizer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-run loss history, persisted as JSON after every epoch.
///
/// `eval_epoch`, `val_loss` and `test_loss` are indexed together: one entry
/// per evaluation pass. `train_loss` has one entry per epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsHistory {
    #[serde(rename = "eval epoch")]
    pub eval_epoch: Vec<usize>,
    #[serde(rename = "val loss")]
    pub val_loss: Vec<f32>,
    #[serde(rename = "test loss")]
    pub test_loss: Vec<f32>,
    #[serde(rename = "train loss")]
    pub train_loss: Vec<f32>,
}

impl ResultsHistory {
    /// Overwrite `path` with the complete history so far.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Best validation loss seen so far, with its co-occurring metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMetrics {
    pub train_loss: f32,
    pub val_loss: f32,
    pub test_loss: f32,
    pub lp_loss: f32,
    pub epoch: usize,
}

impl BestMetrics {
    pub fn new() -> Self {
        Self {
            train_loss: 1e8,
            val_loss: 1e8,
            test_loss: 1e8,
            lp_loss: 1e8,
            epoch: 0,
        }
    }

    /// Record the new evaluation iff it strictly improves on the stored
    /// validation loss. Ties do not overwrite.
    pub fn update(
        &mut self,
        train_loss: f32,
        val_loss: f32,
        test_loss: f32,
        lp_loss: f32,
        epoch: usize,
    ) -> bool {
        if val_loss < self.val_loss {
            self.train_loss = train_loss;
            self.val_loss = val_loss;
            self.test_loss = test_loss;
            self.lp_loss = lp_loss;
            self.epoch = epoch;
            true
        } else {
            false
        }
    }
}

impl Default for BestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-level settings for [`run_training`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub epochs: usize,
    pub test_interval: usize,
    pub num_timesteps: usize,
    /// Where the results history is rewritten after every epoch.
    pub results_path: PathBuf,
}

/// Train for `epochs` epochs, evaluating every `test_interval` epochs.
///
/// Evaluation passes never touch model parameters or optimizer state. A
/// failed history write is reported and tolerated; everything else is
/// fail-fast.
pub fn run_training(
    model: &mut dyn Model,
    optimizer: &mut dyn Optimizer,
    train: &mut dyn Dataset,
    val: &mut dyn Dataset,
    test: &mut dyn Dataset,
    config: &RunConfig,
) -> Result<(BestMetrics, ResultsHistory)> {
    if config.test_interval == 0 {
        return Err(Error::Config("test_interval must be positive".to_string()));
    }

    let mut results = ResultsHistory::default();
    let mut best = BestMetrics::new();

    for epoch in 0..config.epochs {
        let train_stats = run_epoch(
            model,
            Some(&mut *optimizer),
            train,
            epoch,
            config.num_timesteps,
        )?;
        results.train_loss.push(train_stats.loss);

        if epoch % config.test_interval == 0 {
            let val_stats = run_epoch(model, None, val, epoch, config.num_timesteps)?;
            let test_stats = run_epoch(model, None, test, epoch, config.num_timesteps)?;

            results.eval_epoch.push(epoch);
            results.val_loss.push(val_stats.loss);
            results.test_loss.push(test_stats.loss);

            best.update(
                train_stats.loss,
                val_stats.loss,
                test_stats.loss,
                train_stats.lp_loss,
                epoch,
            );
            println!(
                "*** Best Val Loss: {:.5} \t Best Test Loss: {:.5} \t Best epoch {}",
                best.val_loss, best.test_loss, best.epoch
            );
        }

        if let Err(e) = results.write(&config.results_path) {
            eprintln!(
                "warning: failed to write {}: {e}",
                config.results_path.display()
            );
        }
    }

    Ok((best, results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_metrics_strict_improvement() {
        let mut best = BestMetrics::new();
        assert!(best.update(0.5, 1.0, 0.9, 0.0, 0));
        assert_eq!(best.epoch, 0);

        // Equal validation loss does not overwrite the stored best epoch.
        assert!(!best.update(0.4, 1.0, 0.8, 0.0, 5));
        assert_eq!(best.epoch, 0);
        assert_eq!(best.test_loss, 0.9);

        assert!(best.update(0.4, 0.9, 0.8, 0.0, 10));
        assert_eq!(best.epoch, 10);
        assert_eq!(best.test_loss, 0.8);
    }

    #[test]
    fn test_results_history_json_keys() {
        let history = ResultsHistory {
            eval_epoch: vec![0, 5],
            val_loss: vec![1.0, 0.5],
            test_loss: vec![1.1, 0.6],
            train_loss: vec![1.5, 1.2, 1.0, 0.8, 0.7, 0.6],
        };
        let json = serde_json::to_string(&history).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("eval epoch").is_some());
        assert!(value.get("val loss").is_some());
        assert!(value.get("test loss").is_some());
        assert!(value.get("train loss").is_some());
        assert_eq!(value["eval epoch"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_results_file_overwritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loss.json");

        let mut history = ResultsHistory::default();
        history.train_loss.push(1.0);
        history.write(&path).unwrap();

        history.train_loss.push(0.5);
        history.write(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: ResultsHistory = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.train_loss, vec![1.0, 0.5]);
    }

    #[test]
    fn test_zero_test_interval_rejected() {
        use crate::data::InMemoryDataset;
        use crate::model::LinearDynamics;
        use crate::optim::Adam;

        let mut model = LinearDynamics::new(1);
        let mut optimizer = Adam::default_params(0.001);
        let mut empty = || InMemoryDataset::eval("val", Vec::new(), 1);
        let (mut a, mut b, mut c) = (empty(), empty(), empty());
        let config = RunConfig {
            epochs: 1,
            test_interval: 0,
            num_timesteps: 1,
            results_path: PathBuf::from("unused.json"),
        };
        let err =
            run_training(&mut model, &mut optimizer, &mut a, &mut b, &mut c, &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
