//! CLI arguments, config-file overrides and component builders

use crate::error::{Error, Result};
use crate::instrument::TimerHandle;
use crate::model::{LinearDynamics, Model};
use crate::optim::{Adam, Optimizer};
use clap::builder::TypedValueParser;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Harness configuration.
///
/// Every option of the original experiment surface is recognised, including
/// architecture hyperparameters the shipped baseline model does not consume;
/// config files referencing them keep working.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "andar")]
#[command(version)]
#[command(about = "Training harness for equivariant motion-capture trajectory prediction")]
pub struct Args {
    /// Experiment name
    #[arg(long, default_value = "exp_1")]
    pub exp_name: String,

    /// Input batch size for training
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Number of epochs to train
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Disable GPU execution (kept for config parity; execution is CPU)
    #[arg(long)]
    pub no_cuda: bool,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// How many batches to wait before logging training status
    #[arg(long, default_value_t = 1)]
    pub log_interval: usize,

    /// How many epochs to wait before evaluating on val/test
    #[arg(long, default_value_t = 5)]
    pub test_interval: usize,

    /// Folder for the json results file
    #[arg(long, default_value = "exp_results")]
    pub outf: PathBuf,

    /// Learning rate
    #[arg(long, default_value_t = 5e-4)]
    pub lr: f32,

    /// Hidden dim
    #[arg(long, default_value_t = 64)]
    pub nf: usize,

    /// Model to train
    #[arg(long, default_value = "linear")]
    pub model: String,

    /// Number of layers
    #[arg(long, default_value_t = 4)]
    pub n_layers: usize,

    /// Maximum amount of training samples
    #[arg(long, default_value_t = 3000)]
    pub max_training_samples: usize,

    /// Weight decay
    #[arg(long, default_value_t = 1e-12)]
    pub weight_decay: f32,

    /// Number of frames between input and first target frame
    #[arg(long, default_value_t = 30)]
    pub delta_frame: usize,

    /// Data directory
    #[arg(
        long,
        default_value = "",
        value_parser = clap::builder::StringValueParser::new().map(PathBuf::from)
    )]
    pub data_dir: PathBuf,

    /// Dropout rate (1 - keep probability)
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f32,

    /// JSON config file whose values override matching options; keys not
    /// present in the defaults are silently ignored
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "configs/config_motion.json"
    )]
    pub config_by_file: Option<PathBuf>,

    /// Weight of the linkage loss
    #[arg(long, default_value_t = 1.0)]
    pub lambda_link: f32,

    /// Number of clusters
    #[arg(long, default_value_t = 3)]
    pub n_cluster: usize,

    /// Flat MLP
    #[arg(long)]
    pub flat: bool,

    /// Interaction layers per block
    #[arg(long, default_value_t = 3)]
    pub interaction_layer: usize,

    /// Pooling layers
    #[arg(long, default_value_t = 3)]
    pub pooling_layer: usize,

    /// Decoder layers
    #[arg(long, default_value_t = 1)]
    pub decoder_layer: usize,

    /// Motion case, walk or run
    #[arg(long, default_value = "walk")]
    pub case: String,

    /// Number of future timesteps to predict
    #[arg(long, default_value_t = 1)]
    pub num_timesteps: usize,

    /// Dimension of the time embedding
    #[arg(long, default_value_t = 32)]
    pub time_emb_dim: usize,

    /// Number of modes
    #[arg(long, default_value_t = 2)]
    pub num_modes: usize,
}

/// Overlay a JSON config file on parsed arguments.
///
/// Only keys already present in the argument set are updated; unknown keys
/// in the file are silently ignored.
pub fn apply_config_file(args: Args, path: &Path) -> Result<Args> {
    let content = std::fs::read_to_string(path)?;
    let overrides: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| Error::Serialization(format!("failed to parse {}: {e}", path.display())))?;

    let serde_json::Value::Object(mut base) =
        serde_json::to_value(&args).map_err(|e| Error::Serialization(e.to_string()))?
    else {
        return Err(Error::Serialization("arguments did not serialize to an object".to_string()));
    };
    for (key, value) in overrides {
        if base.contains_key(&key) {
            base.insert(key, value);
        }
    }
    serde_json::from_value(serde_json::Value::Object(base))
        .map_err(|e| Error::Serialization(format!("invalid config override: {e}")))
}

/// Build the configured model, fatal on an unrecognised name.
pub fn build_model(args: &Args, timers: Option<TimerHandle>) -> Result<Box<dyn Model>> {
    match args.model.as_str() {
        "linear" => {
            let mut model = LinearDynamics::new(args.num_timesteps);
            if let Some(timers) = timers {
                model = model.with_timers(timers);
            }
            Ok(Box::new(model))
        }
        other => Err(Error::UnknownModel(other.to_string())),
    }
}

/// Build the optimizer: Adam with the configured learning rate and weight
/// decay.
pub fn build_optimizer(args: &Args) -> Box<dyn Optimizer> {
    Box::new(Adam::default_params(args.lr).with_weight_decay(args.weight_decay))
}
