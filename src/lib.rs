//! # Andar: Motion-Capture Trajectory Prediction Harness
//!
//! Andar trains graph models to extrapolate CMU motion-capture trajectories:
//! each sample is a skeleton graph with per-joint positions and velocities,
//! and the model predicts joint positions over one or more future timesteps.
//!
//! ## Architecture
//!
//! - **graph**: Per-sample graphs, disjoint-union batch assembly, and the
//!   sample-major/time-major row reordering
//! - **model**: The `Model` contract (analytic forward/backward over flat
//!   parameter vectors) and the linear-dynamics baseline
//! - **optim**: Optimizers over flat parameter slices (Adam)
//! - **data**: Split loading and batch iteration
//! - **train**: Step, epoch, and multi-epoch training loops with results
//!   persistence and best-metrics tracking
//! - **instrument**: Forward-pass timing and parameter-sparsity diagnostics
//! - **config**: CLI arguments, config-file overrides, component builders

pub mod config;
pub mod data;
pub mod graph;
pub mod instrument;
pub mod model;
pub mod optim;
pub mod train;

pub mod error;

// Re-export commonly used types
pub use error::{Error, Result};
pub use graph::{MegaGraph, SampleGraph};
pub use model::Model;
