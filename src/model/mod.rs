//! Model capability contract
//!
//! The network is a black-box differentiable function of the assembled
//! mega-graph. The harness drives it through an explicit trait: a forward
//! pass over batched graph tensors, a backward pass that accumulates
//! parameter gradients for the preceding forward, and parameter access for
//! the optimizer and the sparsity report.

pub mod linear;
pub mod param;

pub use linear::LinearDynamics;
pub use param::Param;

use crate::error::Result;
use ndarray::Array2;

/// Inputs to one forward pass, all in mega-graph (batched) index space.
///
/// For `B` samples of `N` nodes, `M` total edges and `F` node features:
/// `loc`, `vel`, `loc_mean` are `[B·N, 3]`, `nodes` is `[B·N, F]`, `edges`
/// is `[2, M]` and `edge_attr` is `[M, E]`.
#[derive(Debug, Clone, Copy)]
pub struct ModelInput<'a> {
    pub loc: &'a Array2<f32>,
    pub nodes: &'a Array2<f32>,
    pub edges: &'a Array2<usize>,
    pub edge_attr: &'a Array2<f32>,
    pub vel: &'a Array2<f32>,
    pub loc_mean: &'a Array2<f32>,
}

/// Predictions from one forward pass.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Predicted positions, `[T·B·N, 3]`, time-major.
    pub loc_pred: Array2<f32>,
    /// Predicted velocities, same layout, when the model produces them.
    pub vel_pred: Option<Array2<f32>>,
    /// Auxiliary link-prediction loss. No shipped model produces one; the
    /// harness reports zero in its place.
    pub lp_loss: Option<f32>,
}

/// A differentiable trajectory model.
///
/// `forward` must be a pure function of its inputs and the current
/// parameters. `backward` consumes the loss gradient with respect to
/// `loc_pred` from the most recent forward and accumulates parameter
/// gradients; it never changes parameter values, so a caller that skips the
/// optimizer step leaves the model bit-identical.
pub trait Model: std::fmt::Debug {
    /// Run one forward pass over an assembled mega-graph.
    fn forward(&mut self, input: ModelInput<'_>) -> Result<ModelOutput>;

    /// Accumulate parameter gradients given `dL/d(loc_pred)` for the most
    /// recent forward pass.
    fn backward(&mut self, grad_loc_pred: &Array2<f32>);

    /// Parameters, in a stable order, for the optimizer.
    fn params_mut(&mut self) -> &mut [Param];

    /// Named parameters for diagnostics.
    fn named_params(&self) -> Vec<(String, &Param)>;

    /// Switch between training and evaluation mode.
    fn set_training(&mut self, training: bool);

    /// Number of future timesteps this model predicts.
    fn num_timesteps(&self) -> usize;
}
