//! Single-batch training/evaluation step
//!
//! One step: validate the raw batch, reorder targets into time-major
//! layout, assemble the mega-graph, derive node and edge features, run the
//! model, reduce the squared error per timestep, and (in training mode)
//! backpropagate the mean-over-timesteps loss and apply one optimizer step.
//!
//! Two different scalars leave this function on purpose: the optimised loss
//! is the mean over all `T` per-timestep losses, while epoch-level
//! accumulation and model selection use only the final timestep's loss.

use crate::error::{Error, Result};
use crate::graph::{assemble, to_time_major, SampleGraph};
use crate::model::{Model, ModelInput};
use crate::optim::Optimizer;
use ndarray::{concatenate, s, Array2, Axis};

/// Scalar results of one step.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Mean of the per-timestep losses (the optimised quantity).
    pub loss: f32,
    /// Loss at the final predicted timestep (the reported quantity).
    pub final_step_loss: f32,
    /// Auxiliary link-prediction loss; zero unless the model produces one.
    pub lp_loss: f32,
    /// Number of samples in the batch.
    pub batch_size: usize,
}

/// Process one raw batch. `optimizer` absent means pure evaluation: model
/// parameters are left untouched.
pub fn run_step(
    model: &mut dyn Model,
    mut optimizer: Option<&mut dyn Optimizer>,
    batch: &[SampleGraph],
    num_timesteps: usize,
) -> Result<StepOutcome> {
    if num_timesteps == 0 {
        return Err(Error::Config("num_timesteps must be positive".to_string()));
    }
    for sample in batch {
        sample.validate(num_timesteps)?;
    }
    let mega = assemble(batch)?;
    let g = mega.batch_size * mega.num_nodes;

    // Targets arrive sample-major; the per-timestep loss wants time-major.
    let loc_end = to_time_major(&stack_targets(batch, |s| &s.loc_end)?, num_timesteps)?;
    let _vel_end = to_time_major(&stack_targets(batch, |s| &s.vel_end)?, num_timesteps)?;

    // Derived node features: speed magnitude and max-normalised charge.
    // Fixed inputs, not differentiated through.
    let z_max = mega
        .charge
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    let mut nodes = Array2::zeros((g, 2));
    for j in 0..g {
        let v = mega.vel.row(j);
        nodes[[j, 0]] = v.dot(&v).sqrt();
        nodes[[j, 1]] = mega.charge[[j, 0]] / z_max;
    }

    // Extra edge feature: squared distance between endpoint positions,
    // appended to the stored edge attributes.
    let num_edges = mega.edges.ncols();
    let attr_cols = mega.edge_attr.ncols();
    let mut edge_attr = Array2::zeros((num_edges, attr_cols + 1));
    for e in 0..num_edges {
        let (row, col) = (mega.edges[[0, e]], mega.edges[[1, e]]);
        for c in 0..attr_cols {
            edge_attr[[e, c]] = mega.edge_attr[[e, c]];
        }
        let diff = &mega.loc.row(row) - &mega.loc.row(col);
        edge_attr[[e, attr_cols]] = diff.dot(&diff);
    }

    if let Some(opt) = optimizer.as_deref_mut() {
        opt.zero_grad(model.params_mut());
    }

    let out = model.forward(ModelInput {
        loc: &mega.loc,
        nodes: &nodes,
        edges: &mega.edges,
        edge_attr: &edge_attr,
        vel: &mega.vel,
        loc_mean: &mega.loc_mean,
    })?;
    if out.loc_pred.dim() != loc_end.dim() {
        return Err(Error::ShapeMismatch {
            expected: vec![loc_end.nrows(), loc_end.ncols()],
            got: vec![out.loc_pred.nrows(), out.loc_pred.ncols()],
        });
    }

    // One scalar loss per timestep, in timestep order.
    let mut step_losses = Vec::with_capacity(num_timesteps);
    for k in 0..num_timesteps {
        let rows = s![k * g..(k + 1) * g, ..];
        let diff = &out.loc_pred.slice(rows) - &loc_end.slice(rows);
        step_losses.push(diff.mapv(|x| x * x).sum() / (g * 3) as f32);
    }
    let loss = step_losses.iter().sum::<f32>() / num_timesteps as f32;
    let final_step_loss = step_losses[num_timesteps - 1];

    if let Some(opt) = optimizer {
        // d(mean loss)/d(pred) is uniform over all T·B·N·3 elements.
        let scale = 2.0 / (num_timesteps * g * 3) as f32;
        let grad = (&out.loc_pred - &loc_end) * scale;
        model.backward(&grad);
        opt.step(model.params_mut());
    }

    Ok(StepOutcome {
        loss,
        final_step_loss,
        lp_loss: out.lp_loss.unwrap_or(0.0),
        batch_size: mega.batch_size,
    })
}

fn stack_targets<F>(batch: &[SampleGraph], select: F) -> Result<Array2<f32>>
where
    F: Fn(&SampleGraph) -> &Array2<f32>,
{
    let views: Vec<_> = batch.iter().map(|s| select(s).view()).collect();
    concatenate(Axis(0), &views).map_err(|_| Error::ShapeMismatch {
        expected: vec![3],
        got: batch.iter().map(|s| select(s).ncols()).collect(),
    })
}
