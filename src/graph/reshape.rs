//! Sample-major / time-major reordering of stacked-timestep tensors
//!
//! Target tensors arrive with all of a sample's timesteps stored
//! contiguously (sample-major); the per-timestep loss wants all rows of one
//! timestep contiguous (time-major). The conversion is the reinterpretation
//! of a `[G·T, 3]` tensor as `[G, T, 3]` followed by a transpose to
//! `[T, G, 3]` and a flatten back to `[G·T, 3]`, where `G = B·N`. It is a
//! pure row permutation: no value changes, only row order. Getting the
//! permutation wrong corrupts supervision silently, so both directions live
//! here as explicit unit-tested functions instead of inline tensor
//! gymnastics.

use crate::error::{Error, Result};
use ndarray::Array2;

/// Reorder a sample-major `[G·T, C]` tensor into time-major order.
///
/// Row `j·T + k` of the input becomes row `k·G + j` of the output, for
/// `j ∈ [0, G)` and `k ∈ [0, T)`. Fails when the row count is not divisible
/// by `num_steps`.
pub fn to_time_major(x: &Array2<f32>, num_steps: usize) -> Result<Array2<f32>> {
    let (rows, cols) = x.dim();
    let groups = check_divisible(rows, cols, num_steps)?;
    let mut out = Array2::zeros((rows, cols));
    for j in 0..groups {
        for k in 0..num_steps {
            out.row_mut(k * groups + j).assign(&x.row(j * num_steps + k));
        }
    }
    Ok(out)
}

/// Reorder a time-major `[T·G, C]` tensor back into sample-major order.
///
/// Structural inverse of [`to_time_major`]: row `k·G + j` of the input
/// becomes row `j·T + k` of the output.
pub fn to_sample_major(x: &Array2<f32>, num_steps: usize) -> Result<Array2<f32>> {
    let (rows, cols) = x.dim();
    let groups = check_divisible(rows, cols, num_steps)?;
    let mut out = Array2::zeros((rows, cols));
    for j in 0..groups {
        for k in 0..num_steps {
            out.row_mut(j * num_steps + k).assign(&x.row(k * groups + j));
        }
    }
    Ok(out)
}

fn check_divisible(rows: usize, cols: usize, num_steps: usize) -> Result<usize> {
    if num_steps == 0 || rows % num_steps != 0 {
        return Err(Error::ShapeMismatch {
            expected: vec![num_steps.max(1), rows / num_steps.max(1), cols],
            got: vec![rows, cols],
        });
    }
    Ok(rows / num_steps)
}
