//! Per-sample skeleton graph

use crate::error::{Error, Result};
use ndarray::Array2;

/// A single training example: one skeleton's node features, edge sets and
/// ground-truth future positions.
///
/// Shapes, for `N` nodes, `M` edges and `T` future timesteps:
///
/// - `loc`, `vel`: `[N, 3]`
/// - `charge`: `[N, 1]`
/// - `edges`, `local_edges`: `[2, M]`, node indices in `[0, N)`
/// - `edge_attr`, `local_edge_attr`: `[M, E]`
/// - `loc_end`, `vel_end`: `[T·N, 3]`, stored as `T` blocks of `N` rows
///   (timestep-major, node-minor)
///
/// The local edge set is the sparser skeleton-only connectivity; it shares
/// the node index space with the global edge set.
#[derive(Debug, Clone)]
pub struct SampleGraph {
    pub loc: Array2<f32>,
    pub vel: Array2<f32>,
    pub charge: Array2<f32>,
    pub edges: Array2<usize>,
    pub edge_attr: Array2<f32>,
    pub local_edges: Array2<usize>,
    pub local_edge_attr: Array2<f32>,
    pub loc_end: Array2<f32>,
    pub vel_end: Array2<f32>,
}

impl SampleGraph {
    /// Number of nodes `N`.
    pub fn num_nodes(&self) -> usize {
        self.loc.nrows()
    }

    /// Number of global edges `M`.
    pub fn num_edges(&self) -> usize {
        self.edges.ncols()
    }

    /// Check internal consistency: feature row counts agree, every edge
    /// index references a node in `[0, N)`, and target tensors hold whole
    /// timestep blocks of `N` rows each.
    pub fn validate(&self, num_timesteps: usize) -> Result<()> {
        let n = self.num_nodes();
        if n == 0 {
            return Err(Error::ShapeMismatch {
                expected: vec![1, 3],
                got: vec![0, 3],
            });
        }
        for (name, rows) in [("vel", self.vel.nrows()), ("charge", self.charge.nrows())] {
            if rows != n {
                let _ = name;
                return Err(Error::ShapeMismatch {
                    expected: vec![n],
                    got: vec![rows],
                });
            }
        }
        for (index_set, attr) in [
            (&self.edges, &self.edge_attr),
            (&self.local_edges, &self.local_edge_attr),
        ] {
            if index_set.nrows() != 2 || index_set.ncols() != attr.nrows() {
                return Err(Error::ShapeMismatch {
                    expected: vec![2, attr.nrows()],
                    got: vec![index_set.nrows(), index_set.ncols()],
                });
            }
            if index_set.iter().any(|&i| i >= n) {
                return Err(Error::ShapeMismatch {
                    expected: vec![n],
                    got: vec![*index_set.iter().max().unwrap_or(&0) + 1],
                });
            }
        }
        for target in [&self.loc_end, &self.vel_end] {
            if target.nrows() != num_timesteps * n || target.ncols() != 3 {
                return Err(Error::ShapeMismatch {
                    expected: vec![num_timesteps * n, 3],
                    got: vec![target.nrows(), target.ncols()],
                });
            }
        }
        Ok(())
    }
}
