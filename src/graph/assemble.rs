//! Disjoint-union batching of sample graphs
//!
//! A batch of B independent skeleton graphs is processed as one graph: node
//! features are concatenated along the node axis and every edge index of
//! sample `b` is shifted by `b·N`, so node `i` of sample `b` becomes global
//! node `b·N + i`. Edges never cross sample boundaries and every node id is
//! unique, which lets the model run message passing over the whole batch in
//! one pass.

use crate::error::{Error, Result};
use crate::graph::SampleGraph;
use ndarray::{concatenate, Array2, Axis};

/// The disjoint union of all per-sample graphs in a batch.
///
/// Node feature tensors have `B·N` rows in sample order; edge tensors have
/// the samples' edges concatenated along the edge axis with offset indices.
/// `loc_mean` carries each sample's centroid broadcast to that sample's
/// nodes.
#[derive(Debug, Clone)]
pub struct MegaGraph {
    pub loc: Array2<f32>,
    pub vel: Array2<f32>,
    pub charge: Array2<f32>,
    pub loc_mean: Array2<f32>,
    pub edges: Array2<usize>,
    pub edge_attr: Array2<f32>,
    pub local_edges: Array2<usize>,
    pub local_edge_attr: Array2<f32>,
    pub batch_size: usize,
    pub num_nodes: usize,
}

/// Combine `B` sample graphs sharing node count `N` into one mega-graph.
///
/// Fails if the batch is empty or any sample's node count differs from the
/// batch's established `N`: misaligned offsets would silently corrupt every
/// downstream index, so the mismatch is fatal.
pub fn assemble(samples: &[SampleGraph]) -> Result<MegaGraph> {
    let Some(first) = samples.first() else {
        return Err(Error::EmptySplit("batch".to_string()));
    };
    let n = first.num_nodes();
    for (index, sample) in samples.iter().enumerate() {
        if sample.num_nodes() != n {
            return Err(Error::NodeCountMismatch {
                expected: n,
                index,
                got: sample.num_nodes(),
            });
        }
    }

    let loc = concat_rows(samples, |s| &s.loc)?;
    let vel = concat_rows(samples, |s| &s.vel)?;
    let charge = concat_rows(samples, |s| &s.charge)?;
    let edge_attr = concat_rows(samples, |s| &s.edge_attr)?;
    let local_edge_attr = concat_rows(samples, |s| &s.local_edge_attr)?;
    let edges = concat_edges_with_offset(samples, n, |s| &s.edges);
    let local_edges = concat_edges_with_offset(samples, n, |s| &s.local_edges);

    // Per-sample centroid, broadcast to all N nodes of that sample.
    let mut loc_mean = Array2::zeros((samples.len() * n, 3));
    for (b, sample) in samples.iter().enumerate() {
        let mean = sample.loc.sum_axis(Axis(0)) / n as f32;
        for i in 0..n {
            loc_mean.row_mut(b * n + i).assign(&mean);
        }
    }

    Ok(MegaGraph {
        loc,
        vel,
        charge,
        loc_mean,
        edges,
        edge_attr,
        local_edges,
        local_edge_attr,
        batch_size: samples.len(),
        num_nodes: n,
    })
}

/// Concatenate one feature tensor across samples along the row axis, with no
/// reindexing.
fn concat_rows<F>(samples: &[SampleGraph], select: F) -> Result<Array2<f32>>
where
    F: Fn(&SampleGraph) -> &Array2<f32>,
{
    let views: Vec<_> = samples.iter().map(|s| select(s).view()).collect();
    concatenate(Axis(0), &views).map_err(|_| Error::ShapeMismatch {
        expected: vec![select(&samples[0]).ncols()],
        got: samples.iter().map(|s| select(s).ncols()).collect(),
    })
}

/// Concatenate edge index tensors along the edge axis, adding `b·N` to every
/// node index of sample `b` beforehand.
fn concat_edges_with_offset<F>(samples: &[SampleGraph], n: usize, select: F) -> Array2<usize>
where
    F: Fn(&SampleGraph) -> &Array2<usize>,
{
    let total: usize = samples.iter().map(|s| select(s).ncols()).sum();
    let mut out = Array2::zeros((2, total));
    let mut col = 0;
    for (b, sample) in samples.iter().enumerate() {
        let edges = select(sample);
        let offset = b * n;
        for e in 0..edges.ncols() {
            out[[0, col]] = edges[[0, e]] + offset;
            out[[1, col]] = edges[[1, e]] + offset;
            col += 1;
        }
    }
    out
}
