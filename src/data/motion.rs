//! Motion-capture split loader
//!
//! Loads a CMU motion split from `<data_dir>/motion_<case>_<split>.json`:
//! a JSON array of per-sample records mirroring the dataset tuple
//! `(loc, vel, edges, edge_attr, local_edges, local_edge_attr, charge,
//! loc_end, vel_end)`.

use super::InMemoryDataset;
use crate::error::{Error, Result};
use crate::graph::SampleGraph;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One serialized training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    pub loc: Vec<[f32; 3]>,
    pub vel: Vec<[f32; 3]>,
    pub charge: Vec<f32>,
    pub edges: Vec<[usize; 2]>,
    pub edge_attr: Vec<Vec<f32>>,
    pub local_edges: Vec<[usize; 2]>,
    pub local_edge_attr: Vec<Vec<f32>>,
    pub loc_end: Vec<[f32; 3]>,
    pub vel_end: Vec<[f32; 3]>,
}

impl SampleRecord {
    /// Convert to a validated [`SampleGraph`].
    pub fn into_sample(self, num_timesteps: usize) -> Result<SampleGraph> {
        let sample = SampleGraph {
            loc: rows3(&self.loc),
            vel: rows3(&self.vel),
            charge: Array2::from_shape_fn((self.charge.len(), 1), |(i, _)| self.charge[i]),
            edges: edge_index(&self.edges),
            edge_attr: ragged(&self.edge_attr)?,
            local_edges: edge_index(&self.local_edges),
            local_edge_attr: ragged(&self.local_edge_attr)?,
            loc_end: rows3(&self.loc_end),
            vel_end: rows3(&self.vel_end),
        };
        sample.validate(num_timesteps)?;
        Ok(sample)
    }
}

fn rows3(rows: &[[f32; 3]]) -> Array2<f32> {
    Array2::from_shape_fn((rows.len(), 3), |(i, j)| rows[i][j])
}

fn edge_index(pairs: &[[usize; 2]]) -> Array2<usize> {
    Array2::from_shape_fn((2, pairs.len()), |(r, c)| pairs[c][r])
}

fn ragged(rows: &[Vec<f32>]) -> Result<Array2<f32>> {
    let cols = rows.first().map_or(0, Vec::len);
    if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
        return Err(Error::ShapeMismatch {
            expected: vec![rows.len(), cols],
            got: vec![rows.len(), bad.len()],
        });
    }
    Ok(Array2::from_shape_fn((rows.len(), cols), |(i, j)| rows[i][j]))
}

/// Load one split from `data_dir`, honouring `max_samples`, and wrap it with
/// the split's iteration conventions (shuffled + drop-last for train).
pub fn load_split(
    data_dir: &Path,
    case: &str,
    split: &str,
    num_timesteps: usize,
    max_samples: usize,
    batch_size: usize,
    seed: u64,
) -> Result<InMemoryDataset> {
    let path = data_dir.join(format!("motion_{case}_{split}.json"));
    let content = std::fs::read_to_string(&path)?;
    let records: Vec<SampleRecord> = serde_json::from_str(&content).map_err(|e| {
        Error::Serialization(format!("failed to parse {}: {e}", path.display()))
    })?;

    let samples = records
        .into_iter()
        .take(max_samples)
        .map(|r| r.into_sample(num_timesteps))
        .collect::<Result<Vec<_>>>()?;

    if samples.is_empty() {
        return Err(Error::EmptySplit(split.to_string()));
    }

    Ok(if split == "train" {
        InMemoryDataset::train(samples, batch_size, seed)
    } else {
        InMemoryDataset::eval(split, samples, batch_size)
    })
}
