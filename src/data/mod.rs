//! Dataset capability and in-memory backend
//!
//! A dataset yields ordered batches of [`SampleGraph`]s for one split and
//! reports the split's name. The iteration order within an epoch is the
//! dataset's own (shuffled for training), consumed exactly once per epoch.

pub mod motion;

use crate::graph::SampleGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A source of ordered sample-graph batches for one data split.
pub trait Dataset {
    /// Split name ("train", "val", "test").
    fn split(&self) -> &str;

    /// Number of samples in the split.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One epoch's worth of batches, in iteration order. Each call starts a
    /// fresh pass; a shuffling dataset reshuffles per call.
    fn batches(&mut self) -> Box<dyn Iterator<Item = Vec<SampleGraph>> + '_>;
}

/// In-memory dataset with seeded shuffling.
///
/// Training splits shuffle each epoch and drop the trailing partial batch;
/// evaluation splits iterate in stable order and keep it.
pub struct InMemoryDataset {
    split: String,
    samples: Vec<SampleGraph>,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    rng: StdRng,
}

impl InMemoryDataset {
    pub fn new(
        split: impl Into<String>,
        samples: Vec<SampleGraph>,
        batch_size: usize,
        shuffle: bool,
        drop_last: bool,
        seed: u64,
    ) -> Self {
        Self {
            split: split.into(),
            samples,
            batch_size,
            shuffle,
            drop_last,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Training-split conventions: shuffled, trailing partial batch dropped.
    pub fn train(samples: Vec<SampleGraph>, batch_size: usize, seed: u64) -> Self {
        Self::new("train", samples, batch_size, true, true, seed)
    }

    /// Evaluation-split conventions: stable order, partial batch kept.
    pub fn eval(split: impl Into<String>, samples: Vec<SampleGraph>, batch_size: usize) -> Self {
        Self::new(split, samples, batch_size, false, false, 0)
    }
}

impl Dataset for InMemoryDataset {
    fn split(&self) -> &str {
        &self.split
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn batches(&mut self) -> Box<dyn Iterator<Item = Vec<SampleGraph>> + '_> {
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        let batch_size = self.batch_size;
        let total = order.len();
        let num_batches = if self.drop_last {
            total / batch_size
        } else {
            total.div_ceil(batch_size)
        };
        let samples = &self.samples;
        Box::new((0..num_batches).map(move |i| {
            let start = i * batch_size;
            let end = usize::min(start + batch_size, total);
            order[start..end].iter().map(|&j| samples[j].clone()).collect()
        }))
    }
}
