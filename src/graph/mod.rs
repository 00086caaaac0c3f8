//! Batch graph construction
//!
//! This module owns the per-batch graph protocol:
//! - `sample`: the per-sample skeleton graph
//! - `assemble`: disjoint-union mega-graph batching with index offsets
//! - `reshape`: sample-major / time-major target reordering

pub mod assemble;
pub mod reshape;
pub mod sample;

pub use assemble::{assemble, MegaGraph};
pub use reshape::{to_sample_major, to_time_major};
pub use sample::SampleGraph;
