//! Error types for andar

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("node count mismatch in batch: established {expected}, sample {index} has {got}")]
    NodeCountMismatch {
        expected: usize,
        index: usize,
        got: usize,
    },

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("empty {0} split: no samples to iterate")]
    EmptySplit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
