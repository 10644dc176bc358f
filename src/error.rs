use crate::types::GridNode;

/// Errors surfaced by graph construction, configuration and persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {name} range: min {min} must be below max {max}")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },

    #[error("invalid {name} sample count {count}: at least 2 samples are required")]
    InvalidSampleCount { name: &'static str, count: usize },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("grid of {nodes} nodes exceeds the 32-bit node index range")]
    GridTooLarge { nodes: u64 },

    #[error("volume size mismatch: expected {expected} voxels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("node {0:?} lies outside the grid")]
    NodeOutOfBounds(GridNode),

    #[error("scalar field sampler is not available")]
    SamplerUnavailable,

    #[error("extraction engine is closed")]
    EngineClosed,

    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
