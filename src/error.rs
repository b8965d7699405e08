use thiserror::Error;

/// Errors that can occur during quadrilateral detection.
///
/// Only input, configuration and I/O failures abort a run. The degenerate
/// variants are per-candidate skips counted in `DetectionStats`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DetectError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("degenerate shape: zero-area moments")]
    DegenerateShape,

    #[error("degenerate edge: length {length:.2}px is below the minimum")]
    DegenerateEdge { length: f64 },

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
