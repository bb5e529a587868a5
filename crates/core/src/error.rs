//! Error taxonomy for the upscaling pipeline.
//!
//! Configuration problems are detected eagerly, before any tile work starts.
//! Resource exhaustion during a transform invocation is fatal for the whole
//! pass — the pipeline never returns a partially blended image.

use thiserror::Error;

/// Failure raised by a [`crate::model::Transform`] implementation.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The backing runtime ran out of memory while processing one tile.
    /// Implies the configured tile size is too large for the device;
    /// never retried automatically.
    #[error("transform ran out of memory: {0}")]
    ResourceExhausted(String),
    /// The tile handed to the transform did not have the expected
    /// `3 × tile × tile` shape.
    #[error("transform received tile of shape {got:?}, expected {expected:?}")]
    Shape { expected: [usize; 3], got: Vec<usize> },
    /// Any other failure from the backing runtime.
    #[error("transform invocation failed: {0}")]
    Backend(String),
}

/// Top-level pipeline failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any work starts (e.g. `overlap >= tile_size`,
    /// which would produce a non-advancing tiling).
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// A transform invocation failed under memory pressure. Aborts the
    /// current chunked pass.
    #[error("out of memory during tile processing: {0}")]
    ResourceExhausted(String),
    /// Any other transform failure, propagated unchanged.
    #[error(transparent)]
    Transform(TransformError),
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::ResourceExhausted(msg) => PipelineError::ResourceExhausted(msg),
            other => PipelineError::Transform(other),
        }
    }
}
