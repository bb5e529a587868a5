//! The opaque 2× transform capability consumed by the pipeline.
//!
//! The pipeline has no dependency on any particular inference runtime:
//! everything it needs is a single tensor-in/tensor-out method. The real
//! ONNX-backed implementation lives in [`crate::backend`]; trivial
//! doubles (nearest-neighbor duplication) are enough to exercise the
//! tiling and blending logic in tests.

use ndarray::Array3;

use crate::error::TransformError;

/// A fixed-ratio image-to-image mapping: `(3, H, W)` in, `(3, sH, sW)` out,
/// deterministic and side-effect-free, with no state carried between calls.
pub trait Transform {
    fn apply(&self, tile: &Array3<f32>) -> Result<Array3<f32>, TransformError>;

    /// Spatial scale ratio per invocation. Fixed at 2 for every supported
    /// model.
    fn scale_factor(&self) -> usize {
        2
    }
}
