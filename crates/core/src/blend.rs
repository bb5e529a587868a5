//! Weighted accumulation of transformed tiles into a shared output canvas.
//!
//! Overlapping contributions are resolved as a weighted average: every tile
//! adds `tile * mask` to the output canvas and `mask` to the weight canvas,
//! and a single normalization at the end of the pass divides the two.
//! Accumulation is commutative, so tile order never affects the result.

use ndarray::{s, Array3};

use crate::tensor::CHANNELS;

/// Output and weight canvases for one chunked pass. Zero-initialized at
/// construction, mutated additively per tile, consumed exactly once by
/// [`BlendCanvas::normalize`].
pub struct BlendCanvas {
    output: Array3<f32>,
    weights: Array3<f32>,
}

impl BlendCanvas {
    pub fn new(out_h: usize, out_w: usize) -> Self {
        Self {
            output: Array3::zeros((CHANNELS, out_h, out_w)),
            weights: Array3::zeros((CHANNELS, out_h, out_w)),
        }
    }

    /// Add one weighted tile at output coordinates `(out_y, out_x)`.
    /// The tile and mask must share the same shape.
    pub fn accumulate(&mut self, tile: &Array3<f32>, mask: &Array3<f32>, out_y: usize, out_x: usize) {
        debug_assert_eq!(tile.dim(), mask.dim());
        let (_, tile_h, tile_w) = tile.dim();

        let mut out_region = self
            .output
            .slice_mut(s![.., out_y..out_y + tile_h, out_x..out_x + tile_w]);
        out_region += &(tile * mask);

        let mut weight_region = self
            .weights
            .slice_mut(s![.., out_y..out_y + tile_h, out_x..out_x + tile_w]);
        weight_region += mask;
    }

    /// True when every canvas pixel received at least one contribution.
    /// The partitioner guarantees this for any valid configuration.
    pub fn fully_covered(&self) -> bool {
        self.weights.iter().all(|&w| w > 0.0)
    }

    /// Divide the output canvas by the accumulated weights, yielding the
    /// final tensor. Zero weights are substituted with 1 first — a guard
    /// against degenerate configurations — so the result is always finite.
    /// Never fails.
    pub fn normalize(mut self) -> Array3<f32> {
        self.weights.mapv_inplace(|w| if w == 0.0 { 1.0 } else { w });
        self.output /= &self.weights;
        self.output
    }
}
