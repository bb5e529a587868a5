//! Tile partitioning: the minimal deduplicated set of crop windows covering
//! an image with no gaps.
//!
//! Tiles near the bottom/right edge are pulled back so their far edge lands
//! exactly on the image boundary. A pulled-back tile can overlap its
//! neighbor by more than the configured `overlap`, widening the blending
//! band for edge tiles. This is deliberate: it guarantees full coverage
//! with a fixed tile size and no out-of-bounds reads, at the cost of some
//! redundant compute on the last row/column of tiles.

use std::collections::HashSet;

use crate::error::PipelineError;

/// One crop window in source-resolution coordinates.
/// Extents never exceed the tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub y_start: usize,
    pub x_start: usize,
    pub y_end: usize,
    pub x_end: usize,
}

impl Tile {
    pub fn height(&self) -> usize {
        self.y_end - self.y_start
    }

    pub fn width(&self) -> usize {
        self.x_end - self.x_start
    }
}

/// Compute the covering tile set for an `(h, w)` image.
///
/// `stride = tile_size - overlap` must be positive or the tiling would
/// never advance; that is rejected before any work starts. Origins are
/// deduplicated (edge-pulled tiles can coincide with a grid origin) while
/// preserving first-emission order, so iteration is deterministic.
pub fn tile_origins(
    h: usize,
    w: usize,
    tile_size: usize,
    overlap: usize,
) -> Result<Vec<Tile>, PipelineError> {
    if tile_size == 0 {
        return Err(PipelineError::Configuration(
            "tile_size must be positive".to_string(),
        ));
    }
    if overlap >= tile_size {
        return Err(PipelineError::Configuration(format!(
            "overlap ({overlap}) must be smaller than tile_size ({tile_size})"
        )));
    }

    let stride = tile_size - overlap;
    let h_steps = if h <= tile_size { 1 } else { h.div_ceil(stride) };
    let w_steps = if w <= tile_size { 1 } else { w.div_ceil(stride) };

    let mut seen = HashSet::new();
    let mut tiles = Vec::new();

    for i in 0..h_steps {
        for j in 0..w_steps {
            let mut y_start = i * stride;
            let mut x_start = j * stride;

            // Pull the origin back so the far edge aligns with the image
            // edge, provided the image is big enough on that axis.
            if y_start + tile_size > h && h >= tile_size {
                y_start = h - tile_size;
            }
            if x_start + tile_size > w && w >= tile_size {
                x_start = w - tile_size;
            }

            if !seen.insert((y_start, x_start)) {
                continue;
            }

            tiles.push(Tile {
                y_start,
                x_start,
                y_end: (y_start + tile_size).min(h),
                x_end: (x_start + tile_size).min(w),
            });
        }
    }

    Ok(tiles)
}
