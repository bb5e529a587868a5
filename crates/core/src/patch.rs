//! Per-tile processing: extract, pad to the model's input size, invoke the
//! transform, and crop padding back out of the result.

use ndarray::{s, Array3};

use crate::error::PipelineError;
use crate::model::Transform;
use crate::tensor::CHANNELS;
use crate::tiles::Tile;

/// Map an out-of-range index back into `[0, len)` by symmetric reflection.
/// Handles padding wider than the source extent (tiny tiles against a
/// large tile size) by folding repeatedly.
fn mirror_index(i: usize, len: usize) -> usize {
    debug_assert!(len > 0);
    let period = 2 * len;
    let m = i % period;
    if m < len {
        m
    } else {
        period - 1 - m
    }
}

/// Reflect-pad a patch on the bottom/right to exactly `(target_h, target_w)`.
fn reflect_pad(patch: &Array3<f32>, target_h: usize, target_w: usize) -> Array3<f32> {
    let (c, h, w) = patch.dim();
    let mut padded = Array3::<f32>::zeros((c, target_h, target_w));
    for ch in 0..c {
        for y in 0..target_h {
            let src_y = mirror_index(y, h);
            for x in 0..target_w {
                padded[[ch, y, x]] = patch[[ch, src_y, mirror_index(x, w)]];
            }
        }
    }
    padded
}

/// Run one tile through the transform, producing the output-resolution
/// patch for that tile.
///
/// Tiles shorter than `tile_size` on either axis (image-edge case) are
/// reflect-padded so the transform always sees exactly
/// `tile_size × tile_size` input; the output is then cropped back to the
/// valid extents so padding never leaks into the reassembled image.
pub fn process_patch<T: Transform + ?Sized>(
    model: &T,
    source: &Array3<f32>,
    tile: &Tile,
    tile_size: usize,
) -> Result<Array3<f32>, PipelineError> {
    let valid_h = tile.height();
    let valid_w = tile.width();

    let patch = source
        .slice(s![
            ..CHANNELS,
            tile.y_start..tile.y_end,
            tile.x_start..tile.x_end
        ])
        .to_owned();

    let needs_pad = valid_h < tile_size || valid_w < tile_size;
    let input = if needs_pad {
        reflect_pad(&patch, tile_size, tile_size)
    } else {
        patch
    };

    let out = model.apply(&input)?;

    if needs_pad {
        let scale = model.scale_factor();
        Ok(out
            .slice(s![.., ..valid_h * scale, ..valid_w * scale])
            .to_owned())
    } else {
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::doubles::{AlwaysOom, NearestDouble};

    fn gradient_tensor(h: usize, w: usize) -> Array3<f32> {
        let mut tensor = Array3::<f32>::zeros((3, h, w));
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    tensor[[c, y, x]] = (c * h * w + y * w + x) as f32 / (3 * h * w) as f32;
                }
            }
        }
        tensor
    }

    #[test]
    fn test_mirror_index_folds() {
        assert_eq!(mirror_index(0, 4), 0);
        assert_eq!(mirror_index(3, 4), 3);
        assert_eq!(mirror_index(4, 4), 3);
        assert_eq!(mirror_index(5, 4), 2);
        assert_eq!(mirror_index(7, 4), 0);
        // Beyond one full reflection the pattern repeats.
        assert_eq!(mirror_index(8, 4), 0);
        assert_eq!(mirror_index(9, 4), 1);
        // Padding wider than the source: a 2-sample axis keeps alternating.
        assert_eq!(mirror_index(2, 2), 1);
        assert_eq!(mirror_index(3, 2), 0);
        assert_eq!(mirror_index(4, 2), 0);
    }

    #[test]
    fn test_interior_tile_no_padding() {
        let source = gradient_tensor(16, 16);
        let tile = Tile {
            y_start: 4,
            x_start: 4,
            y_end: 12,
            x_end: 12,
        };
        let model = NearestDouble::default();
        let out = process_patch(&model, &source, &tile, 8).unwrap();
        assert_eq!(out.dim(), (3, 16, 16));
        assert_eq!(out[[0, 0, 0]], source[[0, 4, 4]]);
        assert_eq!(out[[0, 15, 15]], source[[0, 11, 11]]);
    }

    #[test]
    fn test_short_tile_padded_then_cropped() {
        let source = gradient_tensor(10, 10);
        // Bottom-right corner tile of a small image: 6x6 valid extent
        // against an 8-pixel tile size.
        let tile = Tile {
            y_start: 4,
            x_start: 4,
            y_end: 10,
            x_end: 10,
        };
        let model = NearestDouble::default();
        let out = process_patch(&model, &source, &tile, 8).unwrap();
        // Cropped back to valid extents times the scale factor.
        assert_eq!(out.dim(), (3, 12, 12));
        assert_eq!(out[[0, 0, 0]], source[[0, 4, 4]]);
        assert_eq!(out[[0, 11, 11]], source[[0, 9, 9]]);
    }

    #[test]
    fn test_reflect_pad_values() {
        let patch = gradient_tensor(3, 2);
        let padded = reflect_pad(&patch, 5, 4);
        assert_eq!(padded.dim(), (3, 5, 4));
        // Bottom rows reflect upward: row 3 repeats row 2, row 4 row 1.
        assert_eq!(padded[[0, 3, 0]], patch[[0, 2, 0]]);
        assert_eq!(padded[[0, 4, 0]], patch[[0, 1, 0]]);
        // Right columns reflect leftward.
        assert_eq!(padded[[0, 0, 2]], patch[[0, 0, 1]]);
        assert_eq!(padded[[0, 0, 3]], patch[[0, 0, 0]]);
    }

    #[test]
    fn test_resource_exhaustion_propagates() {
        let source = gradient_tensor(8, 8);
        let tile = Tile {
            y_start: 0,
            x_start: 0,
            y_end: 8,
            x_end: 8,
        };
        let err = process_patch(&AlwaysOom, &source, &tile, 8)
            .err()
            .expect("should fail");
        assert!(matches!(err, PipelineError::ResourceExhausted(_)));
    }
}
