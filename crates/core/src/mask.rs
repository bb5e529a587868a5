//! Gradient weight masks for blending overlapping tile outputs.
//!
//! Weight ramps from 0 at the tile edge up to 1 over `overlap` samples, so
//! only the overlap band is feathered and tile interiors keep full weight.
//! The 2-D mask is the outer product of the two axis ramps, which gives
//! corners the lowest weight.

use ndarray::Array3;

use crate::tensor::CHANNELS;

/// Inclusive-endpoint linear ramp, matching `linspace(start, end, n)`.
fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n).map(|i| start + step * i as f32).collect()
        }
    }
}

/// One axis of the blending ramp: 0→1 over the first `overlap` samples,
/// 1→0 over the last `overlap`, 1 in between. An axis no longer than the
/// overlap band collapses to a constant 0.5 — the two edge ramps would
/// collide, so every sample is weighted equally instead.
fn axis_ramp(len: usize, overlap: usize) -> Vec<f32> {
    if len <= overlap {
        return vec![0.5; len];
    }

    let mut ramp = vec![1.0f32; len];
    ramp[..overlap].copy_from_slice(&linspace(0.0, 1.0, overlap));
    ramp[len - overlap..].copy_from_slice(&linspace(1.0, 0.0, overlap));
    ramp
}

/// Build a `(3, height, width)` blending weight field for one transformed
/// tile. `overlap` is measured in output pixels. All values are in [0, 1];
/// `overlap == 0` yields an all-ones mask (no blending needed).
pub fn gradient_mask(height: usize, width: usize, overlap: usize) -> Array3<f32> {
    if overlap == 0 {
        return Array3::from_elem((CHANNELS, height, width), 1.0);
    }

    let v_ramp = axis_ramp(height, overlap);
    let h_ramp = axis_ramp(width, overlap);

    let mut mask = Array3::<f32>::zeros((CHANNELS, height, width));
    for y in 0..height {
        for x in 0..width {
            let weight = v_ramp[y] * h_ramp[x];
            for c in 0..CHANNELS {
                mask[[c, y, x]] = weight;
            }
        }
    }
    mask
}
