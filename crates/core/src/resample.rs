//! Exact-resolution resampling for the final output step.
//!
//! The doubling loop can overshoot the requested scale (internal
//! super-scale), so the last step resamples to the exact target pixel
//! dimensions with a separable Catmull-Rom filter. When downsampling, the
//! kernel support widens by the scale ratio so the filter also antialiases.

use ndarray::Array3;

use crate::tensor::CHANNELS;

/// Catmull-Rom cubic kernel (a = -0.5), support 2.
fn catmull_rom(x: f32) -> f32 {
    let x = x.abs();
    if x < 1.0 {
        1.5 * x * x * x - 2.5 * x * x + 1.0
    } else if x < 2.0 {
        -0.5 * x * x * x + 2.5 * x * x - 4.0 * x + 2.0
    } else {
        0.0
    }
}

/// Precomputed contribution window for one output sample along one axis.
struct AxisWeights {
    start: usize,
    weights: Vec<f32>,
}

/// Build per-output-sample filter windows for resampling `in_len → out_len`.
/// Source indices past the edges are clamped; each window is normalized to
/// sum to 1 so flat regions stay flat.
fn axis_weights(in_len: usize, out_len: usize) -> Vec<AxisWeights> {
    // Widen the kernel when shrinking so it low-passes before sampling.
    let ratio = in_len as f32 / out_len as f32;
    let filter_scale = ratio.max(1.0);
    let support = 2.0 * filter_scale;

    (0..out_len)
        .map(|o| {
            let center = (o as f32 + 0.5) * ratio - 0.5;
            let lo = (center - support).floor().max(0.0) as usize;
            let hi = ((center + support).ceil() as usize).min(in_len - 1);

            let mut weights: Vec<f32> = (lo..=hi)
                .map(|i| catmull_rom((i as f32 - center) / filter_scale))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum != 0.0 {
                for w in &mut weights {
                    *w /= sum;
                }
            }
            AxisWeights { start: lo, weights }
        })
        .collect()
}

/// Resample a `(3, H, W)` tensor to exactly `(out_h, out_w)`.
/// Pass-through when the shape already matches.
pub fn resample_to(tensor: Array3<f32>, out_h: usize, out_w: usize) -> Array3<f32> {
    let (_, in_h, in_w) = tensor.dim();
    if in_h == out_h && in_w == out_w {
        return tensor;
    }

    let h_windows = axis_weights(in_w, out_w);
    let v_windows = axis_weights(in_h, out_h);

    // Horizontal pass, then vertical.
    let mut horizontal = Array3::<f32>::zeros((CHANNELS, in_h, out_w));
    for c in 0..CHANNELS {
        for y in 0..in_h {
            for (x, window) in h_windows.iter().enumerate() {
                let mut acc = 0.0;
                for (k, &w) in window.weights.iter().enumerate() {
                    acc += w * tensor[[c, y, window.start + k]];
                }
                horizontal[[c, y, x]] = acc;
            }
        }
    }

    let mut out = Array3::<f32>::zeros((CHANNELS, out_h, out_w));
    for c in 0..CHANNELS {
        for (y, window) in v_windows.iter().enumerate() {
            for x in 0..out_w {
                let mut acc = 0.0;
                for (k, &w) in window.weights.iter().enumerate() {
                    acc += w * horizontal[[c, window.start + k, x]];
                }
                out[[c, y, x]] = acc;
            }
        }
    }
    out
}
