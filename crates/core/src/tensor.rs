//! Image tensor conversions: interleaved RGB8 ↔ planar CHW float.
//!
//! The pipeline operates on `ndarray::Array3<f32>` with shape `(3, H, W)`
//! and values normalized to [-1, 1] (mean 0.5 / std 0.5 over the [0, 1]
//! byte range — the same normalization the model was trained with).

use anyhow::{bail, Result};
use ndarray::Array3;

/// All pipeline tensors are 3-channel RGB.
pub const CHANNELS: usize = 3;

/// Convert interleaved HWC RGB bytes to a planar `(3, H, W)` tensor in [-1, 1].
pub fn from_rgb8(data: &[u8], width: u32, height: u32) -> Result<Array3<f32>> {
    let h = height as usize;
    let w = width as usize;

    if data.len() != h * w * CHANNELS {
        bail!(
            "RGB data length mismatch: expected {} ({}x{}x3), got {}",
            h * w * CHANNELS,
            h,
            w,
            data.len()
        );
    }

    let mut tensor = Array3::<f32>::zeros((CHANNELS, h, w));
    let hw = h * w;
    let slice = tensor.as_slice_mut().expect("freshly allocated tensor is contiguous");

    for i in 0..hw {
        let src = i * 3;
        slice[i] = data[src] as f32 / 255.0 * 2.0 - 1.0;
        slice[hw + i] = data[src + 1] as f32 / 255.0 * 2.0 - 1.0;
        slice[2 * hw + i] = data[src + 2] as f32 / 255.0 * 2.0 - 1.0;
    }

    Ok(tensor)
}

/// Convert a planar `(3, H, W)` tensor in [-1, 1] back to interleaved RGB8,
/// denormalizing and clamping each sample.
pub fn to_rgb8(tensor: &Array3<f32>) -> Vec<u8> {
    let (_, h, w) = tensor.dim();
    let hw = h * w;

    let owned_contig;
    let slice = if let Some(s) = tensor.as_slice() {
        s
    } else {
        owned_contig = tensor.as_standard_layout().into_owned();
        owned_contig.as_slice().expect("standard layout is contiguous")
    };

    let mut rgb = vec![0u8; hw * 3];
    for i in 0..hw {
        let r = (slice[i] * 0.5 + 0.5).clamp(0.0, 1.0);
        let g = (slice[hw + i] * 0.5 + 0.5).clamp(0.0, 1.0);
        let b = (slice[2 * hw + i] * 0.5 + 0.5).clamp(0.0, 1.0);
        rgb[i * 3] = (r * 255.0).round() as u8;
        rgb[i * 3 + 1] = (g * 255.0).round() as u8;
        rgb[i * 3 + 2] = (b * 255.0).round() as u8;
    }
    rgb
}
