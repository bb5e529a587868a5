//! End-to-end pipeline tests against a trivial transform double.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Array3;

use tilescale_core::blend::BlendCanvas;
use tilescale_core::config::UpscaleConfig;
use tilescale_core::error::TransformError;
use tilescale_core::mask::gradient_mask;
use tilescale_core::model::Transform;
use tilescale_core::tiles::tile_origins;
use tilescale_core::upscale::Upscaler;

/// Nearest-neighbor 2× duplication with a shared invocation counter, so
/// tests can keep observing call counts after the model moves into the
/// upscaler.
#[derive(Default)]
struct NearestDouble {
    calls: Arc<AtomicUsize>,
}

impl Transform for NearestDouble {
    fn apply(&self, tile: &Array3<f32>) -> Result<Array3<f32>, TransformError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let (c, h, w) = tile.dim();
        let mut out = Array3::<f32>::zeros((c, h * 2, w * 2));
        for ch in 0..c {
            for y in 0..h * 2 {
                for x in 0..w * 2 {
                    out[[ch, y, x]] = tile[[ch, y / 2, x / 2]];
                }
            }
        }
        Ok(out)
    }
}

fn synthetic_image(h: usize, w: usize) -> Array3<f32> {
    let mut tensor = Array3::<f32>::zeros((3, h, w));
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                tensor[[c, y, x]] = ((x * 7 + y * 13 + c * 101) % 511) as f32 / 255.0 - 1.0;
            }
        }
    }
    tensor
}

fn config(tile_size: usize, overlap: usize, scale: f64) -> UpscaleConfig {
    UpscaleConfig {
        tile_size,
        overlap,
        scale,
        ..Default::default()
    }
}

#[test]
fn large_image_single_doubling_pass() {
    let model = NearestDouble::default();
    let upscaler = Upscaler::new(model, config(512, 32, 2.0)).unwrap();

    let out = upscaler.run(synthetic_image(1024, 1024)).unwrap();
    assert_eq!(out.dim(), (3, 2048, 2048));
}

#[test]
fn large_image_transform_called_once_per_tile() {
    // 1024 with stride 480 gives origins {0, 480, 512} per axis after the
    // edge pull-back: nine tiles, one chunked pass, no loop overrun.
    let tiles = tile_origins(1024, 1024, 512, 32).unwrap();
    assert_eq!(tiles.len(), 9);

    let model = NearestDouble::default();
    let calls = Arc::clone(&model.calls);
    let upscaler = Upscaler::new(model, config(512, 32, 2.0)).unwrap();
    let _ = upscaler.run(synthetic_image(1024, 1024)).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), tiles.len());
}

#[test]
fn chunked_pass_covers_every_output_pixel() {
    let scale = 2;
    let (h, w) = (1024usize, 640usize);
    let overlap = 32usize;
    let tiles = tile_origins(h, w, 512, overlap).unwrap();

    let mut canvas = BlendCanvas::new(h * scale, w * scale);
    for tile in &tiles {
        let out_h = tile.height() * scale;
        let out_w = tile.width() * scale;
        // All-ones masks isolate geometric coverage from ramp weighting.
        let ones = gradient_mask(out_h, out_w, 0);
        canvas.accumulate(&ones, &ones, tile.y_start * scale, tile.x_start * scale);
    }
    assert!(canvas.fully_covered());
}

#[test]
fn zero_overlap_matches_untiled_result_exactly() {
    let image = synthetic_image(1024, 1024);
    let direct = NearestDouble::default().apply(&image).unwrap();

    let upscaler = Upscaler::new(NearestDouble::default(), config(512, 0, 2.0)).unwrap();
    let chunked = upscaler.run(image).unwrap();

    assert_eq!(chunked.dim(), direct.dim());
    for (a, b) in chunked.iter().zip(direct.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn overlapping_tiles_blend_seamlessly() {
    let image = synthetic_image(700, 700);
    let direct = NearestDouble::default().apply(&image).unwrap();

    let upscaler = Upscaler::new(NearestDouble::default(), config(512, 32, 2.0)).unwrap();
    let chunked = upscaler.run(image).unwrap();

    // Interior comparison: the blending ramp is exactly zero at the image
    // border, so the outermost pixel frame normalizes to the guard value.
    let (_, out_h, out_w) = chunked.dim();
    for c in 0..3 {
        for y in 1..out_h - 1 {
            for x in 1..out_w - 1 {
                let a = chunked[[c, y, x]];
                let b = direct[[c, y, x]];
                assert!(
                    (a - b).abs() < 1e-5,
                    "seam artifact at ({c},{y},{x}): {a} vs {b}"
                );
            }
        }
    }
}

#[test]
fn small_image_skips_tiling() {
    let model = NearestDouble::default();
    let calls = Arc::clone(&model.calls);
    let upscaler = Upscaler::new(model, config(512, 32, 2.0)).unwrap();

    let out = upscaler.run(synthetic_image(300, 300)).unwrap();
    assert_eq!(out.dim(), (3, 600, 600));
    // Exactly one whole-image invocation, never the tiled path.
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn fractional_scale_doubles_past_target_then_resamples() {
    let upscaler = Upscaler::new(NearestDouble::default(), config(512, 32, 3.0)).unwrap();
    let out = upscaler.run(synthetic_image(200, 200)).unwrap();
    // Two doublings reach 4.0x; the final resample lands on exactly 3x.
    assert_eq!(out.dim(), (3, 600, 600));
}

#[test]
fn internal_super_scale_downsamples_back_to_target() {
    let upscaler = Upscaler::new(
        NearestDouble::default(),
        UpscaleConfig {
            tile_size: 512,
            overlap: 32,
            scale: 2.0,
            internal_scale: Some(4.0),
            ..Default::default()
        },
    )
    .unwrap();
    let out = upscaler.run(synthetic_image(128, 96)).unwrap();
    assert_eq!(out.dim(), (3, 256, 192));
}
