//! The scale controller: drives repeated 2× doubling until the internal
//! scale target is reached, then resamples to the exact requested size.
//!
//! Each iteration decides between a direct whole-image transform call and
//! the chunked path (partition → per-tile transform → weighted blend)
//! based on whether either spatial dimension exceeds the tile size. The
//! loop is an explicit `while` with an auditable exit predicate, never
//! recursion.

use ndarray::Array3;
use tracing::{debug, info};

use crate::blend::BlendCanvas;
use crate::config::UpscaleConfig;
use crate::error::PipelineError;
use crate::mask::gradient_mask;
use crate::model::Transform;
use crate::patch::process_patch;
use crate::resample::resample_to;
use crate::tiles::tile_origins;

pub struct Upscaler<T: Transform> {
    model: T,
    config: UpscaleConfig,
}

impl<T: Transform> Upscaler<T> {
    /// Validates the configuration eagerly; no work starts with a tiling
    /// that could not advance.
    pub fn new(model: T, config: UpscaleConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &UpscaleConfig {
        &self.config
    }

    /// Upscale `image` to `scale ×` its original dimensions.
    ///
    /// Doubles until `current_scale >= effective_internal_scale()`, then
    /// resamples to the exact target size. Any transform failure aborts
    /// the whole operation; no partially blended image is ever returned.
    pub fn run(&self, image: Array3<f32>) -> Result<Array3<f32>, PipelineError> {
        let (_, orig_h, orig_w) = image.dim();
        let target_scale = self.config.scale;
        let internal_scale = self.config.effective_internal_scale();

        let mut tensor = image;
        let mut current_scale = 1.0f64;

        while current_scale < internal_scale {
            info!(
                from = current_scale,
                to = current_scale * 2.0,
                "Upscaling"
            );

            let (_, h, w) = tensor.dim();
            let use_chunking = h > self.config.tile_size || w > self.config.tile_size;

            tensor = if use_chunking {
                debug!(width = w, height = h, "Image chunking enabled");
                self.process_chunked(&tensor)?
            } else {
                debug!(width = w, height = h, "Processing full image");
                self.model.apply(&tensor)?
            };

            current_scale *= 2.0;
        }

        if current_scale != target_scale {
            let final_h = (orig_h as f64 * target_scale) as usize;
            let final_w = (orig_w as f64 * target_scale) as usize;
            info!(
                from = current_scale,
                to = target_scale,
                final_w,
                final_h,
                "Resampling to exact target size"
            );
            tensor = resample_to(tensor, final_h, final_w);
        }

        Ok(tensor)
    }

    /// One chunked pass: split into overlapping tiles, transform each,
    /// and reassemble with gradient-weighted blending.
    fn process_chunked(&self, tensor: &Array3<f32>) -> Result<Array3<f32>, PipelineError> {
        let (_, h, w) = tensor.dim();
        let scale = self.model.scale_factor();
        let tile_size = self.config.tile_size;
        let overlap = self.config.overlap;

        let tiles = tile_origins(h, w, tile_size, overlap)?;
        debug!(tiles = tiles.len(), tile_size, overlap, "Starting chunked pass");

        let mut canvas = BlendCanvas::new(h * scale, w * scale);

        for tile in &tiles {
            let out_patch = process_patch(&self.model, tensor, tile, tile_size)?;
            let (_, patch_h, patch_w) = out_patch.dim();
            let mask = gradient_mask(patch_h, patch_w, overlap * scale);
            canvas.accumulate(&out_patch, &mask, tile.y_start * scale, tile.x_start * scale);
        }

        Ok(canvas.normalize())
    }
}
