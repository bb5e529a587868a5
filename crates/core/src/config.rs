//! Pipeline configuration: tile geometry, scale targets, device selection.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::Device;
use crate::error::PipelineError;

pub const DEFAULT_TILE_SIZE: usize = 512;
pub const DEFAULT_OVERLAP: usize = 32;
pub const DEFAULT_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpscaleConfig {
    /// Model input size for chunking. Images larger than this on either
    /// axis take the tiled path.
    pub tile_size: usize,
    /// Pixel width of the band shared between adjacent tiles.
    pub overlap: usize,
    /// Final output scale factor.
    pub scale: f64,
    /// Internal doubling target for anti-aliasing; clamped up to `scale`
    /// when smaller, defaults to `scale` when absent.
    pub internal_scale: Option<f64>,
    pub device: Device,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            overlap: DEFAULT_OVERLAP,
            scale: DEFAULT_SCALE,
            internal_scale: None,
            device: Device::default(),
        }
    }
}

impl UpscaleConfig {
    /// Load overrides from a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Reject configurations that could never make progress. Called before
    /// any tile work starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.tile_size == 0 {
            return Err(PipelineError::Configuration(
                "tile_size must be positive".to_string(),
            ));
        }
        if self.overlap >= self.tile_size {
            return Err(PipelineError::Configuration(format!(
                "overlap ({}) must be smaller than tile_size ({})",
                self.overlap, self.tile_size
            )));
        }
        if self.scale <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if let Some(internal) = self.internal_scale {
            if internal <= 0.0 {
                return Err(PipelineError::Configuration(format!(
                    "internal_scale must be positive, got {internal}"
                )));
            }
        }
        Ok(())
    }

    /// The doubling target actually driven by the scale loop: never below
    /// the requested output scale.
    pub fn effective_internal_scale(&self) -> f64 {
        self.internal_scale.unwrap_or(self.scale).max(self.scale)
    }
}
