//! Tiled super-resolution pipeline: partition, transform, blend, resample.

pub mod backend;
pub mod blend;
pub mod config;
pub mod error;
pub mod mask;
pub mod model;
pub mod patch;
pub mod resample;
pub mod tensor;
pub mod tiles;
pub mod upscale;
