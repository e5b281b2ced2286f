//! # Rendering
//!
//! - [`dither`]: image decoding, scaling and 1-bit conversion

pub mod dither;

pub use dither::{Raster, rasterize};
