//! Pixel interpolation methods for resampling images.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels
//!
//! The cage transform produces an absolute coordinate map; [`remap_absolute`]
//! turns that map and a source image into the warped image.

mod bilinear;
mod interpolate;
mod nearest;
mod remap;

pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use remap::remap_absolute;
