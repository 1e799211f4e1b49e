#![deny(missing_docs)]
//! Image and region types for generating and manipulating images

/// image representation for computer vision purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// integer pixel regions.
pub mod rect;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
pub use crate::rect::Rect;
