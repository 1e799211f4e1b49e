//! Cage based image deformation.
//!
//! A cage is a closed polygon drawn over the image. Moving its vertices
//! deforms everything inside it. The pipeline is:
//!
//! 1. [`compute_coefficients`] expresses every pixel of the source cage as a
//!    weighting of the cage vertices and edges.
//! 2. [`compute_destination`] moves a source point with the deformed cage.
//! 3. [`cage_transform`] inverts that mapping: for every output pixel it finds
//!    the source position it comes from, by rasterizing the deformed grid.
//! 4. [`cage_warp`] samples the source image at those positions.

mod coefficients;
mod config;
mod destination;
mod error;
mod rasterize;
mod transform;
mod warp;

pub use coefficients::{compute_coefficients, CoefficientMap};
pub use config::{CageConfig, CageOutline};
pub use destination::compute_destination;
pub use error::CageError;
pub use rasterize::{barycentric, Rasterizer, Triangle};
pub use transform::{
    cage_transform, CageTransformParams, CageTransformStats, DEFAULT_LEAF_EXTENT,
    DEFAULT_MAX_DEPTH,
};
pub use warp::cage_warp;
