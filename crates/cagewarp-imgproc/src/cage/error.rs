use cagewarp_image::ImageError;

use crate::parallel::ParallelError;

/// Errors raised while building a cage or validating the inputs of a cage pass.
///
/// The transform itself never fails on geometry: degenerate or extreme cages
/// only degrade the result locally.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CageError {
    /// A cage needs at least three vertices.
    #[error("a cage needs at least 3 vertices, got {0}")]
    NotEnoughVertices(usize),

    /// The source and the deformed outlines differ in length.
    #[error("source cage has {0} vertices but the deformed cage has {1}")]
    VertexCountMismatch(usize, usize),

    /// A vertex coordinate is NaN or infinite.
    #[error("cage vertex {0} has a non finite coordinate")]
    NonFiniteVertex(usize),

    /// Two consecutive source vertices coincide.
    #[error("source cage edge {0} has zero length")]
    DegenerateEdge(usize),

    /// A vertex index is out of bounds.
    #[error("vertex index ({0}) is out of bounds ({1})")]
    VertexIndexOutOfBounds(usize, usize),

    /// The coefficient map was computed for a different number of vertices.
    #[error("coefficient map holds coefficients for {0} vertices but the cage has {1}")]
    CoefficientCountMismatch(usize, usize),

    /// The coefficient data does not match the map size.
    #[error("coefficient data length ({0}) does not match the map size ({1})")]
    InvalidCoefficientLength(usize, usize),

    /// The leaf extent of the rasterizer must cover at least one pixel.
    #[error("leaf extent must be >= 1, got {0}")]
    InvalidLeafExtent(i64),

    /// Error related to the images.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error related to the parallel execution.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
