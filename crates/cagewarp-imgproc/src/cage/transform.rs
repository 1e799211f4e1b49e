use std::ops::AddAssign;

use cagewarp_image::{Image, ImageError, Rect};
use glam::DVec2;

use super::{
    coefficients::CoefficientMap,
    config::CageConfig,
    destination::compute_destination,
    error::CageError,
    rasterize::{Rasterizer, Triangle},
};
use crate::parallel::{self, ExecutionStrategy};

/// Subdivision depth at which a triangle is abandoned.
pub const DEFAULT_MAX_DEPTH: u32 = 6;

/// Largest deformed bounding box, in pixels, written without subdividing.
pub const DEFAULT_LEAF_EXTENT: i64 = 1;

/// Parameters of a cage transform pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CageTransformParams {
    /// Pre-fill the pixels inside the source cage with the first cage vertex
    /// instead of their own coordinate.
    pub fill_plain_color: bool,
    /// Subdivision depth at which a triangle is abandoned.
    pub max_depth: u32,
    /// Largest deformed bounding box, in pixels, written without subdividing.
    pub leaf_extent: i64,
    /// How the pass is spread over threads.
    pub strategy: ExecutionStrategy,
}

impl Default for CageTransformParams {
    fn default() -> Self {
        Self {
            fill_plain_color: false,
            max_depth: DEFAULT_MAX_DEPTH,
            leaf_extent: DEFAULT_LEAF_EXTENT,
            strategy: ExecutionStrategy::default(),
        }
    }
}

/// Counters of a cage transform pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CageTransformStats {
    /// Quads of the source grid whose origin lies inside the cage.
    pub interior_quads: usize,
    /// Pixels written by the rasterizer, overwrites included.
    pub pixels_written: usize,
    /// Triangles dropped at the depth guard.
    pub abandoned_triangles: usize,
}

impl AddAssign for CageTransformStats {
    fn add_assign(&mut self, other: Self) {
        self.interior_quads += other.interior_quads;
        self.pixels_written += other.pixels_written;
        self.abandoned_triangles += other.abandoned_triangles;
    }
}

/// Fill a coordinate image with the source position of every pixel of `region`.
///
/// The image is first pre-filled with the pixel coordinates (or, with
/// `fill_plain_color`, with the first cage vertex for pixels inside the source
/// cage). Then every unit quad of the source grid whose origin lies inside the
/// cage is split in two triangles, mapped to deformed space through the
/// coefficients and rasterized: the deformed pixels they cover receive the
/// source position they come from.
///
/// # Arguments
///
/// * `cage` - The cage configuration.
/// * `coefs` - The coefficient map, usually over [`CageConfig::bounding_box`].
/// * `region` - The output region, in deformed space.
/// * `dst` - The coordinate image, same size as `region`.
/// * `params` - The pass parameters.
///
/// # Returns
///
/// The counters of the pass.
///
/// # Errors
///
/// Inputs are validated before anything is written:
///
/// * The coefficients must be computed for the number of vertices of the cage.
/// * The output image must have the size of the region.
/// * The execution strategy and the leaf extent must be valid.
///
/// # Example
///
/// ```
/// use cagewarp_image::{Image, Rect};
/// use cagewarp_imgproc::cage::{cage_transform, compute_coefficients, CageConfig, CageTransformParams};
/// use glam::DVec2;
///
/// let cage = CageConfig::new(vec![
///     DVec2::new(0.0, 0.0),
///     DVec2::new(10.0, 0.0),
///     DVec2::new(10.0, 10.0),
///     DVec2::new(0.0, 10.0),
/// ]).unwrap();
///
/// let params = CageTransformParams::default();
/// let coefs = compute_coefficients(&cage, cage.bounding_box(), params.strategy).unwrap();
///
/// let region = Rect::new(0, 0, 12, 12);
/// let mut coords = Image::<f32, 2>::from_size_val(region.size(), 0.0).unwrap();
///
/// cage_transform(&cage, &coefs, region, &mut coords, &params).unwrap();
///
/// let p = coords.pixel(5, 5).unwrap();
/// assert!((p[0] - 5.0).abs() < 1e-3 && (p[1] - 5.0).abs() < 1e-3);
/// ```
pub fn cage_transform(
    cage: &CageConfig,
    coefs: &CoefficientMap,
    region: Rect,
    dst: &mut Image<f32, 2>,
    params: &CageTransformParams,
) -> Result<CageTransformStats, CageError> {
    if coefs.num_vertices() != cage.num_vertices() {
        return Err(CageError::CoefficientCountMismatch(
            coefs.num_vertices(),
            cage.num_vertices(),
        ));
    }

    if dst.size() != region.size() {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            region.width,
            region.height,
        )
        .into());
    }

    params.strategy.validate()?;

    if params.leaf_extent < 1 {
        return Err(CageError::InvalidLeafExtent(params.leaf_extent));
    }

    if region.is_empty() {
        log::debug!("cage transform: empty region {region}, nothing to do");
        return Ok(CageTransformStats::default());
    }

    let bbox = cage.bounding_box();
    log::debug!(
        "cage transform: {} vertices, region {region}, bounding box {bbox}, {:?}",
        cage.num_vertices(),
        params.strategy
    );

    prefill(cage, region, dst, params)?;

    let lattice = destination_lattice(cage, coefs, bbox, params.strategy)?;
    let quads = interior_quads(cage, bbox);

    let row_len = 2 * region.width;
    let results = parallel::map_row_chunks_mut(
        dst.as_slice_mut(),
        row_len,
        params.strategy.rows_per_band(region.height),
        params.strategy,
        |first_row, band| -> Result<CageTransformStats, ImageError> {
            let band_rect = Rect::new(
                region.x,
                region.y + first_row as i64,
                region.width,
                band.len() / row_len,
            );
            let mut raster = Rasterizer::new(band_rect, band, params.max_depth, params.leaf_extent)?;

            for &(i, j) in quads.iter() {
                let (upper, lower) = quad_triangles(&lattice, bbox, i, j);
                raster.rasterize(&upper);
                raster.rasterize(&lower);
            }

            Ok(raster.stats())
        },
    )?;

    let mut stats = CageTransformStats {
        interior_quads: quads.len(),
        ..Default::default()
    };
    for band_stats in results {
        stats += band_stats?;
    }

    if stats.abandoned_triangles > 0 {
        log::warn!(
            "cage transform abandoned {} triangles at depth {}",
            stats.abandoned_triangles,
            params.max_depth
        );
    }
    log::debug!("cage transform done: {stats:?}");

    Ok(stats)
}

/// Write the value every pixel has when no triangle covers it.
fn prefill(
    cage: &CageConfig,
    region: Rect,
    dst: &mut Image<f32, 2>,
    params: &CageTransformParams,
) -> Result<(), CageError> {
    let first = cage.vertices()[0];
    let plain = [first.x.trunc() as f32, first.y.trunc() as f32];
    let row_len = 2 * region.width;

    parallel::map_row_chunks_mut(
        dst.as_slice_mut(),
        row_len,
        params.strategy.rows_per_task(region.height),
        params.strategy,
        |first_row, rows| {
            for (r, row) in rows.chunks_exact_mut(row_len).enumerate() {
                let y = region.y + (first_row + r) as i64;
                for (c, px) in row.chunks_exact_mut(2).enumerate() {
                    let x = region.x + c as i64;
                    if params.fill_plain_color && cage.point_inside(x as f64, y as f64) {
                        px.copy_from_slice(&plain);
                    } else {
                        px.copy_from_slice(&[x as f32, y as f32]);
                    }
                }
            }
        },
    )?;

    Ok(())
}

/// Deformed position of every pixel of `bbox`, row major.
fn destination_lattice(
    cage: &CageConfig,
    coefs: &CoefficientMap,
    bbox: Rect,
    strategy: ExecutionStrategy,
) -> Result<Vec<DVec2>, CageError> {
    let mut lattice = vec![DVec2::ZERO; bbox.width * bbox.height];

    parallel::map_row_chunks_mut(
        &mut lattice,
        bbox.width,
        strategy.rows_per_task(bbox.height),
        strategy,
        |first_row, rows| {
            for (r, row) in rows.chunks_exact_mut(bbox.width).enumerate() {
                let y = (bbox.y + (first_row + r) as i64) as f64;
                for (c, p) in row.iter_mut().enumerate() {
                    let x = (bbox.x + c as i64) as f64;
                    *p = compute_destination(cage, coefs, DVec2::new(x, y));
                }
            }
        },
    )?;

    Ok(lattice)
}

/// Grid offsets `(i, j)` of the quads whose origin lies inside the cage, in walk order.
fn interior_quads(cage: &CageConfig, bbox: Rect) -> Vec<(usize, usize)> {
    let mut quads = Vec::new();
    for i in 0..bbox.width.saturating_sub(1) {
        for j in 0..bbox.height.saturating_sub(1) {
            let x = (bbox.x + i as i64) as f64;
            let y = (bbox.y + j as i64) as f64;
            if cage.point_inside(x, y) {
                quads.push((i, j));
            }
        }
    }
    quads
}

/// The triangles `(p1, p2, p3)` and `(p1, p3, p4)` of the quad at `(i, j)`.
fn quad_triangles(lattice: &[DVec2], bbox: Rect, i: usize, j: usize) -> (Triangle, Triangle) {
    let w = bbox.width;
    let x = (bbox.x + i as i64) as f64;
    let y = (bbox.y + j as i64) as f64;

    let s1 = DVec2::new(x, y);
    let s2 = DVec2::new(x + 1.0, y);
    let s3 = DVec2::new(x + 1.0, y + 1.0);
    let s4 = DVec2::new(x, y + 1.0);

    let d1 = lattice[j * w + i];
    let d2 = lattice[j * w + i + 1];
    let d3 = lattice[(j + 1) * w + i + 1];
    let d4 = lattice[(j + 1) * w + i];

    (
        Triangle::new([s1, s2, s3], [d1, d2, d3]),
        Triangle::new([s1, s3, s4], [d1, d3, d4]),
    )
}
