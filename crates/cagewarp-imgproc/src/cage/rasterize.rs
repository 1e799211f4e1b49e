use cagewarp_image::{ImageError, Rect};
use glam::DVec2;

use super::transform::CageTransformStats;

// Pixel boxes are computed inside this range so their extents fit in an i64.
const COORD_MIN: DVec2 = DVec2::splat(i32::MIN as f64);
const COORD_MAX: DVec2 = DVec2::splat(i32::MAX as f64);

/// A triangle given both in source space and in deformed space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// The vertices in source space.
    pub src: [DVec2; 3],
    /// The same vertices in deformed space.
    pub dst: [DVec2; 3],
}

impl Triangle {
    /// Create a new triangle pair.
    pub fn new(src: [DVec2; 3], dst: [DVec2; 3]) -> Self {
        Self { src, dst }
    }

    /// Split the triangle at its edge midpoints, in both spaces.
    ///
    /// # Returns
    ///
    /// The three corner triangles and the centre one, in the order
    /// `(1, 12, 31)`, `(12, 2, 23)`, `(12, 23, 31)`, `(31, 23, 3)`.
    pub fn subdivide(&self) -> [Triangle; 4] {
        let mid = |p: [DVec2; 3]| {
            [
                (p[0] + p[1]) * 0.5,
                (p[1] + p[2]) * 0.5,
                (p[2] + p[0]) * 0.5,
            ]
        };
        let [s1, s2, s3] = self.src;
        let [d1, d2, d3] = self.dst;
        let [s12, s23, s31] = mid(self.src);
        let [d12, d23, d31] = mid(self.dst);

        [
            Triangle::new([s1, s12, s31], [d1, d12, d31]),
            Triangle::new([s12, s2, s23], [d12, d2, d23]),
            Triangle::new([s12, s23, s31], [d12, d23, d31]),
            Triangle::new([s31, s23, s3], [d31, d23, d3]),
        ]
    }
}

/// Barycentric weights of `p` relative to the triangle `t`.
///
/// Returns `None` when the triangle has no area.
pub fn barycentric(t: &[DVec2; 3], p: DVec2) -> Option<(f64, f64, f64)> {
    let [p1, p2, p3] = *t;
    let denom = (p2.x - p1.x) * p3.y + (p1.x - p3.x) * p2.y + (p3.x - p2.x) * p1.y;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let a = ((p2.x - p.x) * p3.y + (p.x - p3.x) * p2.y + (p3.x - p2.x) * p.y) / denom;
    let b = -((p1.x - p.x) * p3.y + (p.x - p3.x) * p1.y + (p3.x - p1.x) * p.y) / denom;
    let c = 1.0 - a - b;

    Some((a, b, c))
}

/// Whether the weights describe a point of the closed triangle, for either winding.
fn same_sign(a: f64, b: f64, c: f64) -> bool {
    (a >= 0.0 && b >= 0.0 && c >= 0.0) || (a <= 0.0 && b <= 0.0 && c <= 0.0)
}

/// Writes interpolated source coordinates of triangles into a region.
///
/// The output buffer holds two values `(x, y)` per pixel of the region, row
/// major. A triangle is split in four until its deformed bounding box spans at
/// most `leaf_extent` pixels, then the covered pixels receive the source
/// coordinate interpolated with barycentric weights.
pub struct Rasterizer<'a> {
    region: Rect,
    out: &'a mut [f32],
    max_depth: u32,
    leaf_extent: i64,
    stats: CageTransformStats,
}

impl<'a> Rasterizer<'a> {
    /// Create a rasterizer writing into `out`.
    ///
    /// # Arguments
    ///
    /// * `region` - The output region, in deformed space.
    /// * `out` - The output buffer, `2 * region.width * region.height` values.
    /// * `max_depth` - The subdivision depth at which triangles are abandoned.
    /// * `leaf_extent` - The largest bounding box, in pixels, written without subdividing.
    ///
    /// # Errors
    ///
    /// The buffer length must match the region.
    pub fn new(
        region: Rect,
        out: &'a mut [f32],
        max_depth: u32,
        leaf_extent: i64,
    ) -> Result<Self, ImageError> {
        let expected = region.width * region.height * 2;
        if out.len() != expected {
            return Err(ImageError::InvalidChannelShape(out.len(), expected));
        }

        Ok(Self {
            region,
            out,
            max_depth,
            leaf_extent: leaf_extent.max(1),
            stats: CageTransformStats::default(),
        })
    }

    /// Counters accumulated so far. `interior_quads` is left to the caller.
    pub fn stats(&self) -> CageTransformStats {
        self.stats
    }

    /// Rasterize a top level triangle.
    pub fn rasterize(&mut self, triangle: &Triangle) {
        self.rasterize_at(triangle, 0);
    }

    fn rasterize_at(&mut self, t: &Triangle, depth: u32) {
        let d = &t.dst;
        if d.iter().any(|p| !p.is_finite()) {
            return;
        }

        let r = &self.region;
        let (rx0, ry0) = (r.x as f64, r.y as f64);
        let (rx1, ry1) = (r.right() as f64, r.bottom() as f64);
        if d.iter().all(|p| p.x < rx0)
            || d.iter().all(|p| p.x > rx1)
            || d.iter().all(|p| p.y < ry0)
            || d.iter().all(|p| p.y > ry1)
        {
            return;
        }

        let min = d[0].min(d[1]).min(d[2]).floor().clamp(COORD_MIN, COORD_MAX);
        let max = d[0].max(d[1]).max(d[2]).floor().clamp(COORD_MIN, COORD_MAX);
        let (xmin, ymin) = (min.x as i64, min.y as i64);
        let (xmax, ymax) = (max.x as i64, max.y as i64);

        if xmin == xmax || ymin == ymax {
            return;
        }

        if depth >= self.max_depth {
            self.stats.abandoned_triangles += 1;
            return;
        }

        if xmax - xmin <= self.leaf_extent && ymax - ymin <= self.leaf_extent {
            let scan = Rect::new(
                xmin + 1,
                ymin + 1,
                (xmax - xmin) as usize,
                (ymax - ymin) as usize,
            );
            let Some(scan) = scan.intersect(&self.region) else {
                return;
            };
            for y in scan.y..scan.bottom() {
                for x in scan.x..scan.right() {
                    self.write_pixel(t, x, y);
                }
            }
            return;
        }

        for child in t.subdivide().iter() {
            self.rasterize_at(child, depth + 1);
        }
    }

    fn write_pixel(&mut self, t: &Triangle, x: i64, y: i64) {
        let Some((a, b, c)) = barycentric(&t.dst, DVec2::new(x as f64, y as f64)) else {
            return;
        };
        if !same_sign(a, b, c) || !self.region.contains(x, y) {
            return;
        }

        let src = a * t.src[0] + b * t.src[1] + c * t.src[2];
        let col = (x - self.region.x) as usize;
        let row = (y - self.region.y) as usize;
        let idx = (row * self.region.width + col) * 2;
        self.out[idx] = src.x as f32;
        self.out[idx + 1] = src.y as f32;
        self.stats.pixels_written += 1;
    }
}
