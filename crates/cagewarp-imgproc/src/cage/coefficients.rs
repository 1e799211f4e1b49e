use std::f64::consts::PI;

use cagewarp_image::Rect;
use glam::DVec2;

use super::{config::CageConfig, error::CageError};
use crate::parallel::{self, ExecutionStrategy};

/// Relative tolerance under which a point is considered to lie on an edge line.
const COLLINEAR_EPS: f64 = 1e-9;

/// Per pixel cage coefficients over a rectangle of source space.
///
/// Every pixel holds `2 * N` values for a cage of `N` vertices: the `N`
/// vertex weights followed by the `N` edge weights.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientMap {
    rect: Rect,
    num_vertices: usize,
    data: Vec<f32>,
}

impl CoefficientMap {
    /// Create a map from raw coefficients stored row-major.
    ///
    /// # Errors
    ///
    /// The data length must be `rect.width * rect.height * 2 * num_vertices`.
    pub fn new(rect: Rect, num_vertices: usize, data: Vec<f32>) -> Result<Self, CageError> {
        let expected = rect.width * rect.height * 2 * num_vertices;
        if data.len() != expected {
            return Err(CageError::InvalidCoefficientLength(data.len(), expected));
        }

        Ok(Self {
            rect,
            num_vertices,
            data,
        })
    }

    /// Create a map filled with zeros.
    pub fn zeros(rect: Rect, num_vertices: usize) -> Self {
        Self {
            rect,
            num_vertices,
            data: vec![0.0; rect.width * rect.height * 2 * num_vertices],
        }
    }

    /// Source rectangle covered by the map.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Number of cage vertices the coefficients are made for.
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of coefficients per pixel.
    pub fn num_channels(&self) -> usize {
        2 * self.num_vertices
    }

    /// The raw coefficients.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The coefficients of the pixel `(x, y)`, `None` outside the map.
    pub fn coefficients_at(&self, x: i64, y: i64) -> Option<&[f32]> {
        let offset = self.offset(x, y)?;
        Some(&self.data[offset..offset + self.num_channels()])
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let col = (x - self.rect.x) as usize;
        let row = (y - self.rect.y) as usize;
        Some((row * self.rect.width + col) * self.num_channels())
    }
}

/// Compute the Green coordinates of every pixel of `rect` relative to the
/// source outline of the cage.
///
/// Combined with the deformed outline, the deformed normals and the scaling
/// factors of the cage, these coefficients reproduce any similarity transform
/// of the cage exactly.
///
/// # Arguments
///
/// * `cage` - The cage configuration.
/// * `rect` - The source rectangle to fill, usually [`CageConfig::bounding_box`].
/// * `strategy` - The execution strategy for the rows.
///
/// # Example
///
/// ```
/// use cagewarp_imgproc::cage::{compute_coefficients, CageConfig};
/// use cagewarp_imgproc::parallel::ExecutionStrategy;
/// use glam::DVec2;
///
/// let cage = CageConfig::new(vec![
///     DVec2::new(0.0, 0.0),
///     DVec2::new(8.0, 0.0),
///     DVec2::new(0.0, 8.0),
/// ]).unwrap();
///
/// let coefs = compute_coefficients(&cage, cage.bounding_box(), ExecutionStrategy::Serial).unwrap();
///
/// let sum: f32 = coefs.coefficients_at(2, 2).unwrap()[..3].iter().sum();
/// assert!((sum - 1.0).abs() < 1e-5);
/// ```
pub fn compute_coefficients(
    cage: &CageConfig,
    rect: Rect,
    strategy: ExecutionStrategy,
) -> Result<CoefficientMap, CageError> {
    let n = cage.num_vertices();
    let mut map = CoefficientMap::zeros(rect, n);

    log::debug!("computing cage coefficients: {n} vertices over {rect}");

    let row_len = rect.width * 2 * n;
    parallel::map_row_chunks_mut(
        &mut map.data,
        row_len,
        strategy.rows_per_task(rect.height),
        strategy,
        |first_row, rows| {
            let mut phi = vec![0.0; n];
            let mut psi = vec![0.0; n];
            for (r, row) in rows.chunks_exact_mut(row_len).enumerate() {
                let y = rect.y + (first_row + r) as i64;
                for (c, px) in row.chunks_exact_mut(2 * n).enumerate() {
                    let p = DVec2::new((rect.x + c as i64) as f64, y as f64);
                    green_coordinates(cage.vertices(), cage.normals(), p, &mut phi, &mut psi);
                    for (dst, src) in px.iter_mut().zip(phi.iter().chain(psi.iter())) {
                        *dst = *src as f32;
                    }
                }
            }
        },
    )?;

    Ok(map)
}

/// Green coordinates of `p` relative to a closed polygon.
///
/// `normals` are the outward unit normals of the edges `i -> i + 1`.
/// Points on the outline take the limit from the inside of the polygon.
pub(crate) fn green_coordinates(
    vertices: &[DVec2],
    normals: &[DVec2],
    p: DVec2,
    phi: &mut [f64],
    psi: &mut [f64],
) {
    let n = vertices.len();
    phi.fill(0.0);
    psi.fill(0.0);

    // (edge, parameter) of the edge the point lies on
    let mut on_edge = None;

    for j in 0..n {
        let v1 = vertices[j];
        let v2 = vertices[(j + 1) % n];

        let a = v2 - v1;
        let b = v1 - p;
        let q = a.length_squared();
        let s = b.length_squared();
        let t = (v2 - p).length_squared();
        let r = 2.0 * a.dot(b);
        let a_len = q.sqrt();
        let cross = a.perp_dot(b);

        if cross.abs() <= COLLINEAR_EPS * q {
            // the angular terms vanish on the edge line
            let inner = if s <= f64::EPSILON * q {
                t.ln() - 2.0
            } else if t <= f64::EPSILON * q {
                s.ln() - 2.0
            } else {
                r / (2.0 * q) * (t.ln() - s.ln()) + t.ln() - 2.0
            };
            psi[j] = -a_len / (4.0 * PI) * inner;

            let u = -r / (2.0 * q);
            if on_edge.is_none() && (-COLLINEAR_EPS..=1.0 + COLLINEAR_EPS).contains(&u) {
                on_edge = Some((j, u.clamp(0.0, 1.0)));
            }
            continue;
        }

        let ba = a_len * b.dot(normals[j]);
        let srt = 2.0 * cross.abs();
        let l0 = s.ln();
        let l1 = t.ln();
        let a0 = r.atan2(srt) / srt;
        let a1 = (2.0 * q + r).atan2(srt) / srt;
        let a10 = a1 - a0;
        let l10 = l1 - l0;

        psi[j] = -a_len / (4.0 * PI) * ((4.0 * s - r * r / q) * a10 + r / (2.0 * q) * l10 + l1 - 2.0);
        phi[(j + 1) % n] += ba / (2.0 * PI) * (l10 / (2.0 * q) - a10 * r / q);
        phi[j] -= ba / (2.0 * PI) * (l10 / (2.0 * q) - a10 * (2.0 + r / q));
    }

    // on the outline the vertex weights jump; spread the missing mass over the edge
    if let Some((j, u)) = on_edge {
        let deficit = 1.0 - phi.iter().sum::<f64>();
        phi[j] += deficit * (1.0 - u);
        phi[(j + 1) % n] += deficit * u;
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_coefficients, green_coordinates, CoefficientMap};
    use crate::cage::{CageConfig, CageError};
    use crate::parallel::ExecutionStrategy;
    use approx::assert_abs_diff_eq;
    use cagewarp_image::Rect;
    use glam::DVec2;

    fn square(size: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(size, 0.0),
            DVec2::new(size, size),
            DVec2::new(0.0, size),
        ]
    }

    fn reproduce(cage: &CageConfig, p: DVec2) -> DVec2 {
        let n = cage.num_vertices();
        let (mut phi, mut psi) = (vec![0.0; n], vec![0.0; n]);
        green_coordinates(cage.vertices(), cage.normals(), p, &mut phi, &mut psi);

        let mut out = DVec2::ZERO;
        for i in 0..n {
            out += phi[i] * cage.vertices_d()[i];
            out += psi[i] * cage.scaling_factor()[i] * cage.normals_d()[i];
        }
        out
    }

    #[test]
    fn coefficient_map_access() -> Result<(), CageError> {
        let rect = Rect::new(-1, 2, 2, 2);
        let mut data = vec![0.0; 24];
        data[23] = 7.0;
        let map = CoefficientMap::new(rect, 3, data)?;
        assert_eq!(map.num_channels(), 6);
        assert_eq!(map.as_slice().len(), 24);

        assert_eq!(map.coefficients_at(0, 3).map(|c| c[5]), Some(7.0));
        assert!(map.coefficients_at(1, 3).is_none());
        assert!(map.coefficients_at(-1, 1).is_none());

        assert_eq!(
            CoefficientMap::new(rect, 3, vec![0.0; 5]),
            Err(CageError::InvalidCoefficientLength(5, 24))
        );

        Ok(())
    }

    #[test]
    fn green_partition_of_unity() -> Result<(), CageError> {
        let cage = CageConfig::new(vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(12.0, 2.5),
            DVec2::new(9.0, 11.0),
            DVec2::new(2.0, 8.0),
            DVec2::new(4.0, 5.0),
        ])?;
        let n = cage.num_vertices();
        let (mut phi, mut psi) = (vec![0.0; n], vec![0.0; n]);

        for p in [DVec2::new(5.0, 3.0), DVec2::new(9.0, 8.0), DVec2::new(6.0, 6.0)] {
            assert!(cage.point_inside(p.x, p.y));
            green_coordinates(cage.vertices(), cage.normals(), p, &mut phi, &mut psi);
            assert_abs_diff_eq!(phi.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn green_identity_reproduction() -> Result<(), CageError> {
        let cage = CageConfig::new(square(10.0))?;
        for p in [
            DVec2::new(3.0, 4.0),
            DVec2::new(0.5, 9.5),
            // on the outline
            DVec2::new(3.0, 0.0),
            DVec2::new(10.0, 7.0),
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 10.0),
        ] {
            let out = reproduce(&cage, p);
            assert_abs_diff_eq!(out.x, p.x, epsilon = 1e-9);
            assert_abs_diff_eq!(out.y, p.y, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn green_similarity_reproduction() -> Result<(), CageError> {
        let source = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(8.0, 1.0),
            DVec2::new(3.0, 9.0),
        ];
        // rotate by 90 degrees, scale by 1.5 and translate
        let map = |v: DVec2| DVec2::new(5.0 - 1.5 * v.y, 2.0 + 1.5 * v.x);
        let cage = CageConfig::with_deformed(source.clone(), source.iter().map(|v| map(*v)).collect())?;

        for p in [DVec2::new(4.0, 3.0), DVec2::new(3.0, 5.0), DVec2::new(4.0, 0.5)] {
            let out = reproduce(&cage, p);
            assert_abs_diff_eq!(out.x, map(p).x, epsilon = 1e-9);
            assert_abs_diff_eq!(out.y, map(p).y, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn green_winding_independent() -> Result<(), CageError> {
        let mut reversed = square(10.0);
        reversed.reverse();
        let cage = CageConfig::with_deformed(
            reversed.clone(),
            reversed.iter().map(|v| *v * 2.0).collect(),
        )?;

        let out = reproduce(&cage, DVec2::new(7.5, 2.5));
        assert_abs_diff_eq!(out.x, 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.y, 5.0, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn green_collinear_outside_is_finite() -> Result<(), CageError> {
        let cage = CageConfig::new(square(10.0))?;
        let n = cage.num_vertices();
        let (mut phi, mut psi) = (vec![0.0; n], vec![0.0; n]);

        // on the line of the first edge, but past its end
        green_coordinates(cage.vertices(), cage.normals(), DVec2::new(15.0, 0.0), &mut phi, &mut psi);
        assert!(phi.iter().chain(psi.iter()).all(|v| v.is_finite()));
        // outside the cage the vertex weights sum to zero
        assert_abs_diff_eq!(phi.iter().sum::<f64>(), 0.0, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn compute_coefficients_strategies_agree() -> Result<(), CageError> {
        let cage = CageConfig::new(square(6.0))?;
        let rect = cage.bounding_box();

        let serial = compute_coefficients(&cage, rect, ExecutionStrategy::Serial)?;
        let parallel = compute_coefficients(&cage, rect, ExecutionStrategy::ParallelElements)?;
        let rows = compute_coefficients(&cage, rect, ExecutionStrategy::AutoRows(3))?;

        assert_eq!(serial.rect(), Rect::new(0, 0, 7, 7));
        assert_eq!(serial, parallel);
        assert_eq!(serial, rows);
        assert!(serial.as_slice().iter().all(|v| v.is_finite()));

        // the vertex weights still sum to one on the corner of the cage
        let corner = serial.coefficients_at(0, 0).map(|c| c.to_vec());
        assert_eq!(corner.as_ref().map(|c| c.len()), Some(8));
        if let Some(c) = corner {
            assert_abs_diff_eq!(c[..4].iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }

        Ok(())
    }
}
