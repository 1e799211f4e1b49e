use glam::DVec2;

use super::{coefficients::CoefficientMap, config::CageConfig};

/// Compute where the source point `p` lands under the deformed cage.
///
/// The coefficients of the pixel nearest to `p` (rounded down) are combined
/// with the deformed vertices and the scaled deformed normals:
///
/// `sum(coef[i] * vertices_d[i]) + sum(coef[N + i] * scaling_factor[i] * normals_d[i])`
///
/// Points outside the coefficient map have all-zero coefficients and land on
/// the origin.
///
/// # Arguments
///
/// * `cage` - The cage configuration, with the deformed outline.
/// * `coefs` - The coefficient map, computed for the same number of vertices.
/// * `p` - The source point.
///
/// # Returns
///
/// The deformed position of `p`.
pub fn compute_destination(cage: &CageConfig, coefs: &CoefficientMap, p: DVec2) -> DVec2 {
    let n = cage.num_vertices();
    let Some(c) = coefs.coefficients_at(p.x.floor() as i64, p.y.floor() as i64) else {
        return DVec2::ZERO;
    };

    let (phi, psi) = c.split_at(n.min(c.len()));

    let mut out = DVec2::ZERO;
    for (w, v) in phi.iter().zip(cage.vertices_d()) {
        out += *w as f64 * *v;
    }
    for ((w, s), nd) in psi
        .iter()
        .zip(cage.scaling_factor())
        .zip(cage.normals_d())
    {
        out += *w as f64 * *s * *nd;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::compute_destination;
    use crate::cage::{compute_coefficients, CageConfig, CageError, CoefficientMap};
    use crate::parallel::ExecutionStrategy;
    use approx::assert_abs_diff_eq;
    use cagewarp_image::Rect;
    use glam::DVec2;

    fn square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn destination_identity() -> Result<(), CageError> {
        let cage = CageConfig::new(square())?;
        let coefs = compute_coefficients(&cage, cage.bounding_box(), ExecutionStrategy::Serial)?;

        let out = compute_destination(&cage, &coefs, DVec2::new(4.0, 7.0));
        assert_abs_diff_eq!(out.x, 4.0, epsilon = 1e-4);
        assert_abs_diff_eq!(out.y, 7.0, epsilon = 1e-4);

        Ok(())
    }

    #[test]
    fn destination_uses_nearest_lower_pixel() -> Result<(), CageError> {
        let cage = CageConfig::with_deformed(square(), square().iter().map(|v| *v * 2.0).collect())?;
        let coefs = compute_coefficients(&cage, cage.bounding_box(), ExecutionStrategy::Serial)?;

        let out = compute_destination(&cage, &coefs, DVec2::new(3.9, 5.2));
        assert_abs_diff_eq!(out.x, 6.0, epsilon = 1e-4);
        assert_abs_diff_eq!(out.y, 10.0, epsilon = 1e-4);

        Ok(())
    }

    #[test]
    fn destination_hand_made_coefficients() -> Result<(), CageError> {
        let cage = CageConfig::with_deformed(
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(4.0, 0.0),
                DVec2::new(0.0, 4.0),
            ],
            vec![
                DVec2::new(10.0, 0.0),
                DVec2::new(14.0, 0.0),
                DVec2::new(10.0, 8.0),
            ],
        )?;

        // one pixel at (1, 1): halfway along edge 0, pushed a quarter along its normal
        let coefs = CoefficientMap::new(
            Rect::new(1, 1, 1, 1),
            3,
            vec![0.5, 0.5, 0.0, 0.25, 0.0, 0.0],
        )?;

        let out = compute_destination(&cage, &coefs, DVec2::new(1.5, 1.5));
        // edge 0 keeps its length and points down in y
        assert_abs_diff_eq!(out.x, 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.y, -0.25, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn destination_outside_map_is_origin() -> Result<(), CageError> {
        let cage = CageConfig::new(square())?;
        let coefs = CoefficientMap::zeros(Rect::new(0, 0, 2, 2), 4);

        assert_eq!(compute_destination(&cage, &coefs, DVec2::new(-0.5, 1.0)), DVec2::ZERO);
        assert_eq!(compute_destination(&cage, &coefs, DVec2::new(8.0, 8.0)), DVec2::ZERO);

        Ok(())
    }
}
