use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use cagewarp_image::Image;

/// How an image is sampled between pixel centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Weighted blend of the four surrounding pixels.
    #[default]
    Bilinear,
    /// The closest pixel.
    Nearest,
}

/// Sample every channel of `image` at the position `(u, v)`.
///
/// The caller keeps the position inside the image: `0 <= u < cols` and
/// `0 <= v < rows`.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> [f32; C] {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::{interpolate_pixel, InterpolationMode};
    use cagewarp_image::{Image, ImageError, ImageSize};

    #[test]
    fn interpolate_bilinear_center() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0, 1.0, 2.0, 3.0],
        )?;
        let px = interpolate_pixel(&image, 0.5, 0.5, InterpolationMode::Bilinear);
        assert!((px[0] - 1.5).abs() < 1e-6);

        let px = interpolate_pixel(&image, 1.0, 0.25, InterpolationMode::Bilinear);
        assert!((px[0] - 1.5).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn interpolate_nearest() -> Result<(), ImageError> {
        let image = Image::<f32, 2>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0.0, 10.0, 1.0, 11.0, 2.0, 12.0, 3.0, 13.0],
        )?;
        let px = interpolate_pixel(&image, 0.6, 0.4, InterpolationMode::Nearest);
        assert_eq!(px, [1.0, 11.0]);

        Ok(())
    }
}
