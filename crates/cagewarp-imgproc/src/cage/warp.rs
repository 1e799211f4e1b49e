use cagewarp_image::{Image, Rect};

use super::{
    coefficients::compute_coefficients,
    config::CageConfig,
    error::CageError,
    transform::{cage_transform, CageTransformParams},
};
use crate::interpolation::{remap_absolute, InterpolationMode};

/// Warp an image with a cage.
///
/// Computes the coefficients over the cage bounding box, transforms the whole
/// image area and samples the source image at the resulting positions. Output
/// pixels whose source position falls outside the image are zero.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `cage` - The cage configuration, with the deformed outline.
/// * `params` - The transform parameters.
/// * `interpolation` - The interpolation mode used to sample `src`.
///
/// # Returns
///
/// The warped image, same size as `src`.
///
/// # Example
///
/// ```
/// use cagewarp_image::Image;
/// use cagewarp_imgproc::cage::{cage_warp, CageConfig, CageTransformParams};
/// use cagewarp_imgproc::interpolation::InterpolationMode;
/// use glam::DVec2;
///
/// let image = Image::<f32, 1>::from_fn([16, 16].into(), |x, _| [x as f32]).unwrap();
///
/// let cage = CageConfig::new(vec![
///     DVec2::new(2.0, 2.0),
///     DVec2::new(12.0, 2.0),
///     DVec2::new(12.0, 12.0),
///     DVec2::new(2.0, 12.0),
/// ]).unwrap();
///
/// let warped = cage_warp(&image, &cage, &CageTransformParams::default(), InterpolationMode::Bilinear).unwrap();
///
/// assert_eq!(warped.size(), image.size());
/// ```
pub fn cage_warp<const C: usize>(
    src: &Image<f32, C>,
    cage: &CageConfig,
    params: &CageTransformParams,
    interpolation: InterpolationMode,
) -> Result<Image<f32, C>, CageError> {
    let coefs = compute_coefficients(cage, cage.bounding_box(), params.strategy)?;

    let mut coords = Image::<f32, 2>::from_size_val(src.size(), 0.0)?;
    cage_transform(cage, &coefs, Rect::from_size(src.size()), &mut coords, params)?;

    let mut dst = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    remap_absolute(src, &coords, &mut dst, interpolation)?;

    Ok(dst)
}
