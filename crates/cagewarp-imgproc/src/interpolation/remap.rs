use crate::parallel;

use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use cagewarp_image::{Image, ImageError};

/// Resample an image through an absolute coordinate map.
///
/// Every pixel of `dst` reads the `(x, y)` source position stored at the same
/// pixel of `coords` and takes the interpolated value of `src` there. Pixels
/// whose source position falls outside `src` keep their current value.
///
/// # Errors
///
/// `dst` and `coords` must have the same size.
///
/// # Example
///
/// ```
/// use cagewarp_image::{Image, ImageSize};
/// use cagewarp_imgproc::interpolation::{remap_absolute, InterpolationMode};
///
/// let size = ImageSize { width: 2, height: 1 };
/// let src = Image::<f32, 1>::new(size, vec![1.0, 2.0]).unwrap();
/// let coords = Image::<f32, 2>::new(size, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(size, 0.0).unwrap();
///
/// remap_absolute(&src, &coords, &mut dst, InterpolationMode::Nearest).unwrap();
///
/// assert_eq!(dst.as_slice(), &[2.0, 1.0]);
/// ```
pub fn remap_absolute<const C: usize>(
    src: &Image<f32, C>,
    coords: &Image<f32, 2>,
    dst: &mut Image<f32, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if dst.size() != coords.size() {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            coords.width(),
            coords.height(),
        ));
    }

    let (cols, rows) = (src.cols() as f32, src.rows() as f32);

    parallel::par_iter_rows_resample(dst, coords, |x, y, dst_pixel| {
        // check if the position is within the bounds of the src image
        if x >= 0.0 && x < cols && y >= 0.0 && y < rows {
            dst_pixel.copy_from_slice(&interpolate_pixel(src, x, y, interpolation));
        }
    });

    Ok(())
}
