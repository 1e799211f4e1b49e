use cagewarp_image::Image;

/// Value of the pixel closest to `(u, v)`, clamped to the image.
pub(crate) fn nearest_neighbor_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let x = (u.round().max(0.0) as usize).min(image.cols() - 1);
    let y = (v.round().max(0.0) as usize).min(image.rows() - 1);

    let start = (y * image.cols() + x) * C;
    let mut out = [0.0; C];
    out.copy_from_slice(&image.as_slice()[start..start + C]);
    out
}
