use cagewarp_image::Image;

/// Bilinear sample at `(u, v)`, with `0 <= u < cols` and `0 <= v < rows`.
///
/// The last row and column are repeated past the image border.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (cols, rows) = (image.cols(), image.rows());

    let x0 = (u.floor() as usize).min(cols - 1);
    let y0 = (v.floor() as usize).min(rows - 1);
    let x1 = (x0 + 1).min(cols - 1);
    let y1 = (y0 + 1).min(rows - 1);

    let (fx, fy) = (u - x0 as f32, v - y0 as f32);
    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x1, y0, fx * (1.0 - fy)),
        (x0, y1, (1.0 - fx) * fy),
        (x1, y1, fx * fy),
    ];

    let data = image.as_slice();
    let mut out = [0.0; C];
    for (x, y, w) in taps {
        let px = &data[(y * cols + x) * C..][..C];
        out.iter_mut().zip(px).for_each(|(o, p)| *o += w * p);
    }
    out
}
