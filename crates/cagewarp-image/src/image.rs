use crate::error::ImageError;

/// Width and height of an image, in pixels.
///
/// # Examples
///
/// ```
/// use cagewarp_image::ImageSize;
///
/// let size: ImageSize = [64, 48].into();
///
/// assert_eq!(size.width, 64);
/// assert_eq!(size.area(), 64 * 48);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ImageSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from([width, height]: [usize; 2]) -> Self {
        Self { width, height }
    }
}

/// A dense image with `CHANNELS` interleaved values per pixel.
///
/// Pixels are stored row after row; the value of channel `c` of the pixel
/// `(x, y)` lives at `(y * width + x) * CHANNELS + c`. Two channel `f32`
/// images double as coordinate maps, one `(x, y)` pair per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Wrap pixel data into an image.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The interleaved pixel values, row major.
    ///
    /// # Errors
    ///
    /// The data must hold exactly `width * height * CHANNELS` values.
    ///
    /// # Examples
    ///
    /// ```
    /// use cagewarp_image::{Image, ImageError};
    ///
    /// let rgb = Image::<u8, 3>::new([4, 2].into(), vec![0; 24]).unwrap();
    /// assert_eq!(rgb.cols(), 4);
    ///
    /// let bad = Image::<u8, 3>::new([4, 2].into(), vec![0; 23]);
    /// assert_eq!(bad, Err(ImageError::InvalidChannelShape(23, 24)));
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.area() * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// An image with every value set to `val`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cagewarp_image::Image;
    ///
    /// let coords = Image::<f32, 2>::from_size_val([3, 5].into(), -1.0).unwrap();
    ///
    /// assert_eq!(coords.rows(), 5);
    /// assert!(coords.as_slice().iter().all(|v| *v == -1.0));
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Self::new(size, vec![val; size.area() * CHANNELS])
    }

    /// An image whose pixel `(x, y)` is `f(x, y)`, generated row by row.
    pub fn from_fn(
        size: ImageSize,
        mut f: impl FnMut(usize, usize) -> [T; CHANNELS],
    ) -> Result<Self, ImageError> {
        let mut data = Vec::with_capacity(size.area() * CHANNELS);
        for y in 0..size.height {
            for x in 0..size.width {
                data.extend(f(x, y));
            }
        }
        Self::new(size, data)
    }

    /// Convert every value to `U` and multiply it by `scale`.
    ///
    /// # Errors
    ///
    /// Fails on the first value `U` cannot represent.
    ///
    /// # Examples
    ///
    /// ```
    /// use cagewarp_image::Image;
    ///
    /// let gray = Image::<u8, 1>::new([2, 1].into(), vec![0, 255]).unwrap();
    /// let unit = gray.cast_and_scale::<f32>(1.0 / 255.0).unwrap();
    ///
    /// assert_eq!(unit.as_slice(), &[0.0, 1.0]);
    /// ```
    pub fn cast_and_scale<U>(&self, scale: U) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: num_traits::NumCast + std::ops::Mul<Output = U> + Copy,
        T: num_traits::NumCast + Copy,
    {
        let data = self
            .data
            .iter()
            .map(|v| {
                U::from(*v)
                    .map(|u| u * scale)
                    .ok_or_else(|| ImageError::CastError(std::any::type_name::<U>().to_string()))
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, data)
    }

    /// Size of the image.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Width in pixels, same as [`Image::cols`].
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Height in pixels, same as [`Image::rows`].
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The interleaved pixel values.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved pixel values, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// The channels of the pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// The pixel must lie in the image.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let start = (y * self.width() + x) * CHANNELS;
        Ok(&self.data[start..start + CHANNELS])
    }

    /// One channel of the pixel `(x, y)`.
    ///
    /// # Errors
    ///
    /// The pixel must lie in the image and the channel must exist.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<T, ImageError>
    where
        T: Copy,
    {
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }
        Ok(self.pixel(x, y)?[ch])
    }
}
