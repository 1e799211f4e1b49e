use crate::image::ImageSize;

/// An axis aligned rectangle of whole pixels.
///
/// The origin may be negative; the rectangle covers the pixels
/// `x..x + width` and `y..y + height`.
///
/// # Examples
///
/// ```
/// use cagewarp_image::Rect;
///
/// let rect = Rect::new(-2, 3, 4, 5);
///
/// assert!(rect.contains(-2, 3));
/// assert!(rect.contains(1, 7));
/// assert!(!rect.contains(2, 7));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left column of the rectangle.
    pub x: i64,
    /// Top row of the rectangle.
    pub y: i64,
    /// Width of the rectangle in pixels.
    pub width: usize,
    /// Height of the rectangle in pixels.
    pub height: usize,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i64, y: i64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle anchored at the origin with the given size.
    pub fn from_size(size: ImageSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Size of the rectangle.
    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// One past the last column.
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// One past the last row.
    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Whether the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the pixel `(x, y)` lies in the rectangle.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// The overlap of two rectangles, `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, (x1 - x0) as usize, (y1 - y0) as usize))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rect {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;
    use crate::ImageSize;

    #[test]
    fn rect_bounds() {
        let rect = Rect::new(1, 2, 3, 4);
        assert_eq!(rect.right(), 4);
        assert_eq!(rect.bottom(), 6);
        assert!(rect.contains(3, 5));
        assert!(!rect.contains(4, 5));
        assert!(!rect.contains(0, 2));
        assert_eq!(
            rect.size(),
            ImageSize {
                width: 3,
                height: 4
            }
        );
    }

    #[test]
    fn rect_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(-5, 5, 8, 20);
        assert_eq!(a.intersect(&b), Some(Rect::new(0, 5, 3, 5)));
        assert_eq!(a.intersect(&Rect::new(10, 0, 2, 2)), None);
    }

    #[test]
    fn rect_empty() {
        assert!(Rect::new(0, 0, 0, 3).is_empty());
        assert!(!Rect::from_size([2, 2].into()).is_empty());
    }
}
