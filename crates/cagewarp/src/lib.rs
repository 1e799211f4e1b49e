#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use cagewarp_image as image;

#[doc(inline)]
pub use cagewarp_imgproc as imgproc;
