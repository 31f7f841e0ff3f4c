#[cfg(feature = "im-io")]
use image::ImageResult;
#[cfg(feature = "im-io")]
use std::path::Path;

/// A 2-D raster with `N_CH` interleaved channels per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Im<T, const N_CH: usize> {
    pub w: usize,
    pub h: usize,
    pub s: usize, // stride in elements (w * N_CH)
    pub arr: Vec<T>,
}

// Constructor
// -----------------------------------------------------------------------------
impl<T: Copy + Default, const N_CH: usize> Im<T, N_CH> {
    pub fn new(w: usize, h: usize) -> Self {
        let s = w * N_CH;
        let arr = vec![T::default(); s * h];
        Self { w, h, s, arr }
    }
}

impl<T: Copy, const N_CH: usize> Im<T, N_CH> {
    #[inline(always)]
    pub fn at(&self, x: usize, y: usize, ch: usize) -> T {
        self.arr[y * self.s + x * N_CH + ch]
    }

    #[inline(always)]
    pub fn at_mut(&mut self, x: usize, y: usize, ch: usize) -> &mut T {
        &mut self.arr[y * self.s + x * N_CH + ch]
    }

    #[inline(always)]
    pub fn px(&self, x: usize, y: usize) -> [T; N_CH] {
        let i = y * self.s + x * N_CH;
        std::array::from_fn(|ch| self.arr[i + ch])
    }

    #[inline(always)]
    pub fn set_px(&mut self, x: usize, y: usize, px: [T; N_CH]) {
        let i = y * self.s + x * N_CH;
        self.arr[i..i + N_CH].copy_from_slice(&px);
    }
}

pub type RgbIm = Im<u8, 3>;
pub type GrayIm = Im<u8, 1>;

// PNG I/O
// -----------------------------------------------------------------------------
#[cfg(feature = "im-io")]
fn dim_mismatch_err() -> image::ImageError {
    image::ImageError::Parameter(image::error::ParameterError::from_kind(
        image::error::ParameterErrorKind::DimensionMismatch,
    ))
}

#[cfg(feature = "im-io")]
impl Im<u8, 1> {
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let img = image::GrayImage::from_raw(self.w as u32, self.h as u32, self.arr.clone())
            .ok_or_else(dim_mismatch_err)?;

        img.save_with_format(path, image::ImageFormat::Png)
    }
}

#[cfg(feature = "im-io")]
impl Im<u8, 3> {
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let img = image::RgbImage::from_raw(self.w as u32, self.h as u32, self.arr.clone())
            .ok_or_else(dim_mismatch_err)?;

        img.save_with_format(path, image::ImageFormat::Png)
    }
}

// Tests
// -----------------------------------------------------------------------------
