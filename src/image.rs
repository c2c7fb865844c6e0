use crate::error::Error;
use crate::pal::RGBA;

/// A decoded raster image borrowed from the caller.
///
/// Decoding is the caller's job; a decode failure upstream aborts the whole
/// conversion before an `Image` ever exists. See the [`rgb`] crate for making
/// `[RGBA]` slices out of `[u8]` slices.
pub struct Image<'pixels> {
    pixels: &'pixels [RGBA],
    width: u32,
    height: u32,
    stride: u32,
}

impl<'pixels> Image<'pixels> {
    /// Describe dimensions of a tightly packed slice of RGBA pixels
    #[inline(always)]
    pub fn new(pixels: &'pixels [RGBA], width: usize, height: usize) -> Result<Self, Error> {
        Self::new_stride(pixels, width, height, width)
    }

    /// Stride is in pixels. Allows defining regions of larger images or
    /// images with row padding without copying.
    pub fn new_stride(pixels: &'pixels [RGBA], width: usize, height: usize, stride: usize) -> Result<Self, Error> {
        if !Self::check_image_size(width, height) || stride < width {
            return Err(Error::ValueOutOfRange);
        }
        // the last row doesn't need to include the padding
        if pixels.len() < stride * height + width - stride {
            return Err(Error::BufferTooSmall);
        }
        Ok(Self {
            pixels,
            width: width as u32,
            height: height as u32,
            stride: stride as u32,
        })
    }

    fn check_image_size(width: usize, height: usize) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        if width.max(height) > i32::MAX as usize ||
            width > isize::MAX as usize / std::mem::size_of::<RGBA>() / height {
            return false;
        }
        true
    }

    /// Width of the image in pixels
    #[must_use]
    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width as _
    }

    /// Height of the image in pixels
    #[must_use]
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height as _
    }

    #[inline]
    pub(crate) fn row(&self, y: usize) -> &[RGBA] {
        debug_assert!(y < self.height as usize);
        let start = y * self.stride as usize;
        &self.pixels[start..start + self.width as usize]
    }

    #[inline]
    pub(crate) fn pixel(&self, x: usize, y: usize) -> RGBA {
        self.row(y)[x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_dimensions() {
        let px = vec![RGBA::new(0, 0, 0, 255); 8];
        assert!(Image::new(&px, 0, 1).is_err());
        assert!(Image::new(&px, 1, 0).is_err());
        assert!(Image::new(&px, 3, 3).is_err());
        assert!(Image::new_stride(&px, 4, 2, 3).is_err());
        assert!(Image::new(&px, 4, 2).is_ok());
        assert!(Image::new(&px, 8, 1).is_ok());
    }

    #[test]
    fn stride_addresses_rows() {
        let mut px = vec![RGBA::new(0, 0, 0, 255); 10];
        px[5] = RGBA::new(9, 9, 9, 255);
        // 2x2 region of a 5-wide buffer
        let img = Image::new_stride(&px, 2, 2, 5).unwrap();
        assert_eq!(img.pixel(0, 1), RGBA::new(9, 9, 9, 255));
        assert_eq!(img.pixel(1, 0), RGBA::new(0, 0, 0, 255));
    }

    #[test]
    fn last_row_may_omit_padding() {
        let px = vec![RGBA::new(0, 0, 0, 255); 7];
        assert!(Image::new_stride(&px, 2, 2, 5).is_ok());
        let px = vec![RGBA::new(0, 0, 0, 255); 6];
        assert!(Image::new_stride(&px, 2, 2, 5).is_err());
    }
}
