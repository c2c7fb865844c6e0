use crate::attr::Attributes;
use crate::error::Error;
use crate::image::Image;
use crate::pal::{PalIndex, RGB};
#[cfg(not(feature = "threads"))]
use crate::rayoff::*;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// One opaque cell of the logical grid, assigned its nearest palette color.
///
/// Fully transparent cells produce no entry at all: absence means
/// "background-eligible", not "painted".
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QuantizedPixel {
    pub x: u16,
    pub y: u16,
    pub color: PalIndex,
}

/// Quantizer output: the sparse pixel list plus the logical grid it lives on.
///
/// Produced in raster scan order, but semantically a set.
pub struct PixelMap {
    pub(crate) pixels: Vec<QuantizedPixel>,
    width: u32,
    height: u32,
}

impl PixelMap {
    #[inline(always)]
    #[must_use]
    pub fn pixels(&self) -> &[QuantizedPixel] {
        &self.pixels
    }

    /// Logical grid width in cells
    #[inline(always)]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width as _
    }

    /// Logical grid height in cells
    #[inline(always)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height as _
    }

    /// True when the source image had no opaque pixels
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(pixels: Vec<QuantizedPixel>, width: usize, height: usize) -> Self {
        Self { pixels, width: width as u32, height: height as u32 }
    }
}

/// Scale the image uniformly into the logical grid, center it, and assign
/// every opaque resampled cell its nearest palette color.
pub(crate) fn quantize(attr: &Attributes, image: &Image<'_>) -> Result<PixelMap, Error> {
    let width = attr.grid_width();
    let height = attr.grid_height();
    debug_assert!(width >= 1 && height >= 1);

    let ratio = (width as f64 / image.width() as f64)
        .min(height as f64 / image.height() as f64);
    let scaled_w = image.width() as f64 * ratio;
    let scaled_h = image.height() as f64 * ratio;
    let off_x = (width as f64 - scaled_w) / 2.;
    let off_y = (height as f64 - scaled_h) / 2.;

    let palette = attr.palette();
    let rows: Vec<Vec<QuantizedPixel>> = (0..height).into_par_iter().map(|y| {
        let mut row = Vec::new();
        for x in 0..width {
            // sample at the cell center; cells outside the centered image
            // rectangle are the letterbox/pillarbox margin and stay empty
            let cx = x as f64 + 0.5;
            let cy = y as f64 + 0.5;
            if cx < off_x || cx >= off_x + scaled_w || cy < off_y || cy >= off_y + scaled_h {
                continue;
            }
            let sx = (cx - off_x) / ratio - 0.5;
            let sy = (cy - off_y) / ratio - 0.5;
            if let Some(rgb) = sample_bilinear(image, sx, sy) {
                row.push(QuantizedPixel {
                    x: x as u16,
                    y: y as u16,
                    color: palette.nearest(rgb),
                });
            }
        }
        row
    }).collect();

    let mut pixels = Vec::new();
    pixels.try_reserve(rows.iter().map(Vec::len).sum())?;
    for row in rows {
        pixels.extend(row);
    }

    Ok(PixelMap {
        pixels,
        width: width as u32,
        height: height as u32,
    })
}

/// Alpha-premultiplied bilinear sample, clamped at the image edges.
/// Returns `None` where the result is fully transparent.
fn sample_bilinear(image: &Image<'_>, sx: f64, sy: f64) -> Option<RGB> {
    let max_x = image.width() - 1;
    let max_y = image.height() - 1;

    let fx = sx.clamp(0., max_x as f64);
    let fy = sy.clamp(0., max_y as f64);
    let x0 = fx.floor() as usize;
    let y0 = fy.floor() as usize;
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let tx = (fx - x0 as f64) as f32;
    let ty = (fy - y0 as f64) as f32;

    let mut r = 0f32;
    let mut g = 0f32;
    let mut b = 0f32;
    let mut a = 0f32;
    let corners = [
        (image.pixel(x0, y0), (1. - tx) * (1. - ty)),
        (image.pixel(x1, y0), tx * (1. - ty)),
        (image.pixel(x0, y1), (1. - tx) * ty),
        (image.pixel(x1, y1), tx * ty),
    ];
    for (px, w) in corners {
        let pa = f32::from(px.a) / 255.;
        r += f32::from(px.r) * pa * w;
        g += f32::from(px.g) * pa * w;
        b += f32::from(px.b) * pa * w;
        a += pa * w;
    }

    // same gate as the original surface: any nonzero alpha counts
    if (a * 255.).round() < 1. {
        return None;
    }
    Some(RGB {
        r: (r / a).round().clamp(0., 255.) as u8,
        g: (g / a).round().clamp(0., 255.) as u8,
        b: (b / a).round().clamp(0., 255.) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::{Palette, RGBA};

    fn opaque(rgb: RGB) -> RGBA {
        RGBA::new(rgb.r, rgb.g, rgb.b, 255)
    }

    // device 12x12 at thickness 3 gives a 4x4 logical grid
    fn grid4() -> Attributes {
        let mut attr = Attributes::new();
        attr.set_device_size(12, 12).unwrap();
        attr
    }

    #[test]
    fn one_to_one_maps_exactly() {
        let attr = grid4();
        let pal = Palette::builtin();
        let px: Vec<RGBA> = (0..16).map(|i| opaque(pal.entry(i as PalIndex).rgb)).collect();
        let img = Image::new(&px, 4, 4).unwrap();
        let map = quantize(&attr, &img).unwrap();

        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 4);
        assert_eq!(map.pixels().len(), 16);
        for (i, qp) in map.pixels().iter().enumerate() {
            assert_eq!((qp.x, qp.y), ((i % 4) as u16, (i / 4) as u16));
            assert_eq!(qp.color, i as PalIndex);
        }
    }

    #[test]
    fn transparent_image_is_empty() {
        let attr = grid4();
        let px = vec![RGBA::new(10, 20, 30, 0); 16];
        let img = Image::new(&px, 4, 4).unwrap();
        let map = quantize(&attr, &img).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn narrow_image_is_pillarboxed() {
        let attr = grid4();
        let red = Palette::builtin().entry(2).rgb;
        let px = vec![opaque(red); 8];
        let img = Image::new(&px, 2, 4).unwrap();
        let map = quantize(&attr, &img).unwrap();

        // ratio 1, centered: columns 1-2 painted, 0 and 3 empty margins
        assert_eq!(map.pixels().len(), 8);
        assert!(map.pixels().iter().all(|qp| qp.x == 1 || qp.x == 2));
        assert!(map.pixels().iter().all(|qp| qp.color == 2));
    }

    #[test]
    fn transparent_holes_stay_unset() {
        let attr = grid4();
        let black = Palette::builtin().entry(13).rgb;
        let mut px = vec![opaque(black); 16];
        px[5].a = 0;
        let img = Image::new(&px, 4, 4).unwrap();
        let map = quantize(&attr, &img).unwrap();

        assert_eq!(map.pixels().len(), 15);
        assert!(!map.pixels().iter().any(|qp| qp.x == 1 && qp.y == 1));
    }

    #[test]
    fn downscale_stays_in_bounds() {
        let attr = grid4();
        let px = vec![opaque(RGB { r: 100, g: 150, b: 200 }); 100 * 30];
        let img = Image::new(&px, 100, 30).unwrap();
        let map = quantize(&attr, &img).unwrap();
        assert!(!map.is_empty());
        assert!(map.pixels().iter().all(|qp| usize::from(qp.x) < map.width() && usize::from(qp.y) < map.height()));
    }
}
