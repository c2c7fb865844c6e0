use crate::cancel::CancelSignal;
use crate::error::Error;
use crate::image::Image;
use crate::pal::{Palette, RGBA};
use crate::plan::{self, StrokeProgram};
use crate::quantize::{self, PixelMap};
use std::sync::Arc;
use std::time::Duration;

/// Device-pixel thickness of each of the surface's five brush sizes.
/// The smallest brush footprint decides the logical grid resolution.
pub(crate) const BRUSH_THICKNESS: [u32; 5] = [3, 9, 19, 32, 39];

/// Number of selectable brush sizes
pub const BRUSH_SIZES: u8 = BRUSH_THICKNESS.len() as u8;

/// Settings shared by the quantizer and the stroke planner.
///
/// Constructed once and passed to both; nothing here changes during a run.
#[derive(Clone)]
pub struct Attributes {
    brush_size: u8,
    touchup_size: u8,
    device_width: u32,
    device_height: u32,
    stroke_delay: Duration,
    touchup_delay: Duration,
    palette: Palette,
    log_callback: Option<Arc<dyn Fn(&Attributes, &str) + Send + Sync>>,
}

impl Attributes {
    /// Defaults matching the reference surface: smallest brush on an 800×600
    /// device canvas, 12 ms between strokes, 5 ms between touch-ups.
    #[must_use]
    pub fn new() -> Self {
        Self {
            brush_size: 0,
            touchup_size: 0,
            device_width: 800,
            device_height: 600,
            stroke_delay: Duration::from_millis(12),
            touchup_delay: Duration::from_millis(5),
            palette: Palette::builtin(),
            log_callback: None,
        }
    }

    /// Brush size index used for all foreground strokes. Bigger brushes mean
    /// a coarser logical grid.
    pub fn set_brush_size(&mut self, size: u8) -> Result<(), Error> {
        if size >= BRUSH_SIZES {
            return Err(Error::ValueOutOfRange);
        }
        if !Self::check_grid(self.device_width, self.device_height, size) {
            return Err(Error::ValueOutOfRange);
        }
        self.brush_size = size;
        Ok(())
    }

    /// Brush size index used by the background correction pass.
    /// The default (and the sensible choice) is the smallest brush.
    pub fn set_touchup_size(&mut self, size: u8) -> Result<(), Error> {
        if size >= BRUSH_SIZES {
            return Err(Error::ValueOutOfRange);
        }
        self.touchup_size = size;
        Ok(())
    }

    /// Size in device pixels of the surface's canvas
    pub fn set_device_size(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if !Self::check_grid(width, height, self.brush_size) {
            return Err(Error::ValueOutOfRange);
        }
        self.device_width = width;
        self.device_height = height;
        Ok(())
    }

    /// Pause between consecutive foreground strokes
    #[inline(always)]
    pub fn set_stroke_delay(&mut self, delay: Duration) {
        self.stroke_delay = delay;
    }

    /// Pause between consecutive touch-up strokes
    #[inline(always)]
    pub fn set_touchup_delay(&mut self, delay: Duration) {
        self.touchup_delay = delay;
    }

    /// Replace the builtin palette. The palette is closed and immutable for
    /// the lifetime of a conversion.
    #[inline]
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Set callback function to be called every time the library wants to
    /// print a message.
    ///
    /// To share data with the callback, use `Arc` or `Atomic*` types and
    /// `move ||` closures.
    #[inline]
    pub fn set_log_callback<F: Fn(&Attributes, &str) + Send + Sync + 'static>(&mut self, callback: F) {
        self.log_callback = Some(Arc::new(callback));
    }

    #[inline(always)]
    #[must_use]
    pub fn brush_size(&self) -> u8 {
        self.brush_size
    }

    #[inline(always)]
    #[must_use]
    pub fn touchup_size(&self) -> u8 {
        self.touchup_size
    }

    #[inline(always)]
    #[must_use]
    pub fn stroke_delay(&self) -> Duration {
        self.stroke_delay
    }

    #[inline(always)]
    #[must_use]
    pub fn touchup_delay(&self) -> Duration {
        self.touchup_delay
    }

    #[inline(always)]
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Brush footprint in device pixels
    #[inline]
    #[must_use]
    pub fn thickness(&self) -> u32 {
        BRUSH_THICKNESS[usize::from(self.brush_size)]
    }

    /// Logical grid width in cells
    #[inline]
    #[must_use]
    pub fn grid_width(&self) -> usize {
        (self.device_width / self.thickness()) as usize
    }

    /// Logical grid height in cells
    #[inline]
    #[must_use]
    pub fn grid_height(&self) -> usize {
        (self.device_height / self.thickness()) as usize
    }

    fn check_grid(device_width: u32, device_height: u32, brush_size: u8) -> bool {
        let thickness = BRUSH_THICKNESS[usize::from(brush_size)];
        device_width / thickness >= 1 && device_height / thickness >= 1
    }

    /// Describe dimensions of a tightly packed slice of RGBA pixels
    #[inline]
    pub fn new_image<'pixels>(&self, pixels: &'pixels [RGBA], width: usize, height: usize) -> Result<Image<'pixels>, Error> {
        Image::new(pixels, width, height)
    }

    /// Resample the image onto the logical grid and assign every opaque cell
    /// its nearest palette color
    pub fn quantize(&self, image: &Image<'_>) -> Result<PixelMap, Error> {
        let map = quantize::quantize(self, image)?;
        self.verbose_print(format!(
            "  quantized {}×{} image onto {}×{} grid, {} opaque cells",
            image.width(), image.height(),
            map.width(), map.height(),
            map.pixels().len(),
        ));
        Ok(map)
    }

    /// Turn a quantized grid into an ordered stroke program.
    ///
    /// The signal is polled before every emitted operation; cancelling
    /// truncates the program rather than failing (see
    /// [`StrokeProgram::is_complete`][crate::StrokeProgram::is_complete]).
    pub fn plan(&self, map: &PixelMap, cancel: &impl CancelSignal) -> Result<StrokeProgram, Error> {
        let program = plan::plan(self, map, cancel)?;
        self.verbose_print(format!(
            "  planned {} operations ({} strokes){}",
            program.ops().len(),
            program.strokes().count(),
            if program.is_complete() { "" } else { ", cancelled" },
        ));
        Ok(program)
    }

    /// Quantize + plan in one call
    #[inline]
    pub fn convert(&self, image: &Image<'_>, cancel: &impl CancelSignal) -> Result<StrokeProgram, Error> {
        let map = self.quantize(image)?;
        self.plan(&map, cancel)
    }

    #[inline(always)]
    pub(crate) fn verbose_print(&self, msg: impl AsRef<str>) {
        fn _print(a: &Attributes, msg: &str) {
            if let Some(f) = &a.log_callback {
                f(a, msg);
            }
        }
        _print(self, msg.as_ref());
    }
}

impl Default for Attributes {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}
