//! Convert raster images into reduced-palette pixel art and replay them as
//! brush strokes.
//!
//! The pipeline has two stages. The quantizer scales and centers an RGBA
//! image onto a small logical grid and snaps every opaque cell to the
//! nearest color of a fixed 26-color palette. The stroke planner then turns
//! that grid into the shortest practical sequence of drawing operations for
//! a surface that only understands brush drags and flood fill: one
//! background fill, foreground runs longest-first, and a touch-up pass for
//! background cells the foreground ran over.
//!
//! ```rust,ignore
//! let mut session = pixelbrush::Session::new();
//! let token = session.interrupt(); // stops any in-flight replay
//! let attr = pixelbrush::Attributes::new();
//! let image = attr.new_image(&pixels, width, height)?;
//! let program = attr.convert(&image, &token)?;
//! pixelbrush::replay(&program, &attr, &mut surface, &token)?;
//! ```
#![allow(clippy::missing_errors_doc)]

mod attr;
mod cancel;
mod error;
mod image;
mod pal;
mod plan;
mod quantize;
#[cfg(not(feature = "threads"))]
mod rayoff;
mod segment;
mod surface;

pub use crate::attr::{Attributes, BRUSH_SIZES};
pub use crate::cancel::{CancelSignal, CancelToken, NeverCancel, Session};
pub use crate::error::Error;
pub use crate::image::Image;
pub use crate::pal::{PalIndex, Palette, PaletteEntry, RGB, RGBA};
pub use crate::plan::{Op, StrokeProgram};
pub use crate::quantize::{PixelMap, QuantizedPixel};
pub use crate::surface::{replay, GridSurface, Surface, Tool};

/// [`Attributes`] with default settings
#[doc(hidden)]
#[must_use]
pub fn new() -> Attributes {
    Attributes::new()
}
