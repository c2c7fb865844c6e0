use crate::attr::Attributes;
use crate::cancel::CancelSignal;
use crate::error::Error;
use crate::pal::{PalIndex, Palette};
use crate::plan::{line_cells, Op, StrokeProgram};
use std::time::Duration;

/// Tools of the external drawing surface
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tool {
    /// Paints the cells under a drag
    Brush,
    /// A zero-length stroke flood-fills from its cell
    Fill,
    /// Wipes the whole surface (an action, not a mode)
    Clear,
}

impl Tool {
    /// Name by which the surface's toolbar exposes the tool
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Brush => "brush",
            Self::Fill => "fill",
            Self::Clear => "clear",
        }
    }
}

/// The stroke-based drawing surface a program is replayed against.
///
/// Strokes are addressed in logical grid coordinates; mapping to device
/// coordinates is the implementation's job. Colors arrive as canonical
/// `rgb(r, g, b)` keys. A requested tool, size or color the surface doesn't
/// expose should be skipped silently (return `Ok`): selections are
/// best-effort, not fatal, and never retried.
pub trait Surface {
    fn select_tool(&mut self, tool: Tool) -> Result<(), Error>;
    fn select_size(&mut self, size: u8) -> Result<(), Error>;
    fn select_color(&mut self, key: &str) -> Result<(), Error>;
    fn stroke(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) -> Result<(), Error>;

    /// Called between strokes so the surface's input layer can keep up.
    /// The default blocks the replaying thread.
    fn pace(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Send a program to a surface in strict emission order, pacing after each
/// brush stroke and polling the cancellation signal before every operation.
///
/// Aborting returns [`Error::Aborted`]; whatever already reached the surface
/// stands. The surface is assumed to process each operation before the next
/// one is dispatched; the delay is heuristic pacing, not a barrier.
pub fn replay<S: Surface>(
    program: &StrokeProgram,
    attr: &Attributes,
    surface: &mut S,
    cancel: &impl CancelSignal,
) -> Result<(), Error> {
    let mut tool = Tool::Brush;
    for op in program.ops() {
        if cancel.is_cancelled() {
            return Err(Error::Aborted);
        }
        match *op {
            Op::SelectColor(idx) => {
                surface.select_color(&attr.palette().entry(idx).key())?;
            }
            Op::SelectTool(t) => {
                tool = t;
                surface.select_tool(t)?;
            }
            Op::SelectSize(size) => surface.select_size(size)?,
            Op::Stroke { x1, y1, x2, y2 } => {
                surface.stroke(x1, y1, x2, y2)?;
                if tool == Tool::Brush {
                    // touch-ups are single cells and may run much faster
                    let delay = if x1 == x2 && y1 == y2 {
                        attr.touchup_delay()
                    } else {
                        attr.stroke_delay()
                    };
                    if !delay.is_zero() {
                        surface.pace(delay);
                    }
                }
            }
        }
    }
    Ok(())
}

/// In-memory drawing surface over a logical grid.
///
/// Implements the same primitives a real surface would (flood fill, line
/// strokes, clear) so programs can be dry-run and verified cell for cell.
pub struct GridSurface {
    palette: Palette,
    cells: Vec<Option<PalIndex>>,
    width: usize,
    height: usize,
    tool: Tool,
    color: Option<PalIndex>,
}

impl GridSurface {
    #[must_use]
    pub fn new(palette: Palette, width: usize, height: usize) -> Self {
        Self {
            palette,
            cells: vec![None; width * height],
            width,
            height,
            tool: Tool::Brush,
            color: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<PalIndex> {
        self.cells[y * self.width + x]
    }

    #[inline(always)]
    #[must_use]
    pub fn cells(&self) -> &[Option<PalIndex>] {
        &self.cells
    }

    fn paint(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = self.color;
        }
    }

    /// 4-connected flood fill over the region holding the same value as the
    /// seed cell
    fn flood_fill(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let target = self.cells[y * self.width + x];
        if target == self.color {
            return;
        }
        let mut queue = vec![(x, y)];
        while let Some((x, y)) = queue.pop() {
            let idx = y * self.width + x;
            if self.cells[idx] != target {
                continue;
            }
            self.cells[idx] = self.color;
            if x > 0 { queue.push((x - 1, y)); }
            if x + 1 < self.width { queue.push((x + 1, y)); }
            if y > 0 { queue.push((x, y - 1)); }
            if y + 1 < self.height { queue.push((x, y + 1)); }
        }
    }
}

impl Surface for GridSurface {
    fn select_tool(&mut self, tool: Tool) -> Result<(), Error> {
        if tool == Tool::Clear {
            self.cells.fill(None);
        } else {
            self.tool = tool;
        }
        Ok(())
    }

    fn select_size(&mut self, _size: u8) -> Result<(), Error> {
        // sizes matter on a device surface, not on the logical grid
        Ok(())
    }

    fn select_color(&mut self, key: &str) -> Result<(), Error> {
        // unknown keys are skipped silently, like a missing toolbar control
        if let Some(idx) = self.palette.index_of_key(key) {
            self.color = Some(idx);
        }
        Ok(())
    }

    fn stroke(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) -> Result<(), Error> {
        match self.tool {
            Tool::Fill => self.flood_fill(usize::from(x1), usize::from(y1)),
            Tool::Brush => {
                if self.color.is_some() {
                    for (x, y) in line_cells(x1, y1, x2, y2) {
                        self.paint(x, y);
                    }
                }
            }
            Tool::Clear => {}
        }
        Ok(())
    }

    fn pace(&mut self, _delay: Duration) {
        // a model surface has no rate limits
    }
}
