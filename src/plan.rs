use crate::attr::Attributes;
use crate::cancel::CancelSignal;
use crate::error::Error;
use crate::pal::{PalIndex, MAX_COLORS};
use crate::quantize::{PixelMap, QuantizedPixel};
use crate::segment::{scan, Segment};
use crate::surface::Tool;
use std::cmp::Reverse;

/// One operation of a [`StrokeProgram`], addressed in logical grid
/// coordinates. A zero-length stroke flood-fills when the fill tool is
/// active and paints a single cell when the brush is.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Op {
    SelectColor(PalIndex),
    SelectTool(Tool),
    SelectSize(u8),
    Stroke { x1: u16, y1: u16, x2: u16, y2: u16 },
}

/// Ordered operation sequence that reproduces a quantized grid when replayed
/// on a stroke-based drawing surface.
#[derive(Clone, Debug)]
pub struct StrokeProgram {
    ops: Vec<Op>,
    complete: bool,
}

impl StrokeProgram {
    #[inline(always)]
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// False when a cancellation signal truncated planning. The partial
    /// program stands; nothing is rolled back.
    #[inline(always)]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Just the strokes, ignoring tool/color/size selections
    pub fn strokes(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().filter(|op| matches!(op, Op::Stroke { .. }))
    }
}

/// Dense color-or-empty grid scattered from the quantizer's sparse output.
/// Mutated only while being built, read-only afterwards.
pub(crate) struct PixelGrid {
    cells: Vec<Option<PalIndex>>,
    width: usize,
    height: usize,
    counts: [u32; MAX_COLORS],
    seen_order: Vec<PalIndex>,
}

impl PixelGrid {
    pub(crate) fn new(width: usize, height: usize, pixels: &[QuantizedPixel]) -> Result<Self, Error> {
        let mut cells = Vec::new();
        cells.try_reserve_exact(width * height)?;
        cells.resize(width * height, None);

        let mut grid = Self {
            cells,
            width,
            height,
            counts: [0; MAX_COLORS],
            seen_order: Vec::new(),
        };
        for px in pixels {
            let (x, y) = (usize::from(px.x), usize::from(px.y));
            if x >= width || y >= height {
                continue;
            }
            grid.cells[y * width + x] = Some(px.color);
            if grid.counts[usize::from(px.color)] == 0 {
                grid.seen_order.push(px.color);
            }
            grid.counts[usize::from(px.color)] += 1;
        }
        Ok(grid)
    }

    #[inline(always)]
    pub(crate) fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub(crate) fn height(&self) -> usize {
        self.height
    }

    #[inline(always)]
    pub(crate) fn get(&self, x: usize, y: usize) -> Option<PalIndex> {
        self.cells[y * self.width + x]
    }

    /// Colors present in the grid, ordered by first appearance in raster scan
    #[inline(always)]
    pub(crate) fn colors_by_first_seen(&self) -> &[PalIndex] {
        &self.seen_order
    }

    /// The most frequent color, ties won by the color seen first.
    /// `None` when no cell is set at all.
    pub(crate) fn most_frequent(&self) -> Option<PalIndex> {
        let mut best: Option<PalIndex> = None;
        let mut best_count = 0;
        for &color in &self.seen_order {
            let count = self.counts[usize::from(color)];
            if count > best_count {
                best_count = count;
                best = Some(color);
            }
        }
        best
    }
}

/// Cells already covered by an emitted stroke
struct DrawnGrid {
    cells: Vec<bool>,
    width: usize,
}

impl DrawnGrid {
    fn new(width: usize, height: usize) -> Result<Self, Error> {
        let mut cells = Vec::new();
        cells.try_reserve_exact(width * height)?;
        cells.resize(width * height, false);
        Ok(Self { cells, width })
    }

    #[inline(always)]
    fn is_drawn(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x]
    }

    #[inline(always)]
    fn mark(&mut self, x: usize, y: usize) {
        self.cells[y * self.width + x] = true;
    }
}

/// Walks the cells of a straight stroke from `(x1, y1)` to `(x2, y2)`
/// inclusive, one signum step per axis at a time. A zero-length stroke
/// yields its single cell.
pub(crate) fn line_cells(x1: u16, y1: u16, x2: u16, y2: u16) -> LineCells {
    LineCells {
        x: i32::from(x1),
        y: i32::from(y1),
        x2: i32::from(x2),
        y2: i32::from(y2),
        dx: (i32::from(x2) - i32::from(x1)).signum(),
        dy: (i32::from(y2) - i32::from(y1)).signum(),
        done: false,
    }
}

pub(crate) struct LineCells {
    x: i32,
    y: i32,
    x2: i32,
    y2: i32,
    dx: i32,
    dy: i32,
    done: bool,
}

impl Iterator for LineCells {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.done {
            return None;
        }
        let cell = (self.x as usize, self.y as usize);
        if self.x == self.x2 && self.y == self.y2 {
            self.done = true;
        } else {
            self.x += self.dx;
            self.y += self.dy;
        }
        Some(cell)
    }
}

/// Collects operations, polling the cancellation signal before each one.
/// After the signal fires nothing further is pushed.
struct Emitter<'a, C: CancelSignal> {
    ops: Vec<Op>,
    cancel: &'a C,
    aborted: bool,
}

impl<'a, C: CancelSignal> Emitter<'a, C> {
    fn new(cancel: &'a C) -> Self {
        Self { ops: Vec::new(), cancel, aborted: false }
    }

    /// Returns false once cancelled
    fn emit(&mut self, op: Op) -> bool {
        if self.aborted || self.cancel.is_cancelled() {
            self.aborted = true;
            return false;
        }
        self.ops.push(op);
        true
    }

    fn finish(self) -> StrokeProgram {
        StrokeProgram { ops: self.ops, complete: !self.aborted }
    }
}

/// Convert a quantized grid into an ordered stroke program.
///
/// One flood fill of the most frequent color replaces what would otherwise be
/// the bulk of the strokes; the remaining colors are painted longest segment
/// first, and a final touch-up pass restores background cells that foreground
/// strokes ran over.
pub(crate) fn plan(attr: &Attributes, map: &PixelMap, cancel: &impl CancelSignal) -> Result<StrokeProgram, Error> {
    let grid = PixelGrid::new(map.width(), map.height(), map.pixels())?;
    let background = grid.most_frequent()
        .unwrap_or_else(|| attr.palette().fallback_background());

    let mut em = Emitter::new(cancel);

    // one fill instead of hundreds of background strokes
    em.emit(Op::SelectColor(background));
    em.emit(Op::SelectTool(Tool::Fill));
    em.emit(Op::Stroke { x1: 0, y1: 0, x2: 0, y2: 0 });

    let mut segments = scan(&grid, background);
    // stable: equal lengths keep discovery order
    segments.sort_by_key(|s| Reverse(s.len));

    em.emit(Op::SelectTool(Tool::Brush));
    em.emit(Op::SelectSize(attr.brush_size()));

    let mut drawn = DrawnGrid::new(grid.width(), grid.height())?;
    let mut current_color: Option<PalIndex> = None;

    for seg in &segments {
        if em.aborted {
            break;
        }
        if !is_useful(seg, &grid, &drawn) {
            continue;
        }
        if current_color != Some(seg.color) {
            if !em.emit(Op::SelectColor(seg.color)) {
                break;
            }
            current_color = Some(seg.color);
        }
        if !em.emit(Op::Stroke { x1: seg.x1, y1: seg.y1, x2: seg.x2, y2: seg.y2 }) {
            break;
        }
        // the stroke is treated as covering its whole path, even cells whose
        // true color differs; the touch-up pass repairs background cells, and
        // foreground mismatches are accepted fidelity loss
        for (x, y) in line_cells(seg.x1, seg.y1, seg.x2, seg.y2) {
            drawn.mark(x, y);
        }
    }

    if !em.aborted {
        touch_up(attr, &grid, &drawn, background, &mut em);
    }

    Ok(em.finish())
}

/// A segment earns its stroke if any cell on its path still shows the
/// segment's color and hasn't been covered yet
fn is_useful(seg: &Segment, grid: &PixelGrid, drawn: &DrawnGrid) -> bool {
    line_cells(seg.x1, seg.y1, seg.x2, seg.y2)
        .any(|(x, y)| grid.get(x, y) == Some(seg.color) && !drawn.is_drawn(x, y))
}

/// Single-cell strokes with the smallest brush, restoring background cells
/// that a foreground stroke's path overwrote
fn touch_up(attr: &Attributes, grid: &PixelGrid, drawn: &DrawnGrid, background: PalIndex, em: &mut Emitter<'_, impl CancelSignal>) {
    em.emit(Op::SelectColor(background));
    em.emit(Op::SelectSize(attr.touchup_size()));
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.get(x, y) == Some(background) && drawn.is_drawn(x, y) {
                let (x, y) = (x as u16, y as u16);
                if !em.emit(Op::Stroke { x1: x, y1: y, x2: x, y2: y }) {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::NeverCancel;
    use std::cell::Cell;

    fn map(width: usize, height: usize, cells: &[(u16, u16, PalIndex)]) -> PixelMap {
        let pixels = cells.iter()
            .map(|&(x, y, color)| QuantizedPixel { x, y, color })
            .collect();
        PixelMap::for_tests(pixels, width, height)
    }

    fn fill_background(cells: &mut Vec<(u16, u16, PalIndex)>, width: u16, height: u16, color: PalIndex) {
        for y in 0..height {
            for x in 0..width {
                if !cells.iter().any(|&(cx, cy, _)| cx == x && cy == y) {
                    cells.push((x, y, color));
                }
            }
        }
    }

    #[test]
    fn single_run_program() {
        // background color 0 everywhere except a 3-cell run of color 2 in row 1
        let mut cells = vec![(0, 1, 2), (1, 1, 2), (2, 1, 2)];
        fill_background(&mut cells, 4, 4, 0);
        let attr = Attributes::new();
        let program = plan(&attr, &map(4, 4, &cells), &NeverCancel).unwrap();

        assert!(program.is_complete());
        assert_eq!(program.ops(), &[
            Op::SelectColor(0),
            Op::SelectTool(Tool::Fill),
            Op::Stroke { x1: 0, y1: 0, x2: 0, y2: 0 },
            Op::SelectTool(Tool::Brush),
            Op::SelectSize(0),
            Op::SelectColor(2),
            Op::Stroke { x1: 0, y1: 1, x2: 2, y2: 1 },
            Op::SelectColor(0),
            Op::SelectSize(0),
        ]);
    }

    #[test]
    fn empty_map_fills_white_only() {
        let attr = Attributes::new();
        let program = plan(&attr, &map(4, 4, &[]), &NeverCancel).unwrap();

        assert!(program.is_complete());
        assert_eq!(program.ops()[0], Op::SelectColor(0));
        assert_eq!(program.strokes().count(), 1);
        assert_eq!(program.ops()[2], Op::Stroke { x1: 0, y1: 0, x2: 0, y2: 0 });
    }

    #[test]
    fn lengths_never_increase() {
        let mut cells = vec![
            (0, 0, 2), (1, 0, 2),
            (0, 2, 3), (1, 2, 3), (2, 2, 3), (3, 2, 3),
            (0, 3, 4), (1, 3, 4), (2, 3, 4),
        ];
        fill_background(&mut cells, 5, 5, 0);
        let attr = Attributes::new();
        let program = plan(&attr, &map(5, 5, &cells), &NeverCancel).unwrap();

        let mut last = u16::MAX;
        let mut foreground = true;
        for op in program.ops() {
            match *op {
                Op::SelectTool(Tool::Fill) => foreground = false,
                Op::SelectTool(Tool::Brush) => foreground = true,
                // the trailing touch-up select ends the foreground phase
                Op::SelectSize(_) if last != u16::MAX => foreground = false,
                Op::Stroke { x1, y1, x2, y2 } if foreground => {
                    let len = (i32::from(x2) - i32::from(x1)).abs()
                        .max((i32::from(y2) - i32::from(y1)).abs()) as u16 + 1;
                    assert!(len <= last);
                    last = len;
                }
                _ => {}
            }
        }
        assert_ne!(last, u16::MAX, "no foreground strokes seen");
    }

    #[test]
    fn no_redundant_color_switches() {
        let mut cells = vec![
            (0, 0, 2), (1, 0, 2), (2, 0, 2),
            (0, 1, 2), (1, 1, 2),
            (0, 3, 3), (1, 3, 3),
        ];
        fill_background(&mut cells, 4, 4, 0);
        let attr = Attributes::new();
        let program = plan(&attr, &map(4, 4, &cells), &NeverCancel).unwrap();

        let mut selected: Option<PalIndex> = None;
        for op in program.ops() {
            if let Op::SelectColor(c) = *op {
                assert_ne!(selected, Some(c), "re-selected active color");
                selected = Some(c);
            }
        }
    }

    #[test]
    fn crossing_runs_share_a_cell() {
        // two diagonals of different colors crossing at (2, 2); the longer
        // one owns the crossing cell in the grid
        let mut cells = vec![
            (0, 0, 2), (1, 1, 2), (2, 2, 2), (3, 3, 2), (4, 4, 2),
            (4, 0, 3), (3, 1, 3), (1, 3, 3), (0, 4, 3),
        ];
        fill_background(&mut cells, 5, 5, 0);
        let attr = Attributes::new();
        let program = plan(&attr, &map(5, 5, &cells), &NeverCancel).unwrap();

        let strokes: Vec<_> = program.strokes().collect();
        // the unbroken diagonal is drawn whole; the interrupted one is only
        // ever discovered as its two short halves
        assert!(strokes.contains(&&Op::Stroke { x1: 0, y1: 0, x2: 4, y2: 4 }));
        assert!(strokes.contains(&&Op::Stroke { x1: 0, y1: 4, x2: 1, y2: 3 }));
        assert!(strokes.contains(&&Op::Stroke { x1: 3, y1: 1, x2: 4, y2: 0 }));
        assert!(!strokes.contains(&&Op::Stroke { x1: 4, y1: 0, x2: 0, y2: 4 }));
    }

    #[test]
    fn cancelled_before_start_emits_nothing() {
        let mut cells = vec![(0, 1, 2), (1, 1, 2), (2, 1, 2)];
        fill_background(&mut cells, 4, 4, 0);
        let attr = Attributes::new();
        let cancelled = || true;
        let program = plan(&attr, &map(4, 4, &cells), &cancelled).unwrap();
        assert!(!program.is_complete());
        assert!(program.ops().is_empty());
    }

    #[test]
    fn cancellation_truncates_to_a_prefix() {
        let mut cells = vec![
            (0, 0, 2), (1, 0, 2), (2, 0, 2),
            (0, 2, 3), (1, 2, 3), (2, 2, 3),
        ];
        fill_background(&mut cells, 4, 4, 0);
        let attr = Attributes::new();

        let full = plan(&attr, &map(4, 4, &cells), &NeverCancel).unwrap();
        let total = full.ops().len();
        assert!(full.is_complete());

        for k in 0..total {
            let remaining = Cell::new(k);
            let cancel = || {
                if remaining.get() == 0 {
                    return true;
                }
                remaining.set(remaining.get() - 1);
                false
            };
            let truncated = plan(&attr, &map(4, 4, &cells), &cancel).unwrap();
            assert!(!truncated.is_complete());
            assert_eq!(truncated.ops(), &full.ops()[..k]);
        }
    }

    #[test]
    fn line_cells_walks_all_orientations() {
        let h: Vec<_> = line_cells(1, 2, 4, 2).collect();
        assert_eq!(h, vec![(1, 2), (2, 2), (3, 2), (4, 2)]);
        let v: Vec<_> = line_cells(0, 3, 0, 1).collect();
        assert_eq!(v, vec![(0, 3), (0, 2), (0, 1)]);
        let d: Vec<_> = line_cells(2, 2, 4, 0).collect();
        assert_eq!(d, vec![(2, 2), (3, 1), (4, 0)]);
        let point: Vec<_> = line_cells(5, 5, 5, 5).collect();
        assert_eq!(point, vec![(5, 5)]);
    }
}
