use crate::pal::PalIndex;
use crate::plan::PixelGrid;
use std::collections::HashSet;

/// A candidate stroke: a straight same-color run of grid cells.
///
/// Runs grow from their starting cell in one fixed direction only, so a cell
/// in the interior of a run yields a strictly shorter suffix of it. Those
/// shorter candidates are kept on purpose; the planner's coverage check makes
/// the redundancy harmless and they mop up leftovers of partially covered
/// runs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Segment {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
    /// Number of cells covered, endpoints inclusive
    pub len: u16,
    pub color: PalIndex,
}

/// The four growth directions: horizontal, vertical, diagonal down-right,
/// diagonal up-right. Always positive-x (or positive-y for vertical), never
/// bidirectional.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Longest contiguous run of `color` from `(x, y)` in direction `(dx, dy)`
fn maximal_run(grid: &PixelGrid, x: usize, y: usize, color: PalIndex, dx: i32, dy: i32) -> Segment {
    let mut end_x = x as i32;
    let mut end_y = y as i32;
    let mut len = 1u16;
    loop {
        let nx = end_x + dx;
        let ny = end_y + dy;
        if nx < 0 || ny < 0 || nx as usize >= grid.width() || ny as usize >= grid.height() {
            break;
        }
        if grid.get(nx as usize, ny as usize) != Some(color) {
            break;
        }
        end_x = nx;
        end_y = ny;
        len += 1;
    }
    Segment {
        x1: x as u16,
        y1: y as u16,
        x2: end_x as u16,
        y2: end_y as u16,
        len,
        color,
    }
}

/// Enumerate all candidate segments of every non-background color.
///
/// Colors are visited in first-appearance order, each with a full raster
/// scan, so the discovery order (and therefore tie order after the stable
/// length sort) is deterministic. Single cells are dropped: they get covered
/// incidentally or by the touch-up pass. Exact duplicates rediscovered from
/// another orientation's interior are suppressed.
pub(crate) fn scan(grid: &PixelGrid, background: PalIndex) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut seen = HashSet::new();

    for &color in grid.colors_by_first_seen() {
        if color == background {
            continue;
        }
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if grid.get(x, y) != Some(color) {
                    continue;
                }
                for (dx, dy) in DIRECTIONS {
                    let candidate = maximal_run(grid, x, y, color, dx, dy);
                    if candidate.len > 1 && seen.insert(candidate) {
                        segments.push(candidate);
                    }
                }
            }
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PixelGrid;
    use crate::quantize::QuantizedPixel;

    fn grid(width: usize, height: usize, cells: &[(u16, u16, PalIndex)]) -> PixelGrid {
        let pixels: Vec<_> = cells.iter()
            .map(|&(x, y, color)| QuantizedPixel { x, y, color })
            .collect();
        PixelGrid::new(width, height, &pixels).unwrap()
    }

    #[test]
    fn horizontal_run_is_maximal_from_its_start() {
        let g = grid(4, 4, &[(0, 1, 5), (1, 1, 5), (2, 1, 5)]);
        let segs = scan(&g, 0);

        // full run from the true start, suffix run from the interior,
        // no vertical or diagonal candidates (all length 1)
        assert_eq!(segs, vec![
            Segment { x1: 0, y1: 1, x2: 2, y2: 1, len: 3, color: 5 },
            Segment { x1: 1, y1: 1, x2: 2, y2: 1, len: 2, color: 5 },
        ]);
    }

    #[test]
    fn all_four_orientations() {
        // plus-shape with one diagonal arm
        let g = grid(5, 5, &[
            (2, 0, 7), (2, 1, 7), (2, 2, 7), (2, 3, 7),
            (1, 2, 7), (3, 2, 7),
            (3, 3, 7), (4, 4, 7),
            (3, 1, 7), (4, 0, 7),
        ]);
        let segs = scan(&g, 0);
        assert!(segs.contains(&Segment { x1: 2, y1: 0, x2: 2, y2: 3, len: 4, color: 7 }));
        assert!(segs.contains(&Segment { x1: 1, y1: 2, x2: 3, y2: 2, len: 3, color: 7 }));
        assert!(segs.contains(&Segment { x1: 2, y1: 2, x2: 4, y2: 4, len: 3, color: 7 }));
        assert!(segs.contains(&Segment { x1: 2, y1: 2, x2: 4, y2: 0, len: 3, color: 7 }));
    }

    #[test]
    fn background_color_is_skipped() {
        let g = grid(3, 1, &[(0, 0, 1), (1, 0, 1), (2, 0, 1)]);
        assert!(scan(&g, 1).is_empty());
        assert_eq!(scan(&g, 0).len(), 2);
    }

    #[test]
    fn no_exact_duplicates() {
        let g = grid(4, 4, &[
            (0, 0, 3), (1, 0, 3), (2, 0, 3),
            (0, 1, 3), (1, 1, 3), (2, 1, 3),
        ]);
        let mut segs = scan(&g, 0);
        let before = segs.len();
        segs.sort_unstable_by_key(|s| (s.x1, s.y1, s.x2, s.y2, s.color));
        segs.dedup();
        assert_eq!(before, segs.len());
    }

    #[test]
    fn single_cells_are_dropped() {
        let g = grid(3, 3, &[(0, 0, 2), (2, 2, 4)]);
        assert!(scan(&g, 0).is_empty());
    }
}
