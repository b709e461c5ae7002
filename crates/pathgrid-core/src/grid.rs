//! The [`GridModel`]: a W×H array of [`Cell`]s plus the start/end markers.
//!
//! The model keeps one invariant above all others: the `start` and `end`
//! fields always name the single cell holding that marker, or are `None` when
//! no such cell exists. Every mutation goes through [`GridModel::set`] to keep
//! it that way.

use crate::cell::{Cell, Role};
use crate::error::EditError;
use crate::geom::{Point, Range};

/// Default grid width.
pub const DEFAULT_WIDTH: i32 = 40;
/// Default grid height.
pub const DEFAULT_HEIGHT: i32 = 30;

/// A single cell that differs between two grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellChange {
    pub pos: Point,
    pub cell: Cell,
}

/// A fixed-size grid of cells with optional start and end markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridModel {
    cells: Vec<Cell>,
    bounds: Range,
    start: Option<Point>,
    end: Option<Point>,
}

impl Default for GridModel {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl GridModel {
    /// Create an all-empty grid. Negative dimensions are treated as zero.
    pub fn new(width: i32, height: i32) -> Self {
        let bounds = Range::new(0, 0, width.max(0), height.max(0));
        Self {
            cells: vec![Cell::Empty; bounds.len()],
            bounds,
            start: None,
            end: None,
        }
    }

    /// The bounding range of the grid.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    /// Size of the grid as a `Point`.
    #[inline]
    pub fn size(&self) -> Point {
        self.bounds.size()
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Whether `p` lies inside the grid.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }

    /// Flat row-major index of `p`, or `None` if `p` is out of bounds.
    #[inline]
    pub fn idx(&self, p: Point) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        Some(p.y as usize * self.bounds.width() as usize + p.x as usize)
    }

    /// Convert a flat index back to a `Point`.
    #[inline]
    pub fn point(&self, idx: usize) -> Point {
        let w = self.bounds.width().max(1) as usize;
        Point::new((idx % w) as i32, (idx / w) as i32)
    }

    /// The cell at `p`, or `None` if `p` is out of bounds.
    #[inline]
    pub fn at(&self, p: Point) -> Option<Cell> {
        self.idx(p).map(|i| self.cells[i])
    }

    /// Whether `p` is in bounds and holds a wall.
    #[inline]
    pub fn is_wall(&self, p: Point) -> bool {
        self.at(p) == Some(Cell::Wall)
    }

    /// Row-major view of all cells.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Set the cell at `p`.
    ///
    /// Writing a marker moves it: the previous occupant of that role becomes
    /// `Empty`. Overwriting a marker cell with anything else unsets the role.
    pub fn set(&mut self, p: Point, cell: Cell) -> Result<(), EditError> {
        let idx = self.idx(p).ok_or(EditError::OutOfBounds(p))?;
        let prev = self.cells[idx];
        if prev == cell {
            return Ok(());
        }
        if let Some(role) = prev.role() {
            *self.marker_mut(role) = None;
        }
        if let Some(role) = cell.role() {
            if let Some(old) = self.marker(role).and_then(|old| self.idx(old)) {
                self.cells[old] = Cell::Empty;
            }
            *self.marker_mut(role) = Some(p);
        }
        self.cells[idx] = cell;
        Ok(())
    }

    /// Position of the start marker.
    #[inline]
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    /// Position of the end marker.
    #[inline]
    pub fn end(&self) -> Option<Point> {
        self.end
    }

    #[inline]
    pub fn has_start(&self) -> bool {
        self.start.is_some()
    }

    #[inline]
    pub fn has_end(&self) -> bool {
        self.end.is_some()
    }

    /// Position of the marker for `role`.
    #[inline]
    pub fn marker(&self, role: Role) -> Option<Point> {
        match role {
            Role::Start => self.start,
            Role::End => self.end,
        }
    }

    fn marker_mut(&mut self, role: Role) -> &mut Option<Point> {
        match role {
            Role::Start => &mut self.start,
            Role::End => &mut self.end,
        }
    }

    /// Turn every visual cell (path, visited, open) back into `Empty`.
    /// Walls and markers are kept.
    pub fn reset(&mut self) {
        for c in self.cells.iter_mut() {
            if c.is_visual() {
                *c = Cell::Empty;
            }
        }
    }

    /// Empty the whole grid and unset both markers.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
        self.start = None;
        self.end = None;
    }

    /// Clear the grid, then fill it with the value `f` returns for each point
    /// in row-major order. Markers follow the usual [`set`](Self::set) rules,
    /// so a later marker of the same role wins.
    pub fn fill_fn(&mut self, mut f: impl FnMut(Point) -> Cell) {
        self.clear();
        for p in self.bounds.iter() {
            // Every point of `bounds` is in range.
            let _ = self.set(p, f(p));
        }
    }

    /// Row-major iterator over `(Point, Cell)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Cell)> + '_ {
        self.bounds.iter().zip(self.cells.iter().copied())
    }

    /// Count how many cells equal `cell`.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Cells of `curr` that differ from `prev`, in row-major order.
    ///
    /// Grids of different sizes share no cells, so every cell of `curr` is
    /// reported.
    pub fn diff(prev: &GridModel, curr: &GridModel) -> Vec<CellChange> {
        if prev.bounds != curr.bounds {
            return curr
                .iter()
                .map(|(pos, cell)| CellChange { pos, cell })
                .collect();
        }
        curr.iter()
            .zip(prev.cells.iter())
            .filter(|((_, c), p)| c != *p)
            .map(|((pos, cell), _)| CellChange { pos, cell })
            .collect()
    }

    /// Build a grid from decoded parts without any checks. Callers validate
    /// that the markers agree with `cells`.
    pub(crate) fn from_raw(
        bounds: Range,
        cells: Vec<Cell>,
        start: Option<Point>,
        end: Option<Point>,
    ) -> Self {
        Self {
            cells,
            bounds,
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn new_grid_is_empty() {
        let g = GridModel::new(4, 3);
        assert_eq!(g.size(), p(4, 3));
        assert_eq!(g.count(Cell::Empty), 12);
        assert!(!g.has_start());
        assert!(!g.has_end());
    }

    #[test]
    fn default_dimensions() {
        let g = GridModel::default();
        assert_eq!(g.size(), p(40, 30));
    }

    #[test]
    fn out_of_bounds_is_rejected_not_wrapped() {
        let mut g = GridModel::new(4, 3);
        assert_eq!(g.at(p(4, 0)), None);
        assert_eq!(g.at(p(-1, 0)), None);
        assert_eq!(
            g.set(p(0, 3), Cell::Wall),
            Err(EditError::OutOfBounds(p(0, 3)))
        );
        assert_eq!(g.set(p(-1, 1), Cell::Wall), Err(EditError::OutOfBounds(p(-1, 1))));
        // A wrapping index would have hit (3, 0) or (0, 1).
        assert_eq!(g.count(Cell::Empty), 12);
    }

    #[test]
    fn setting_start_moves_previous_start() {
        let mut g = GridModel::new(4, 4);
        g.set(p(0, 0), Cell::Start).unwrap();
        g.set(p(2, 2), Cell::Start).unwrap();
        assert_eq!(g.start(), Some(p(2, 2)));
        assert_eq!(g.at(p(0, 0)), Some(Cell::Empty));
        assert_eq!(g.count(Cell::Start), 1);
    }

    #[test]
    fn overwriting_marker_unsets_role() {
        let mut g = GridModel::new(4, 4);
        g.set(p(1, 1), Cell::End).unwrap();
        g.set(p(1, 1), Cell::Wall).unwrap();
        assert!(!g.has_end());
        g.set(p(2, 1), Cell::Start).unwrap();
        g.set(p(2, 1), Cell::End).unwrap();
        assert!(!g.has_start());
        assert_eq!(g.end(), Some(p(2, 1)));
    }

    #[test]
    fn reset_keeps_structure_and_is_idempotent() {
        let mut g = GridModel::new(3, 3);
        g.set(p(0, 0), Cell::Start).unwrap();
        g.set(p(2, 2), Cell::End).unwrap();
        g.set(p(1, 0), Cell::Wall).unwrap();
        g.set(p(1, 1), Cell::Path).unwrap();
        g.set(p(0, 1), Cell::Visited).unwrap();
        g.set(p(2, 1), Cell::Open).unwrap();

        g.reset();
        let once = g.clone();
        g.reset();
        assert_eq!(g, once);
        assert_eq!(g.at(p(1, 1)), Some(Cell::Empty));
        assert_eq!(g.at(p(1, 0)), Some(Cell::Wall));
        assert_eq!(g.start(), Some(p(0, 0)));
        assert_eq!(g.end(), Some(p(2, 2)));
    }

    #[test]
    fn clear_unsets_markers() {
        let mut g = GridModel::new(3, 3);
        g.set(p(0, 0), Cell::Start).unwrap();
        g.set(p(1, 0), Cell::Wall).unwrap();
        g.clear();
        assert_eq!(g, GridModel::new(3, 3));
    }

    #[test]
    fn fill_fn_keeps_single_markers() {
        let mut g = GridModel::new(3, 3);
        g.set(p(1, 1), Cell::Wall).unwrap();
        g.fill_fn(|pt| if pt.x == 0 { Cell::Start } else { Cell::Empty });
        assert_eq!(g.count(Cell::Start), 1);
        assert_eq!(g.start(), Some(p(0, 2)));
        assert_eq!(g.count(Cell::Wall), 0);
    }

    #[test]
    fn index_round_trip() {
        let g = GridModel::new(5, 3);
        for (i, (pt, _)) in g.iter().enumerate() {
            assert_eq!(g.idx(pt), Some(i));
            assert_eq!(g.point(i), pt);
        }
    }

    #[test]
    fn diff_reports_changed_cells() {
        let a = GridModel::new(3, 2);
        let mut b = a.clone();
        b.set(p(1, 0), Cell::Wall).unwrap();
        b.set(p(2, 1), Cell::Visited).unwrap();
        let changes = GridModel::diff(&a, &b);
        assert_eq!(
            changes,
            vec![
                CellChange { pos: p(1, 0), cell: Cell::Wall },
                CellChange { pos: p(2, 1), cell: Cell::Visited },
            ]
        );
        assert!(GridModel::diff(&b, &b).is_empty());
    }

    #[test]
    fn diff_of_resized_grid_reports_everything() {
        let a = GridModel::new(3, 2);
        let b = GridModel::new(2, 2);
        assert_eq!(GridModel::diff(&a, &b).len(), 4);
    }
}
