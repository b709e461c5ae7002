//! Editing tools: walls, markers, the eraser, and drag strokes.

use crate::cell::{Cell, Role};
use crate::error::EditError;
use crate::geom::Point;
use crate::grid::GridModel;

/// The editing tool a consumer applies to a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tool {
    #[default]
    Wall,
    Start,
    End,
    Erase,
}

impl GridModel {
    /// Turn an empty cell into a wall. Returns whether the cell changed.
    pub fn set_wall(&mut self, p: Point) -> Result<bool, EditError> {
        if self.at(p).ok_or(EditError::OutOfBounds(p))? != Cell::Empty {
            return Ok(false);
        }
        self.set(p, Cell::Wall)?;
        Ok(true)
    }

    /// Place the start marker on an empty cell.
    ///
    /// Fails with [`EditError::DuplicateRole`] when a start is already placed;
    /// erase it first to move it.
    pub fn set_start(&mut self, p: Point) -> Result<bool, EditError> {
        self.place_marker(Role::Start, p)
    }

    /// Place the end marker on an empty cell. See [`set_start`](Self::set_start).
    pub fn set_end(&mut self, p: Point) -> Result<bool, EditError> {
        self.place_marker(Role::End, p)
    }

    fn place_marker(&mut self, role: Role, p: Point) -> Result<bool, EditError> {
        let current = self.at(p).ok_or(EditError::OutOfBounds(p))?;
        if self.marker(role).is_some() {
            return Err(EditError::DuplicateRole(role));
        }
        if current != Cell::Empty {
            return Ok(false);
        }
        self.set(p, role.cell())?;
        Ok(true)
    }

    /// Empty a cell, unsetting its marker if it held one.
    pub fn erase(&mut self, p: Point) -> Result<bool, EditError> {
        if self.at(p).ok_or(EditError::OutOfBounds(p))? == Cell::Empty {
            return Ok(false);
        }
        self.set(p, Cell::Empty)?;
        Ok(true)
    }

    /// Apply `tool` to a single cell.
    pub fn apply_tool(&mut self, tool: Tool, p: Point) -> Result<bool, EditError> {
        match tool {
            Tool::Wall => self.set_wall(p),
            Tool::Start => self.set_start(p),
            Tool::End => self.set_end(p),
            Tool::Erase => self.erase(p),
        }
    }

    /// Apply `tool` to every in-bounds cell on the line from `from` to `to`.
    ///
    /// This is drag painting: duplicate marker placements and out-of-bounds
    /// points along the line are skipped silently. Returns the number of
    /// cells that changed.
    pub fn stroke(&mut self, tool: Tool, from: Point, to: Point) -> usize {
        line(from, to)
            .filter(|&p| matches!(self.apply_tool(tool, p), Ok(true)))
            .count()
    }
}

/// Bresenham line from `a` to `b`, both ends included.
pub fn line(a: Point, b: Point) -> impl Iterator<Item = Point> {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx - dy;
    let mut cur = Some(a);

    std::iter::from_fn(move || {
        let p = cur?;
        if p == b {
            cur = None;
            return Some(p);
        }
        let mut next = p;
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            next.x += sx;
        }
        if e2 < dx {
            err += dx;
            next.y += sy;
        }
        cur = Some(next);
        Some(p)
    })
}
