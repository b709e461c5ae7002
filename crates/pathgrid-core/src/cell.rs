//! The [`Cell`] type and the marker [`Role`]s a cell can carry.

use std::fmt;

/// The state of a single grid cell.
///
/// The discriminants are the values stored in map files, so they must never
/// be renumbered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum Cell {
    #[default]
    Empty = 0,
    Wall = 1,
    Start = 2,
    End = 3,
    Path = 4,
    Visited = 5,
    Open = 6,
}

impl Cell {
    /// All cell values in discriminant order.
    pub const ALL: [Cell; 7] = [
        Cell::Empty,
        Cell::Wall,
        Cell::Start,
        Cell::End,
        Cell::Path,
        Cell::Visited,
        Cell::Open,
    ];

    /// Decode a stored cell value. Returns `None` for anything outside 0..=6.
    #[inline]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Wall),
            2 => Some(Cell::Start),
            3 => Some(Cell::End),
            4 => Some(Cell::Path),
            5 => Some(Cell::Visited),
            6 => Some(Cell::Open),
            _ => None,
        }
    }

    /// The stored integer value.
    #[inline]
    pub const fn value(self) -> i32 {
        self as i32
    }

    /// Walls and the start/end markers: cells a search never repaints.
    #[inline]
    pub const fn is_structural(self) -> bool {
        matches!(self, Cell::Wall | Cell::Start | Cell::End)
    }

    /// Path, visited and open decorations left behind by a search.
    #[inline]
    pub const fn is_visual(self) -> bool {
        matches!(self, Cell::Path | Cell::Visited | Cell::Open)
    }

    /// The marker role this cell carries, if any.
    #[inline]
    pub const fn role(self) -> Option<Role> {
        match self {
            Cell::Start => Some(Role::Start),
            Cell::End => Some(Role::End),
            _ => None,
        }
    }
}

impl From<Cell> for i32 {
    fn from(c: Cell) -> Self {
        c.value()
    }
}

/// One of the two unique markers on a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Start,
    End,
}

impl Role {
    /// The cell value that represents this role.
    #[inline]
    pub const fn cell(self) -> Cell {
        match self {
            Role::Start => Cell::Start,
            Role::End => Cell::End,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Start => f.write_str("start"),
            Role::End => f.write_str("end"),
        }
    }
}
