//! Error types for grid edits and map files.

use std::io;

use thiserror::Error;

use crate::cell::Role;
use crate::geom::Point;

/// A rejected grid edit. The grid is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("position {0} is outside the grid")]
    OutOfBounds(Point),
    #[error("only one {0} marker may be placed")]
    DuplicateRole(Role),
}

/// A map file that could not be read or decoded.
#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("map file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("map data has {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("unsupported map format version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid map dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },
    #[error("invalid cell value {value} at record {index}")]
    InvalidCell { index: usize, value: i32 },
    #[error("{role} coordinate {pos} is outside the grid")]
    InvalidCoordinate { role: Role, pos: Point },
    #[error("{role} marker does not match the cell data")]
    InconsistentMarker { role: Role },
    #[error("map is {}x{}, expected {}x{}", actual.x, actual.y, expected.x, expected.y)]
    SizeMismatch { expected: Point, actual: Point },
}
