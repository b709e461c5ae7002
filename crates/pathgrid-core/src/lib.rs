//! **pathgrid-core**: the grid a pathfinding visualiser edits and searches.
//!
//! This crate provides the foundational types used by the rest of *pathgrid*:
//! geometry primitives, the cell enum, the [`GridModel`] with its marker
//! invariants, the editing tools a consumer applies to it, random map
//! generation, and the binary map file format.

pub mod cell;
pub mod codec;
pub mod edit;
pub mod error;
pub mod geom;
pub mod grid;
pub mod mapgen;

pub use cell::{Cell, Role};
pub use edit::Tool;
pub use error::{EditError, MapFileError};
pub use geom::{Point, Range};
pub use grid::{CellChange, GridModel};
pub use mapgen::MapGen;
