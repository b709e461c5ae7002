//! Step-wise A* search on a [`pathgrid_core::GridModel`].
//!
//! The search moves in eight directions, straight steps cost
//! [`STRAIGHT_COST`] and diagonal steps [`DIAGONAL_COST`]. Unlike a one-shot
//! solver, [`Search`] advances one tick per call to [`Search::step`] and
//! reports each tick as [`StepEvent`]s, so a caller can animate the frontier
//! and the final path at whatever pace it likes.
//!
//! ```
//! use pathgrid_core::{GridModel, Point};
//! use pathgrid_paths::{astar_path, path_cost};
//!
//! let grid = GridModel::new(3, 3);
//! let result = astar_path(&grid, Point::new(0, 0), Point::new(2, 2));
//! assert_eq!(path_cost(result.path().unwrap()), 28);
//! ```

mod distance;
mod node;
mod search;

pub use distance::{DIAGONAL_COST, STRAIGHT_COST, manhattan, path_cost, step_cost};
pub use node::SearchNode;
pub use search::{DIRECTIONS, Search, SearchOptions, SearchResult, StepEvent, astar_path};
