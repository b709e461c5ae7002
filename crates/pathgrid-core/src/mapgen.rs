//! Random obstacle maps.
//!
//! Each cell independently becomes a wall with a given probability. The start
//! marker then goes somewhere in the top-left third of the grid and the end
//! marker in the bottom-right third, so a generated map always has a search
//! worth watching.

use rand::Rng;

use crate::cell::{Cell, Role};
use crate::error::EditError;
use crate::geom::{Point, Range};
use crate::grid::GridModel;

/// Default wall probability, in percent.
pub const DEFAULT_WALL_PROBABILITY: u8 = 30;

/// Map generator driven by a random number generator.
pub struct MapGen<R: Rng> {
    pub rng: R,
}

impl<R: Rng> MapGen<R> {
    /// Create a new generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Replace the contents of `grid` with random walls and fresh markers.
    ///
    /// `wall_probability` is a percentage; values above 100 are treated as
    /// 100. A marker cell is always carved free even if it rolled a wall. On
    /// a grid with fewer than two cells no markers are placed.
    pub fn random_obstacles(
        &mut self,
        grid: &mut GridModel,
        wall_probability: u8,
    ) -> Result<(), EditError> {
        let pct = u32::from(wall_probability.min(100));
        let rng = &mut self.rng;
        grid.fill_fn(|_| {
            if rng.random_range(0..100) < pct {
                Cell::Wall
            } else {
                Cell::Empty
            }
        });

        if grid.bounds().len() < 2 {
            return Ok(());
        }

        let (w, h) = (grid.width(), grid.height());
        let (tw, th) = ((w / 3).max(1), (h / 3).max(1));
        let start_region = Range::new(0, 0, tw, th);
        let end_region = Range::new(w - tw, h - th, w, h);

        let start = self.pick(grid, start_region, None);
        let end = self.pick(grid, end_region, start);
        for (role, pos) in [(Role::Start, start), (Role::End, end)] {
            if let Some(pos) = pos {
                grid.set(pos, role.cell())?;
            }
        }
        log::debug!(
            "generated {}x{} map: {} walls, start {:?}, end {:?}",
            w,
            h,
            grid.count(Cell::Wall),
            start,
            end
        );
        Ok(())
    }

    /// Pick a random cell in `region`, preferring empty ones and never
    /// returning `exclude`. Falls back to the whole grid when the region has
    /// no candidate at all.
    fn pick(&mut self, grid: &GridModel, region: Range, exclude: Option<Point>) -> Option<Point> {
        let allowed = |p: &Point| Some(*p) != exclude;
        let free: Vec<Point> = region
            .iter()
            .filter(allowed)
            .filter(|&p| grid.at(p) == Some(Cell::Empty))
            .collect();
        if !free.is_empty() {
            return Some(free[self.rng.random_range(0..free.len())]);
        }
        let mut any: Vec<Point> = region.iter().filter(allowed).collect();
        if any.is_empty() {
            any = grid.bounds().iter().filter(allowed).collect();
        }
        if any.is_empty() {
            return None;
        }
        Some(any[self.rng.random_range(0..any.len())])
    }
}
