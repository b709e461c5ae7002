//! Controller configuration.

use std::time::Duration;

use pathgrid_core::grid::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use pathgrid_core::mapgen::DEFAULT_WALL_PROBABILITY;

/// Animation speed as a level from [`Speed::MIN`] (slowest) to [`Speed::MAX`].
///
/// Level `n` waits `110 - 10 * n` milliseconds between ticks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
pub struct Speed(u8);

impl Speed {
    pub const MIN: Speed = Speed(1);
    pub const MAX: Speed = Speed(10);

    /// A speed level, or `None` when `level` is outside `1..=10`.
    pub const fn new(level: u8) -> Option<Self> {
        if level >= Self::MIN.0 && level <= Self::MAX.0 {
            Some(Speed(level))
        } else {
            None
        }
    }

    /// Like [`new`](Self::new), but out-of-range levels snap to the nearest end.
    pub fn clamped(level: u8) -> Self {
        Speed(level.clamp(Self::MIN.0, Self::MAX.0))
    }

    #[inline]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Pause between two ticks of a running search.
    #[inline]
    pub const fn delay(self) -> Duration {
        Duration::from_millis(110 - 10 * self.0 as u64)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Speed(5)
    }
}

impl From<u8> for Speed {
    fn from(level: u8) -> Self {
        Speed::clamped(level)
    }
}

impl From<Speed> for u8 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

/// Settings for a [`Controller`](crate::Controller).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Grid width in cells. Also the width assumed for headerless map files.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
    pub speed: Speed,
    /// Report expanded and discovered cells, not just the final path.
    pub show_visited: bool,
    /// How long [`stop`](crate::Controller::stop) waits for the worker before
    /// abandoning it.
    pub shutdown_grace: Duration,
    /// Wall percentage used by [`randomize`](crate::Controller::randomize)
    /// when the caller does not pass one.
    pub wall_probability: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            speed: Speed::default(),
            show_visited: true,
            shutdown_grace: Duration::from_secs(2),
            wall_probability: DEFAULT_WALL_PROBABILITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_levels() {
        assert_eq!(Speed::default().level(), 5);
        assert_eq!(Speed::default().delay(), Duration::from_millis(60));
        assert_eq!(Speed::MIN.delay(), Duration::from_millis(100));
        assert_eq!(Speed::MAX.delay(), Duration::from_millis(10));
        assert_eq!(Speed::new(0), None);
        assert_eq!(Speed::new(11), None);
        assert_eq!(Speed::new(7).map(Speed::level), Some(7));
        assert_eq!(Speed::clamped(0), Speed::MIN);
        assert_eq!(Speed::from(200), Speed::MAX);
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!((c.width, c.height), (40, 30));
        assert!(c.show_visited);
        assert_eq!(c.shutdown_grace, Duration::from_secs(2));
        assert_eq!(c.wall_probability, 30);
    }
}
