//! Notifications from the controller to whatever draws the grid.

use std::sync::mpsc::Sender;

use pathgrid_core::{Cell, Point};
use pathgrid_paths::SearchResult;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    /// The search reached the end marker along this path.
    Found(Vec<Point>),
    /// Every reachable cell was expanded without reaching the end marker.
    NotFound,
    /// The run was stopped before it finished.
    Cancelled,
}

impl Outcome {
    /// Whether this outcome should be reported to the user as "no path".
    ///
    /// A found path is shown by its animation and a cancelled run needs no
    /// notice.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::NotFound)
    }
}

impl From<SearchResult> for Outcome {
    fn from(result: SearchResult) -> Self {
        match result {
            SearchResult::Found(path) => Outcome::Found(path),
            SearchResult::NotFound => Outcome::NotFound,
        }
    }
}

/// Receiver of grid changes and run outcomes.
///
/// Calls come from the controller's thread for edits and from the search
/// thread while a run is active, never both at once. The search thread calls
/// in with the grid lock held, so an observer must not call back into the
/// controller.
pub trait Observer: Send + Sync {
    /// `pos` now holds `cell`.
    fn cell_changed(&self, pos: Point, cell: Cell);

    /// A run ended.
    fn finished(&self, outcome: &Outcome);
}

/// An observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn cell_changed(&self, _pos: Point, _cell: Cell) {}

    fn finished(&self, _outcome: &Outcome) {}
}

/// A notification as a message, for consumers that prefer a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notification {
    CellChanged { pos: Point, cell: Cell },
    Finished(Outcome),
}

/// Forwards notifications over the channel. A dropped receiver is ignored.
impl Observer for Sender<Notification> {
    fn cell_changed(&self, pos: Point, cell: Cell) {
        self.send(Notification::CellChanged { pos, cell }).ok();
    }

    fn finished(&self, outcome: &Outcome) {
        self.send(Notification::Finished(outcome.clone())).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn channel_observer_forwards_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.cell_changed(Point::new(1, 2), Cell::Open);
        tx.finished(&Outcome::NotFound);
        let got: Vec<Notification> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Notification::CellChanged {
                    pos: Point::new(1, 2),
                    cell: Cell::Open
                },
                Notification::Finished(Outcome::NotFound),
            ]
        );
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        tx.cell_changed(Point::ZERO, Cell::Path);
    }

    #[test]
    fn failure_is_only_not_found() {
        assert!(Outcome::NotFound.is_failure());
        assert!(!Outcome::Cancelled.is_failure());
        assert!(!Outcome::Found(vec![Point::ZERO]).is_failure());
        assert_eq!(Outcome::from(SearchResult::NotFound), Outcome::NotFound);
    }
}
