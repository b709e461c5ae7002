//! **pathgrid-exec**: runs a paced, pausable A* search over an editable grid.
//!
//! The [`Controller`] owns the [`GridModel`](pathgrid_core::GridModel). While
//! idle it accepts edits; [`Controller::start`] hands a snapshot to a
//! background thread that advances a [`pathgrid_paths::Search`] one tick at a
//! time, waits [`Speed::delay`] between ticks, and paints each tick into the
//! shared grid. Every cell change and the final [`Outcome`] go to an
//! [`Observer`], in the order they happened.

pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
mod worker;

pub use config::{Config, Speed};
pub use controller::{Controller, RunState};
pub use error::ControlError;
pub use observer::{Notification, NullObserver, Observer, Outcome};
