use std::io;

use pathgrid_core::{EditError, MapFileError};
use thiserror::Error;

/// A request the [`Controller`](crate::Controller) turned down.
///
/// Apart from [`Map`](Self::Map) and [`Spawn`](Self::Spawn), nothing changes
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("a search is already running")]
    AlreadyRunning,
    #[error("both a start and an end marker are required")]
    MissingEndpoints,
    #[error("no search is running")]
    NotRunning,
    #[error("the grid cannot be edited while a search is running")]
    Busy,
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Map(#[from] MapFileError),
    #[error("could not start the search thread: {0}")]
    Spawn(#[source] io::Error),
}
