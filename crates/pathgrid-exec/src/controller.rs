//! The controller: owns the grid, applies edits, and runs searches on a
//! background thread.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pathgrid_core::codec::{load_map, save_map};
use pathgrid_core::{CellChange, EditError, GridModel, MapFileError, MapGen, Point, Tool};
use pathgrid_paths::SearchOptions;
use rand::Rng;

use crate::config::{Config, Speed};
use crate::error::ControlError;
use crate::observer::{Observer, Outcome};
use crate::worker::{Control, Job, Worker};

/// What the controller is doing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    /// No search; the grid can be edited.
    #[default]
    Idle,
    Running,
    Paused,
}

// ---------------------------------------------------------------------------
// Shared session
// ---------------------------------------------------------------------------

/// State shared between the controller and its worker.
pub(crate) struct Session {
    pub(crate) grid: GridModel,
    pub(crate) state: RunState,
    /// Identifies the run allowed to touch the grid. Bumped whenever a run
    /// ends early so a worker left behind cannot write anymore.
    pub(crate) run_id: u64,
}

pub(crate) struct Shared {
    session: Mutex<Session>,
    delay_ms: AtomicU64,
}

impl Shared {
    pub(crate) fn new(grid: GridModel, delay: Duration) -> Self {
        Self {
            session: Mutex::new(Session {
                grid,
                state: RunState::Idle,
                run_id: 0,
            }),
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
        }
    }

    /// Lock the session. A panic while it was held leaves the grid in a
    /// consistent state, so poisoning is ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Edits the grid and runs paced A* searches over it.
///
/// Edits are only accepted while [`RunState::Idle`]. A search runs on its
/// own thread, painting visited, open and path cells into the grid and
/// reporting every change to the [`Observer`].
///
/// ```no_run
/// use std::sync::mpsc;
/// use pathgrid_core::Point;
/// use pathgrid_exec::{Config, Controller, Notification};
///
/// let (tx, rx) = mpsc::channel();
/// let mut ctl = Controller::new(Config::default(), tx);
/// ctl.set_start(Point::new(0, 0))?;
/// ctl.set_end(Point::new(10, 5))?;
/// ctl.start()?;
/// for n in rx {
///     if let Notification::Finished(outcome) = n {
///         println!("{outcome:?}");
///         break;
///     }
/// }
/// # Ok::<(), pathgrid_exec::ControlError>(())
/// ```
pub struct Controller {
    config: Config,
    shared: Arc<Shared>,
    observer: Arc<dyn Observer>,
    worker: Option<Worker>,
}

impl Controller {
    /// A controller over an empty grid of the configured size.
    pub fn new(config: Config, observer: impl Observer + 'static) -> Self {
        let grid = GridModel::new(config.width, config.height);
        let shared = Arc::new(Shared::new(grid, config.speed.delay()));
        Self {
            config,
            shared,
            observer: Arc::new(observer),
            worker: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -- queries -------------------------------------------------------------

    pub fn state(&self) -> RunState {
        self.shared.lock().state
    }

    /// Whether a search is active, paused or not.
    pub fn is_running(&self) -> bool {
        self.state() != RunState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    pub fn has_start(&self) -> bool {
        self.shared.lock().grid.has_start()
    }

    pub fn has_end(&self) -> bool {
        self.shared.lock().grid.has_end()
    }

    /// A copy of the grid as it is now.
    pub fn grid(&self) -> GridModel {
        self.shared.lock().grid.clone()
    }

    /// Read the grid in place. The search thread is held off while `f` runs.
    pub fn with_grid<T>(&self, f: impl FnOnce(&GridModel) -> T) -> T {
        f(&self.shared.lock().grid)
    }

    // -- editing -------------------------------------------------------------

    pub fn set_wall(&mut self, p: Point) -> Result<bool, ControlError> {
        self.edit(|g| g.set_wall(p))
    }

    pub fn set_start(&mut self, p: Point) -> Result<bool, ControlError> {
        self.edit(|g| g.set_start(p))
    }

    pub fn set_end(&mut self, p: Point) -> Result<bool, ControlError> {
        self.edit(|g| g.set_end(p))
    }

    pub fn erase(&mut self, p: Point) -> Result<bool, ControlError> {
        self.edit(|g| g.erase(p))
    }

    pub fn apply_tool(&mut self, tool: Tool, p: Point) -> Result<bool, ControlError> {
        self.edit(|g| g.apply_tool(tool, p))
    }

    /// Apply `tool` along the line from `from` to `to`. Returns how many
    /// cells changed.
    pub fn stroke(&mut self, tool: Tool, from: Point, to: Point) -> Result<usize, ControlError> {
        self.edit(|g| Ok(g.stroke(tool, from, to)))
    }

    /// Empty the grid and unset both markers, stopping any search first.
    pub fn clear_all(&mut self) -> Result<(), ControlError> {
        self.stop();
        self.edit(|g| {
            g.clear();
            Ok(())
        })
    }

    /// Generate a random map with `wall_probability` percent walls
    /// (the configured default when `None`), stopping any search first.
    pub fn randomize(&mut self, wall_probability: Option<u8>) -> Result<(), ControlError> {
        self.randomize_with(rand::rng(), wall_probability)
    }

    /// Like [`randomize`](Self::randomize) with a caller-supplied generator.
    pub fn randomize_with<R: Rng>(
        &mut self,
        rng: R,
        wall_probability: Option<u8>,
    ) -> Result<(), ControlError> {
        let pct = wall_probability.unwrap_or(self.config.wall_probability);
        self.stop();
        self.edit(|g| MapGen::new(rng).random_obstacles(g, pct))
    }

    // -- persistence ---------------------------------------------------------

    /// Write the grid to `path` in the versioned map format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ControlError> {
        let grid = self.grid();
        save_map(path, &grid)?;
        Ok(())
    }

    /// Replace the grid with the map at `path`, stopping any search first.
    ///
    /// Headerless files are read at the configured size, and files that
    /// record another size are rejected. On error the grid is left as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ControlError> {
        let size = self.with_grid(GridModel::size);
        let loaded = load_map(path, size)?;
        if loaded.size() != size {
            return Err(MapFileError::SizeMismatch {
                expected: size,
                actual: loaded.size(),
            }
            .into());
        }
        self.stop();
        self.edit(|g| {
            *g = loaded;
            Ok(())
        })
    }

    // -- settings ------------------------------------------------------------

    /// Change the animation speed. A running search picks it up on its next
    /// tick.
    pub fn set_speed(&mut self, speed: Speed) {
        self.config.speed = speed;
        self.shared.set_delay(speed.delay());
    }

    pub fn speed(&self) -> Speed {
        self.config.speed
    }

    /// Whether the next run reports visited and open cells.
    pub fn set_show_visited(&mut self, show: bool) {
        self.config.show_visited = show;
    }

    pub fn show_visited(&self) -> bool {
        self.config.show_visited
    }

    // -- run control ---------------------------------------------------------

    /// Start a search from the start marker to the end marker.
    ///
    /// Cells painted by a previous run are cleared first.
    pub fn start(&mut self) -> Result<(), ControlError> {
        self.reap();
        let (job, changes) = {
            let mut session = self.shared.lock();
            if session.state != RunState::Idle {
                return Err(ControlError::AlreadyRunning);
            }
            let (Some(start), Some(goal)) = (session.grid.start(), session.grid.end()) else {
                return Err(ControlError::MissingEndpoints);
            };
            let before = session.grid.clone();
            session.grid.reset();
            let changes = GridModel::diff(&before, &session.grid);
            session.run_id += 1;
            session.state = RunState::Running;
            let job = Job {
                shared: Arc::clone(&self.shared),
                observer: Arc::clone(&self.observer),
                grid: session.grid.clone(),
                start,
                goal,
                options: SearchOptions {
                    show_visited: self.config.show_visited,
                },
                run_id: session.run_id,
            };
            (job, changes)
        };
        self.notify(&changes);

        let run_id = job.run_id;
        match Worker::spawn(job) {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                log::error!("failed to spawn search thread: {e}");
                let mut session = self.shared.lock();
                if session.run_id == run_id {
                    session.state = RunState::Idle;
                }
                Err(ControlError::Spawn(e))
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), ControlError> {
        self.transition(RunState::Running, RunState::Paused, Control::Pause)
    }

    pub fn resume(&mut self) -> Result<(), ControlError> {
        self.transition(RunState::Paused, RunState::Running, Control::Resume)
    }

    /// Pause a running search or resume a paused one.
    pub fn toggle_pause(&mut self) -> Result<(), ControlError> {
        match self.state() {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Idle => Err(ControlError::NotRunning),
        }
    }

    /// Cancel the active search and clear what it painted. Does nothing when
    /// idle.
    ///
    /// Waits up to [`Config::shutdown_grace`] for the search thread. A thread
    /// that does not exit in time is left to finish on its own and can no
    /// longer touch the grid.
    pub fn stop(&mut self) {
        if !self.is_running() {
            self.reap();
            return;
        }
        if let Some(worker) = self.worker.take() {
            worker.halt(self.config.shutdown_grace);
        }

        let changes = {
            let mut session = self.shared.lock();
            if session.state == RunState::Idle {
                // Finished on its own while we were stopping it.
                return;
            }
            session.run_id += 1;
            session.state = RunState::Idle;
            let before = session.grid.clone();
            session.grid.reset();
            GridModel::diff(&before, &session.grid)
        };
        log::debug!("search stopped");
        self.notify(&changes);
        self.observer.finished(&Outcome::Cancelled);
    }

    /// Stop any search and release the worker. Also done on drop.
    pub fn shutdown(&mut self) {
        self.stop();
        self.reap();
    }

    // -- internals -----------------------------------------------------------

    /// Run an edit against the idle grid and report the cells it changed.
    fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut GridModel) -> Result<T, EditError>,
    ) -> Result<T, ControlError> {
        let (out, changes) = {
            let mut session = self.shared.lock();
            if session.state != RunState::Idle {
                return Err(ControlError::Busy);
            }
            let before = session.grid.clone();
            let out = f(&mut session.grid)?;
            (out, GridModel::diff(&before, &session.grid))
        };
        self.notify(&changes);
        Ok(out)
    }

    fn notify(&self, changes: &[CellChange]) {
        for c in changes {
            self.observer.cell_changed(c.pos, c.cell);
        }
    }

    fn transition(&mut self, from: RunState, to: RunState, cmd: Control) -> Result<(), ControlError> {
        let mut session = self.shared.lock();
        if session.state != from {
            return Err(ControlError::NotRunning);
        }
        let Some(worker) = &self.worker else {
            return Err(ControlError::NotRunning);
        };
        worker.send(cmd);
        session.state = to;
        Ok(())
    }

    /// Join a worker whose run already ended.
    fn reap(&mut self) {
        if self.state() != RunState::Idle {
            return;
        }
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
