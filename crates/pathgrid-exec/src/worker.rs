//! The background thread that drives one search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pathgrid_core::{Cell, CellChange, GridModel, Point};
use pathgrid_paths::{Search, SearchOptions, SearchResult, StepEvent};

use crate::controller::{RunState, Shared};
use crate::observer::{Observer, Outcome};

// ---------------------------------------------------------------------------
// Context / Control
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag shared with the worker.
#[derive(Clone, Debug, Default)]
pub(crate) struct Context {
    done: Arc<AtomicBool>,
}

impl Context {
    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn cancel(&self) {
        self.done.store(true, Ordering::Relaxed);
    }
}

/// Commands from the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Control {
    Pause,
    Resume,
    Stop,
}

// ---------------------------------------------------------------------------
// Job / Worker
// ---------------------------------------------------------------------------

/// Everything a run needs, moved onto the worker thread.
pub(crate) struct Job {
    pub(crate) shared: Arc<Shared>,
    pub(crate) observer: Arc<dyn Observer>,
    /// The grid as it was when the run started. The search reads only this.
    pub(crate) grid: GridModel,
    pub(crate) start: Point,
    pub(crate) goal: Point,
    pub(crate) options: SearchOptions,
    pub(crate) run_id: u64,
}

/// Controller-side handle to a running worker.
pub(crate) struct Worker {
    handle: JoinHandle<()>,
    control: Sender<Control>,
    ctx: Context,
    /// Disconnects when the worker thread exits.
    done: Receiver<()>,
    run_id: u64,
}

impl Worker {
    pub(crate) fn spawn(job: Job) -> std::io::Result<Worker> {
        let (control, control_rx) = mpsc::channel();
        let (done_tx, done) = mpsc::channel::<()>();
        let ctx = Context::default();
        let run_id = job.run_id;
        let worker_ctx = ctx.clone();
        let handle = thread::Builder::new()
            .name(format!("pathgrid-search-{run_id}"))
            .spawn(move || {
                let _done = done_tx;
                run(job, &control_rx, &worker_ctx);
            })?;
        log::debug!("search run {run_id} started");
        Ok(Worker {
            handle,
            control,
            ctx,
            done,
            run_id,
        })
    }

    /// Forward a command. A worker that already exited is not an error.
    pub(crate) fn send(&self, cmd: Control) {
        self.control.send(cmd).ok();
    }

    /// Ask the worker to stop and wait up to `grace` for it to exit.
    ///
    /// Returns false if the worker was left running. The caller must then
    /// fence it off by changing the session's run id.
    pub(crate) fn halt(self, grace: Duration) -> bool {
        self.ctx.cancel();
        self.send(Control::Stop);
        match self.done.recv_timeout(grace) {
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "search run {} did not stop within {:?}; abandoning it",
                    self.run_id,
                    grace
                );
                false
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.join();
                true
            }
        }
    }

    /// Wait for a worker that has finished or is about to.
    pub(crate) fn join(self) {
        if self.handle.join().is_err() {
            log::error!("search run {} panicked", self.run_id);
        }
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(job: Job, control: &Receiver<Control>, ctx: &Context) {
    let mut search = Search::new(&job.grid, job.start, job.goal, job.options);
    let mut events = Vec::new();
    let result = loop {
        if ctx.is_done() {
            break None;
        }
        events.clear();
        let result = search.step(&mut events);
        if !relay(&job, &events) {
            break None;
        }
        if result.is_some() {
            break result;
        }
        if !pace(&job.shared, control, ctx) {
            break None;
        }
    };
    let expanded = search.expanded();
    drop(search);

    match result {
        Some(result) => finish(&job, result, expanded),
        None => log::debug!("search run {} stopped after {expanded} expansions", job.run_id),
    }
}

/// The cell an event paints, if it may paint over `current`.
fn paint(event: StepEvent, current: Cell) -> Option<Cell> {
    if current.role().is_some() {
        return None;
    }
    Some(match event {
        StepEvent::Expanded(_) => Cell::Visited,
        StepEvent::Discovered(_) => Cell::Open,
        StepEvent::PathStep(_) => Cell::Path,
    })
}

/// Apply one tick's events to the shared grid and report them.
///
/// Returns false when this run has been fenced off.
fn relay(job: &Job, events: &[StepEvent]) -> bool {
    let mut session = job.shared.lock();
    if session.run_id != job.run_id {
        return false;
    }
    let mut changes = Vec::with_capacity(events.len());
    for &event in events {
        let pos = event.pos();
        let Some(cell) = session.grid.at(pos).and_then(|c| paint(event, c)) else {
            continue;
        };
        if session.grid.set(pos, cell).is_ok() {
            changes.push(CellChange { pos, cell });
        }
    }
    for c in &changes {
        job.observer.cell_changed(c.pos, c.cell);
    }
    true
}

/// Wait out the tick delay while serving control commands.
///
/// Returns false when the run should stop.
fn pace(shared: &Shared, control: &Receiver<Control>, ctx: &Context) -> bool {
    let deadline = Instant::now() + shared.delay();
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match control.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => return !ctx.is_done(),
            Err(RecvTimeoutError::Disconnected) | Ok(Control::Stop) => return false,
            Ok(Control::Resume) => {}
            Ok(Control::Pause) => return wait_for_resume(control) && !ctx.is_done(),
        }
    }
}

fn wait_for_resume(control: &Receiver<Control>) -> bool {
    log::trace!("search paused");
    loop {
        match control.recv() {
            Ok(Control::Resume) => {
                log::trace!("search resumed");
                return true;
            }
            Ok(Control::Pause) => {}
            Ok(Control::Stop) | Err(_) => return false,
        }
    }
}

fn finish(job: &Job, result: SearchResult, expanded: usize) {
    let mut session = job.shared.lock();
    if session.run_id != job.run_id {
        return;
    }
    session.state = RunState::Idle;
    match &result {
        SearchResult::Found(path) => log::info!(
            "search run {}: path of {} cells, {expanded} expansions",
            job.run_id,
            path.len()
        ),
        SearchResult::NotFound => {
            log::info!("search run {}: no path, {expanded} expansions", job.run_id)
        }
    }
    job.observer.finished(&Outcome::from(result));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_keeps_markers() {
        let p = Point::ZERO;
        assert_eq!(paint(StepEvent::Expanded(p), Cell::Start), None);
        assert_eq!(paint(StepEvent::PathStep(p), Cell::End), None);
        assert_eq!(paint(StepEvent::PathStep(p), Cell::Visited), Some(Cell::Path));
        assert_eq!(paint(StepEvent::Expanded(p), Cell::Open), Some(Cell::Visited));
        assert_eq!(paint(StepEvent::Discovered(p), Cell::Empty), Some(Cell::Open));
    }

    #[test]
    fn pause_blocks_until_resume() {
        let (tx, rx) = mpsc::channel();
        let shared = Shared::new(GridModel::new(2, 2), Duration::from_secs(30));
        let ctx = Context::default();
        tx.send(Control::Pause).unwrap();
        tx.send(Control::Pause).unwrap();
        tx.send(Control::Resume).unwrap();
        let t = Instant::now();
        assert!(pace(&shared, &rx, &ctx));
        assert!(t.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn stop_and_disconnect_end_the_run() {
        let shared = Shared::new(GridModel::new(2, 2), Duration::from_secs(30));
        let ctx = Context::default();

        let (tx, rx) = mpsc::channel();
        tx.send(Control::Stop).unwrap();
        assert!(!pace(&shared, &rx, &ctx));

        tx.send(Control::Pause).unwrap();
        tx.send(Control::Stop).unwrap();
        assert!(!pace(&shared, &rx, &ctx));

        drop(tx);
        assert!(!pace(&shared, &rx, &ctx));
    }

    #[test]
    fn cancelled_context_stops_after_delay() {
        let shared = Shared::new(GridModel::new(2, 2), Duration::from_millis(1));
        let ctx = Context::default();
        let (_tx, rx) = mpsc::channel();
        assert!(pace(&shared, &rx, &ctx));
        ctx.cancel();
        assert!(!pace(&shared, &rx, &ctx));
    }
}
