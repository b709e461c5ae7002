use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use pathgrid_core::{Cell, GridModel, MapFileError, Point, Tool};
use pathgrid_exec::{Config, ControlError, Controller, Notification, Outcome, RunState, Speed};
use pathgrid_paths::{Search, SearchOptions, StepEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;

const TIMEOUT: Duration = Duration::from_secs(20);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

fn controller(width: i32, height: i32, speed: Speed) -> (Controller, Receiver<Notification>) {
    init_logger();
    let (tx, rx) = mpsc::channel();
    let config = Config {
        width,
        height,
        speed,
        ..Config::default()
    };
    (Controller::new(config, tx), rx)
}

/// Collect notifications up to and including the next `Finished`.
fn wait_finished(rx: &Receiver<Notification>) -> (Vec<Notification>, Outcome) {
    let deadline = Instant::now() + TIMEOUT;
    let mut seen = Vec::new();
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left).expect("run did not finish in time") {
            Notification::Finished(outcome) => return (seen, outcome),
            n => seen.push(n),
        }
    }
}

fn painted(n: &Notification) -> Option<Cell> {
    match n {
        Notification::CellChanged { cell, .. } => Some(*cell),
        Notification::Finished(_) => None,
    }
}

fn has_visual_cells(grid: &GridModel) -> bool {
    grid.iter().any(|(_, c)| c.is_visual())
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pathgrid-exec-{}-{name}", std::process::id()))
}

#[test]
fn three_by_three_run_paints_the_diagonal() {
    let (mut ctl, rx) = controller(3, 3, Speed::MAX);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(2, 2)).unwrap();
    rx.try_iter().count();

    ctl.start().unwrap();
    let (seen, outcome) = wait_finished(&rx);
    assert_eq!(outcome, Outcome::Found(vec![p(0, 0), p(1, 1), p(2, 2)]));
    assert_eq!(
        seen.last(),
        Some(&Notification::CellChanged {
            pos: p(1, 1),
            cell: Cell::Path
        })
    );

    assert_eq!(ctl.state(), RunState::Idle);
    let grid = ctl.grid();
    assert_eq!(grid.at(p(0, 0)), Some(Cell::Start));
    assert_eq!(grid.at(p(1, 1)), Some(Cell::Path));
    assert_eq!(grid.at(p(2, 2)), Some(Cell::End));
    assert_eq!(grid.count(Cell::Path), 1);
}

#[test]
fn markers_are_never_painted_over() {
    let (mut ctl, rx) = controller(6, 4, Speed::MAX);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(5, 3)).unwrap();
    rx.try_iter().count();
    ctl.start().unwrap();
    let (seen, _) = wait_finished(&rx);
    assert!(seen.iter().all(|n| match n {
        Notification::CellChanged { pos, .. } => *pos != p(0, 0) && *pos != p(5, 3),
        Notification::Finished(_) => true,
    }));
    assert_eq!(ctl.with_grid(|g| (g.start(), g.end())), (Some(p(0, 0)), Some(p(5, 3))));
}

#[test]
fn rejected_requests_change_nothing() {
    let (mut ctl, _rx) = controller(60, 60, Speed::MIN);
    assert!(matches!(ctl.start(), Err(ControlError::MissingEndpoints)));
    assert!(matches!(ctl.pause(), Err(ControlError::NotRunning)));
    assert!(matches!(ctl.resume(), Err(ControlError::NotRunning)));
    assert!(matches!(ctl.toggle_pause(), Err(ControlError::NotRunning)));

    ctl.set_start(p(0, 0)).unwrap();
    assert!(matches!(ctl.start(), Err(ControlError::MissingEndpoints)));
    assert!(matches!(
        ctl.set_start(p(3, 3)),
        Err(ControlError::Edit(pathgrid_core::EditError::DuplicateRole(_)))
    ));
    assert!(matches!(
        ctl.set_wall(p(60, 0)),
        Err(ControlError::Edit(pathgrid_core::EditError::OutOfBounds(_)))
    ));
    ctl.set_end(p(59, 59)).unwrap();

    ctl.start().unwrap();
    assert!(ctl.is_running());
    assert!(matches!(ctl.start(), Err(ControlError::AlreadyRunning)));
    assert!(matches!(ctl.set_wall(p(5, 5)), Err(ControlError::Busy)));
    assert!(matches!(ctl.erase(p(0, 0)), Err(ControlError::Busy)));
    assert!(matches!(ctl.stroke(Tool::Wall, p(1, 1), p(4, 4)), Err(ControlError::Busy)));
    assert!(matches!(ctl.resume(), Err(ControlError::NotRunning)));

    ctl.pause().unwrap();
    assert!(matches!(ctl.set_wall(p(5, 5)), Err(ControlError::Busy)));
    assert!(matches!(ctl.start(), Err(ControlError::AlreadyRunning)));
    ctl.stop();

    assert_eq!(ctl.state(), RunState::Idle);
    assert!(ctl.set_wall(p(5, 5)).unwrap());
}

#[test]
fn pause_holds_the_grid_until_resume() {
    let (mut ctl, rx) = controller(8, 8, Speed::MIN);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(7, 7)).unwrap();
    ctl.start().unwrap();
    thread::sleep(Duration::from_millis(250));

    ctl.toggle_pause().unwrap();
    assert!(ctl.is_paused());
    // At most the tick in flight lands after the pause.
    thread::sleep(Duration::from_millis(150));
    let frozen = ctl.grid();
    thread::sleep(Duration::from_millis(400));
    assert_eq!(ctl.grid(), frozen);
    assert!(has_visual_cells(&frozen));

    ctl.set_speed(Speed::MAX);
    ctl.toggle_pause().unwrap();
    assert_eq!(ctl.state(), RunState::Running);
    let (_, outcome) = wait_finished(&rx);
    let path = match outcome {
        Outcome::Found(path) => path,
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(path.len(), 8);
    assert_eq!(pathgrid_paths::path_cost(&path), 98);
}

#[test]
fn stop_cancels_large_search_within_grace() {
    let (mut ctl, rx) = controller(100, 100, Speed::MAX);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(99, 99)).unwrap();
    ctl.start().unwrap();
    thread::sleep(Duration::from_millis(200));

    let t = Instant::now();
    ctl.stop();
    assert!(t.elapsed() < ctl.config().shutdown_grace);
    assert_eq!(ctl.state(), RunState::Idle);
    assert!(!ctl.with_grid(has_visual_cells));
    assert!(ctl.has_start() && ctl.has_end());

    let rest: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(rest.last(), Some(&Notification::Finished(Outcome::Cancelled)));
    assert!(!rest.iter().any(|n| matches!(
        n,
        Notification::Finished(Outcome::Found(_) | Outcome::NotFound)
    )));

    // Stopping again is a no-op.
    ctl.stop();
    assert!(rx.try_recv().is_err());
}

#[test]
fn stop_from_pause() {
    let (mut ctl, rx) = controller(30, 30, Speed::MIN);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(29, 29)).unwrap();
    ctl.start().unwrap();
    ctl.pause().unwrap();

    let t = Instant::now();
    ctl.stop();
    assert!(t.elapsed() < Duration::from_secs(1));
    assert!(!ctl.is_running());
    let rest: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(rest.last(), Some(&Notification::Finished(Outcome::Cancelled)));
}

#[test]
fn walled_in_start_reports_failure() {
    let (mut ctl, rx) = controller(5, 5, Speed::MAX);
    ctl.set_start(p(2, 2)).unwrap();
    ctl.set_end(p(4, 4)).unwrap();
    for x in 1..=3 {
        ctl.set_wall(p(x, 1)).unwrap();
        ctl.set_wall(p(x, 3)).unwrap();
    }
    ctl.set_wall(p(1, 2)).unwrap();
    ctl.set_wall(p(3, 2)).unwrap();

    ctl.start().unwrap();
    let (_, outcome) = wait_finished(&rx);
    assert_eq!(outcome, Outcome::NotFound);
    assert!(outcome.is_failure());
    assert_eq!(ctl.state(), RunState::Idle);
}

#[test]
fn hidden_visits_paint_only_the_path() {
    let (mut ctl, rx) = controller(10, 6, Speed::MAX);
    ctl.set_show_visited(false);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(9, 5)).unwrap();
    ctl.stroke(Tool::Wall, p(5, 0), p(5, 4)).unwrap();
    rx.try_iter().count();

    ctl.start().unwrap();
    let (seen, outcome) = wait_finished(&rx);
    assert!(outcome != Outcome::NotFound);
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|n| painted(n) == Some(Cell::Path)));
    let grid = ctl.grid();
    assert_eq!(grid.count(Cell::Visited) + grid.count(Cell::Open), 0);
}

#[test]
fn next_run_clears_previous_paint() {
    let (mut ctl, rx) = controller(6, 6, Speed::MAX);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(5, 5)).unwrap();
    ctl.start().unwrap();
    wait_finished(&rx);
    let painted_cells = ctl.with_grid(|g| g.iter().filter(|(_, c)| c.is_visual()).count());
    assert!(painted_cells > 0);

    ctl.start().unwrap();
    let (seen, _) = wait_finished(&rx);
    let resets = seen
        .iter()
        .take_while(|n| painted(n) == Some(Cell::Empty))
        .count();
    assert_eq!(resets, painted_cells);
}

#[test]
fn whole_grid_edits_stop_the_search() {
    let (mut ctl, rx) = controller(50, 50, Speed::MIN);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(49, 49)).unwrap();
    ctl.start().unwrap();

    ctl.clear_all().unwrap();
    assert_eq!(ctl.state(), RunState::Idle);
    assert!(!ctl.has_start() && !ctl.has_end());
    assert_eq!(ctl.grid(), GridModel::new(50, 50));
    assert!(rx
        .try_iter()
        .any(|n| n == Notification::Finished(Outcome::Cancelled)));
}

#[test]
fn seeded_randomize_is_reproducible() {
    let (mut a, rx) = controller(20, 15, Speed::default());
    let (mut b, _) = controller(20, 15, Speed::default());
    a.randomize_with(StdRng::seed_from_u64(9), Some(35)).unwrap();
    b.randomize_with(StdRng::seed_from_u64(9), Some(35)).unwrap();
    assert_eq!(a.grid(), b.grid());
    assert!(a.has_start() && a.has_end());

    let changed = a.with_grid(|g| g.iter().filter(|(_, c)| *c != Cell::Empty).count());
    assert_eq!(rx.try_iter().count(), changed);

    a.randomize(Some(0)).unwrap();
    assert_eq!(a.with_grid(|g| g.count(Cell::Wall)), 0);
}

#[test]
fn save_and_load_round_trip() {
    let path = temp_path("round-trip.bin");
    let (mut ctl, _rx) = controller(12, 9, Speed::default());
    ctl.randomize_with(StdRng::seed_from_u64(3), None).unwrap();
    let saved = ctl.grid();
    ctl.save(&path).unwrap();

    ctl.clear_all().unwrap();
    ctl.load(&path).unwrap();
    assert_eq!(ctl.grid(), saved);
    fs::remove_file(&path).ok();
}

#[test]
fn failed_load_keeps_the_grid() {
    let path = temp_path("broken.bin");
    fs::write(&path, [1u8, 2, 3, 4, 5]).unwrap();
    let (mut ctl, rx) = controller(4, 4, Speed::default());
    ctl.set_wall(p(1, 1)).unwrap();
    let before = ctl.grid();
    rx.try_iter().count();

    assert!(matches!(ctl.load(&path), Err(ControlError::Map(_))));
    assert!(matches!(
        ctl.load(temp_path("does-not-exist.bin")),
        Err(ControlError::Map(_))
    ));
    assert_eq!(ctl.grid(), before);
    assert!(rx.try_recv().is_err());
    fs::remove_file(&path).ok();
}

#[test]
fn legacy_file_loads_at_configured_size() {
    let path = temp_path("legacy.bin");
    let mut grid = GridModel::new(5, 4);
    grid.set_start(p(0, 3)).unwrap();
    grid.set_wall(p(2, 2)).unwrap();
    fs::write(&path, pathgrid_core::codec::encode_legacy(&grid)).unwrap();

    let (mut ctl, _rx) = controller(5, 4, Speed::default());
    ctl.load(&path).unwrap();
    assert_eq!(ctl.grid(), grid);

    let (mut other, _rx) = controller(6, 4, Speed::default());
    assert!(other.load(&path).is_err());
    fs::remove_file(&path).ok();
}

#[test]
fn map_of_another_size_is_rejected() {
    let path = temp_path("small.bin");
    fs::write(&path, pathgrid_core::codec::encode(&GridModel::new(7, 3))).unwrap();
    let (mut ctl, rx) = controller(40, 30, Speed::default());
    ctl.set_wall(p(39, 29)).unwrap();
    let before = ctl.grid();
    rx.try_iter().count();

    let err = ctl.load(&path).unwrap_err();
    assert!(matches!(
        err,
        ControlError::Map(MapFileError::SizeMismatch { expected, actual })
            if expected == p(40, 30) && actual == p(7, 3)
    ));
    assert_eq!(ctl.grid(), before);
    assert!(rx.try_recv().is_err());
    assert!(ctl.erase(p(39, 29)).unwrap());
    fs::remove_file(&path).ok();
}

#[test]
fn notifications_follow_search_event_order() {
    let (mut ctl, rx) = controller(7, 5, Speed::MAX);
    let (start, goal) = (p(0, 2), p(6, 2));
    ctl.set_start(start).unwrap();
    ctl.set_end(goal).unwrap();
    ctl.stroke(Tool::Wall, p(3, 0), p(3, 3)).unwrap();
    ctl.set_wall(p(5, 3)).unwrap();
    let grid = ctl.grid();
    rx.try_iter().count();

    let mut expected = Vec::new();
    let mut search = Search::new(&grid, start, goal, SearchOptions::default());
    search.run(
        || true,
        |event| {
            let cell = match event {
                StepEvent::Expanded(_) => Cell::Visited,
                StepEvent::Discovered(_) => Cell::Open,
                StepEvent::PathStep(_) => Cell::Path,
            };
            let pos = event.pos();
            if pos != start && pos != goal {
                expected.push(Notification::CellChanged { pos, cell });
            }
        },
    );

    ctl.start().unwrap();
    let (seen, outcome) = wait_finished(&rx);
    assert!(matches!(outcome, Outcome::Found(_)));
    assert_eq!(seen, expected);
}

#[test]
fn drop_while_running_returns() {
    let (mut ctl, _rx) = controller(80, 80, Speed::MIN);
    ctl.set_start(p(0, 0)).unwrap();
    ctl.set_end(p(79, 79)).unwrap();
    ctl.start().unwrap();
    let t = Instant::now();
    drop(ctl);
    assert!(t.elapsed() < Duration::from_secs(2));
}
