//! Incremental A* over a [`GridModel`].
//!
//! A [`Search`] advances one *tick* at a time: either one node expansion
//! (an [`StepEvent::Expanded`] followed by the [`StepEvent::Discovered`]
//! events for its new neighbours) or one cell of the final path animation.
//! Between ticks the search can be left alone indefinitely, which is what
//! lets a caller pace, pause and resume it.

use std::mem;

use pathgrid_core::{GridModel, Point};

use crate::distance::{manhattan, step_cost};
use crate::node::{Frontier, NO_PARENT, SearchNode};

/// Neighbour offsets: the four axis-aligned moves, then the four diagonals.
pub const DIRECTIONS: [Point; 8] = [
    Point::new(0, 1),
    Point::new(1, 0),
    Point::new(0, -1),
    Point::new(-1, 0),
    Point::new(1, 1),
    Point::new(1, -1),
    Point::new(-1, 1),
    Point::new(-1, -1),
];

/// Arena slot for cells that have no node yet.
const NO_NODE: u32 = u32::MAX;

/// One observable change produced by a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepEvent {
    /// The cell moved from the frontier to the closed set.
    Expanded(Point),
    /// The cell was added to the frontier for the first time.
    Discovered(Point),
    /// The cell is part of the final path; emitted in start → goal order.
    PathStep(Point),
}

impl StepEvent {
    /// The cell this event is about.
    #[inline]
    pub fn pos(self) -> Point {
        match self {
            StepEvent::Expanded(p) | StepEvent::Discovered(p) | StepEvent::PathStep(p) => p,
        }
    }
}

/// How a search ended.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchResult {
    /// A cheapest path, including both endpoints.
    Found(Vec<Point>),
    NotFound,
}

impl SearchResult {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found(_))
    }

    /// The path, if one was found.
    pub fn path(&self) -> Option<&[Point]> {
        match self {
            SearchResult::Found(path) => Some(path),
            SearchResult::NotFound => None,
        }
    }
}

/// Search settings that do not affect the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// Report `Expanded` and `Discovered` events. When off, only the path
    /// animation is reported; the search itself runs identically.
    pub show_visited: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { show_visited: true }
    }
}

enum Phase {
    Searching,
    Tracing { path: Vec<Point>, next: usize },
    Done(SearchResult),
}

/// A resumable A* search from `start` to `goal`.
///
/// Moves go to all eight neighbours at cost 10 (straight) or 14 (diagonal).
/// Walls block, and a diagonal move is refused when both cells beside it are
/// walls. The heuristic is the plain Manhattan distance, not scaled to the
/// step costs; it stays admissible because every step costs at least 10
/// while the estimate drops by at most 2.
pub struct Search<'g> {
    grid: &'g GridModel,
    start: Point,
    goal: Point,
    options: SearchOptions,
    nodes: Vec<SearchNode>,
    /// Cell index → arena index, or `NO_NODE`.
    index: Vec<u32>,
    closed: Vec<bool>,
    frontier: Frontier,
    phase: Phase,
    expanded: usize,
}

impl<'g> Search<'g> {
    /// Prepare a search. Nothing is expanded until the first [`step`](Self::step).
    ///
    /// An endpoint outside the grid gives a search that finishes with
    /// [`SearchResult::NotFound`] on its first tick.
    pub fn new(grid: &'g GridModel, start: Point, goal: Point, options: SearchOptions) -> Self {
        let len = grid.bounds().len();
        let mut search = Self {
            grid,
            start,
            goal,
            options,
            nodes: Vec::new(),
            index: vec![NO_NODE; len],
            closed: vec![false; len],
            frontier: Frontier::default(),
            phase: Phase::Searching,
            expanded: 0,
        };
        if let (Some(si), true) = (grid.idx(start), grid.contains(goal)) {
            search.nodes.push(SearchNode::root(start, manhattan(start, goal)));
            search.index[si] = 0;
            search.frontier.push(0, search.nodes[0].f);
        }
        search
    }

    #[inline]
    pub fn start(&self) -> Point {
        self.start
    }

    #[inline]
    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Number of entries in the frontier, stale ones included.
    #[inline]
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Number of nodes expanded so far.
    #[inline]
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Whether the search has produced its result.
    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Done(_))
    }

    /// The arena node for `p`, while the search still holds its nodes.
    pub fn node(&self, p: Point) -> Option<&SearchNode> {
        let i = *self.index.get(self.grid.idx(p)?)?;
        self.nodes.get(i as usize)
    }

    /// Advance by one tick, appending its events to `events` in order.
    ///
    /// Returns the result on the tick that finishes the search; the events
    /// pushed by that same call belong before it. Once finished, every
    /// further call returns the same result and pushes nothing.
    pub fn step(&mut self, events: &mut Vec<StepEvent>) -> Option<SearchResult> {
        if let Phase::Searching = self.phase {
            if let Some(result) = self.expand(events) {
                return Some(result);
            }
        }
        match &mut self.phase {
            Phase::Searching => None,
            Phase::Tracing { path, next } => {
                events.push(StepEvent::PathStep(path[*next]));
                *next += 1;
                if *next < path.len() {
                    return None;
                }
                let result = SearchResult::Found(mem::take(path));
                self.phase = Phase::Done(result.clone());
                Some(result)
            }
            Phase::Done(result) => Some(result.clone()),
        }
    }

    /// Drive the search until it finishes or `should_continue` returns false.
    ///
    /// `should_continue` is consulted before every tick. Returns `None` when
    /// stopped early; calling `run` again resumes exactly where it left off.
    pub fn run(
        &mut self,
        mut should_continue: impl FnMut() -> bool,
        mut on_event: impl FnMut(StepEvent),
    ) -> Option<SearchResult> {
        let mut events = Vec::with_capacity(9);
        while should_continue() {
            events.clear();
            let result = self.step(&mut events);
            events.drain(..).for_each(&mut on_event);
            if result.is_some() {
                return result;
            }
        }
        None
    }

    /// Pop the next live node and either expand it or start tracing the
    /// path. Returns `NotFound` when the frontier runs dry.
    fn expand(&mut self, events: &mut Vec<StepEvent>) -> Option<SearchResult> {
        let current = loop {
            let Some(entry) = self.frontier.pop() else {
                log::debug!("no path: frontier exhausted after {} expansions", self.expanded);
                self.release();
                self.phase = Phase::Done(SearchResult::NotFound);
                return Some(SearchResult::NotFound);
            };
            let node = &self.nodes[entry.idx as usize];
            let closed = self.grid.idx(node.pos).is_none_or(|ci| self.closed[ci]);
            // Skip entries superseded by a cheaper push or already expanded.
            if closed || entry.f != node.f {
                continue;
            }
            break entry.idx;
        };

        let pos = self.nodes[current as usize].pos;
        if pos == self.goal {
            let path = self.trace(current);
            log::debug!(
                "path of {} cells found after {} expansions",
                path.len(),
                self.expanded
            );
            self.release();
            self.phase = Phase::Tracing { path, next: 0 };
            return None;
        }

        if let Some(ci) = self.grid.idx(pos) {
            self.closed[ci] = true;
        }
        self.expanded += 1;
        if self.options.show_visited {
            events.push(StepEvent::Expanded(pos));
        }

        let current_g = self.nodes[current as usize].g;
        for dir in DIRECTIONS {
            let np = pos + dir;
            let Some(ni) = self.grid.idx(np) else {
                continue;
            };
            if self.closed[ni] || self.grid.is_wall(np) {
                continue;
            }
            if dir.is_diagonal()
                && self.grid.is_wall(pos.shift(dir.x, 0))
                && self.grid.is_wall(pos.shift(0, dir.y))
            {
                continue;
            }

            let tentative_g = current_g + step_cost(dir);
            match self.index[ni] {
                NO_NODE => {
                    let h = manhattan(np, self.goal);
                    let id = self.nodes.len() as u32;
                    self.nodes.push(SearchNode {
                        pos: np,
                        g: tentative_g,
                        h,
                        f: tentative_g + h,
                        parent: current,
                    });
                    self.index[ni] = id;
                    self.frontier.push(id, tentative_g + h);
                    if self.options.show_visited && np != self.start && np != self.goal {
                        events.push(StepEvent::Discovered(np));
                    }
                }
                id => {
                    let n = &mut self.nodes[id as usize];
                    if tentative_g < n.g {
                        n.g = tentative_g;
                        n.f = tentative_g + n.h;
                        n.parent = current;
                        self.frontier.push(id, n.f);
                    }
                }
            }
        }
        None
    }

    /// Walk parent links from `idx` back to the root; start → `idx` order.
    fn trace(&self, mut idx: u32) -> Vec<Point> {
        let mut path = Vec::new();
        while idx != NO_PARENT {
            let node = &self.nodes[idx as usize];
            path.push(node.pos);
            idx = node.parent;
        }
        path.reverse();
        path
    }

    /// Drop the node arena and frontier. The search keeps only its phase.
    fn release(&mut self) {
        self.nodes = Vec::new();
        self.index = Vec::new();
        self.closed = Vec::new();
        self.frontier.clear();
    }
}

/// Run a search to completion without reporting events.
pub fn astar_path(grid: &GridModel, start: Point, goal: Point) -> SearchResult {
    let options = SearchOptions {
        show_visited: false,
    };
    Search::new(grid, start, goal, options)
        .run(|| true, |_| {})
        .unwrap_or(SearchResult::NotFound)
}
