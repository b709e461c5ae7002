use pathgrid_core::Point;

/// Cost of an axis-aligned step.
pub const STRAIGHT_COST: i32 = 10;
/// Cost of a diagonal step (√2 scaled by 10, rounded down).
pub const DIAGONAL_COST: i32 = 14;

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Cost of moving by the unit offset `dir`.
#[inline]
pub fn step_cost(dir: Point) -> i32 {
    if dir.is_diagonal() {
        DIAGONAL_COST
    } else {
        STRAIGHT_COST
    }
}

/// Total cost of walking `path` one step at a time.
pub fn path_cost(path: &[Point]) -> i32 {
    path.windows(2).map(|w| step_cost(w[1] - w[0])).sum()
}
