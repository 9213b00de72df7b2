use std::cmp::Ordering;

/// Path cost of a cell the search has not reached yet
pub const UNREACHED: i32 = i32::MAX;

/// A search node on the grid.
///
/// Identity is the `(x, y)` pair. The cost fields belong to whichever search
/// owns the copy of the cell; `parent` is an index into that search's flat
/// cell arena, never a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub walkable: bool,
    /// g: accumulated cost from the search start
    pub cost: i32,
    /// h: estimated remaining cost to the goal
    pub heuristic: i32,
    /// f = g + h
    pub evaluation: i32,
    pub parent: Option<usize>,
}

impl GridCell {
    pub fn new(x: i32, y: i32, walkable: bool) -> Self {
        GridCell {
            x,
            y,
            walkable,
            cost: UNREACHED,
            heuristic: 0,
            evaluation: UNREACHED,
            parent: None,
        }
    }

    /// Two cells are the same node iff their coordinates match
    pub fn same_cell(&self, other: &GridCell) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// Update g and h, keeping f in sync
    pub fn set_costs(&mut self, cost: i32, heuristic: i32) {
        self.cost = cost;
        self.heuristic = heuristic;
        self.evaluation = cost.saturating_add(heuristic);
    }

    /// Forget everything a previous search wrote into this cell
    pub fn reset_search(&mut self) {
        self.cost = UNREACHED;
        self.heuristic = 0;
        self.evaluation = UNREACHED;
        self.parent = None;
    }

    /// Open-set ordering: lowest f first, ties go to the lower h (closer to the goal)
    pub fn priority_cmp(&self, other: &GridCell) -> Ordering {
        self.evaluation
            .cmp(&other.evaluation)
            .then_with(|| self.heuristic.cmp(&other.heuristic))
    }
}
