use crate::cell::GridCell;
use crate::compass::{Direction, DIAGONAL_COST, STRAIGHT_COST};
use crate::queue::{Keyed, PriorityQueue};
use crate::Grid;
use macroquad::math::Vec2;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// A position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Octile distance in fixed-point units (straight 10, diagonal 14).
    /// Admissible and consistent for 8-directional movement with those weights.
    pub fn octile_distance(&self, other: &Position) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let diagonal = dx.min(dy);
        let straight = dx.max(dy) - diagonal;
        DIAGONAL_COST * diagonal + STRAIGHT_COST * straight
    }

    /// Neighbouring position one step in `direction`
    pub fn step(&self, direction: Direction) -> Position {
        let (dx, dy) = direction.offset();
        Position::new(self.x + dx, self.y + dy)
    }
}

/// A route through the grid, start and goal included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub cells: Vec<Position>,
    /// Octile cost in fixed-point units
    pub cost: i32,
}

impl Path {
    /// World-space centres of every cell on the path
    pub fn to_world(&self, grid: &Grid) -> Vec<Vec2> {
        self.cells
            .iter()
            .map(|p| grid.grid_to_world(p.x, p.y))
            .collect()
    }
}

/// How a bounded search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Found(Path),
    /// The open set emptied without reaching the goal
    NoPath,
    /// The expansion budget ran out first
    Aborted { expansions: usize },
}

impl PathOutcome {
    /// Path cells, empty unless a path was found
    pub fn into_cells(self) -> Vec<Position> {
        match self {
            PathOutcome::Found(path) => path.cells,
            _ => Vec::new(),
        }
    }
}

/// Open-set entry. Ordered by f, then h, then arena index for determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    evaluation: i32,
    heuristic: i32,
    index: usize,
}

impl OpenNode {
    fn of(cell: &GridCell, index: usize) -> Self {
        OpenNode {
            evaluation: cell.evaluation,
            heuristic: cell.heuristic,
            index,
        }
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.evaluation
            .cmp(&other.evaluation)
            .then_with(|| self.heuristic.cmp(&other.heuristic))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Keyed for OpenNode {
    type Key = usize;

    fn key(&self) -> usize {
        self.index
    }
}

/// Find a shortest 8-directional path from `start` to `goal`.
///
/// Returns the cells from start to goal inclusive, or an empty vector when the
/// goal is unreachable or either end lies outside the grid.
pub fn find_path(grid: &Grid, start: Position, goal: Position) -> Vec<Position> {
    let budget = (grid.width() * grid.height()) as usize;
    search(grid, start, goal, budget).into_cells()
}

/// A* over the grid's walkability snapshot with at most `max_expansions` node expansions.
///
/// The grid is only read; every search works on its own copy of the cells.
pub fn search(grid: &Grid, start: Position, goal: Position, max_expansions: usize) -> PathOutcome {
    let (Some(start_index), Some(goal_index)) =
        (grid.index_of(start.x, start.y), grid.index_of(goal.x, goal.y))
    else {
        debug!(?start, ?goal, "path endpoint outside grid");
        return PathOutcome::NoPath;
    };

    if start_index == goal_index {
        return PathOutcome::Found(Path {
            cells: vec![start],
            cost: 0,
        });
    }

    let mut nodes: Vec<GridCell> = grid.cells().to_vec();
    nodes.iter_mut().for_each(GridCell::reset_search);
    let mut closed = vec![false; nodes.len()];
    let mut open: PriorityQueue<OpenNode> = PriorityQueue::new();

    nodes[start_index].set_costs(0, start.octile_distance(&goal));
    open.insert(OpenNode::of(&nodes[start_index], start_index));

    let mut expansions = 0;
    while let Ok(current) = open.extract_min() {
        let index = current.index;
        if closed[index] {
            continue;
        }

        if index == goal_index {
            let path = reconstruct(grid, &nodes, goal_index);
            debug!(
                ?start,
                ?goal,
                cost = path.cost,
                steps = path.cells.len(),
                expansions,
                "path found"
            );
            return PathOutcome::Found(path);
        }

        if expansions >= max_expansions {
            debug!(?start, ?goal, expansions, "search budget exhausted");
            return PathOutcome::Aborted { expansions };
        }
        expansions += 1;
        closed[index] = true;

        let here = {
            let (x, y) = grid.coords_of(index);
            Position::new(x, y)
        };
        let here_cost = nodes[index].cost;
        trace!(x = here.x, y = here.y, g = here_cost, f = nodes[index].evaluation, "expand");

        for direction in Direction::ALL {
            let next = here.step(direction);
            let Some(next_index) = grid.index_of(next.x, next.y) else {
                continue;
            };
            if closed[next_index] || !nodes[next_index].walkable {
                continue;
            }

            let tentative = here_cost + direction.step_cost();
            if tentative < nodes[next_index].cost {
                let node = &mut nodes[next_index];
                node.parent = Some(index);
                node.set_costs(tentative, next.octile_distance(&goal));
                // Decrease-key: the queue drops any older entry for this cell
                open.insert(OpenNode::of(node, next_index));
            }
        }
    }

    debug!(?start, ?goal, expansions, "no path exists");
    PathOutcome::NoPath
}

fn reconstruct(grid: &Grid, nodes: &[GridCell], goal_index: usize) -> Path {
    let mut cells = Vec::new();
    let mut cursor = Some(goal_index);
    while let Some(index) = cursor {
        let (x, y) = grid.coords_of(index);
        cells.push(Position::new(x, y));
        cursor = nodes[index].parent;
    }
    cells.reverse();

    Path {
        cost: nodes[goal_index].cost,
        cells,
    }
}

/// Sum of step costs along consecutive cells
pub fn path_cost(cells: &[Position]) -> i32 {
    cells
        .windows(2)
        .map(|pair| {
            Direction::from_offset(pair[1].x - pair[0].x, pair[1].y - pair[0].y).step_cost()
        })
        .sum()
}

/// Format path for display
pub fn format_path(path: &[Position]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|pos| format!("({},{})", pos.x, pos.y))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(size: i32) -> Grid {
        Grid::from_walkable(size, size, 1.0, Vec2::ZERO, |_, _| true).unwrap()
    }

    #[test]
    fn test_octile_distance() {
        let a = Position::new(0, 0);
        assert_eq!(a.octile_distance(&Position::new(3, 0)), 30);
        assert_eq!(a.octile_distance(&Position::new(3, 3)), 42);
        assert_eq!(a.octile_distance(&Position::new(5, 2)), 58);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = open_grid(5);
        let path = find_path(&grid, Position::new(2, 2), Position::new(2, 2));
        assert_eq!(path, vec![Position::new(2, 2)]);
    }

    #[test]
    fn test_endpoint_outside_grid() {
        let grid = open_grid(5);
        assert!(find_path(&grid, Position::new(0, 0), Position::new(5, 0)).is_empty());
        assert!(find_path(&grid, Position::new(-1, 0), Position::new(3, 0)).is_empty());
    }

    #[test]
    fn test_budget_aborts_search() {
        let grid = open_grid(20);
        let outcome = search(&grid, Position::new(0, 0), Position::new(19, 19), 3);
        assert_eq!(outcome, PathOutcome::Aborted { expansions: 3 });
    }

    #[test]
    fn test_path_cost_and_format() {
        let cells = vec![Position::new(0, 0), Position::new(1, 1), Position::new(2, 1)];
        assert_eq!(path_cost(&cells), 24);
        assert_eq!(format_path(&cells), "(0,0) -> (1,1) -> (2,1)");
        assert_eq!(format_path(&[]), "No path");
    }
}
