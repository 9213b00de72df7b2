use crate::cell::GridCell;
use crate::error::GridError;
use crate::occupancy::{covered_cells, OccupancyOracle};
use macroquad::math::{vec2, Vec2};
use tracing::debug;

/// Fixed-size walkability snapshot of the world.
///
/// Walkability is sampled once per cell at construction; later changes to the
/// world are not observed. Rebuild the grid to pick them up.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cell_size: f32,
    origin: Vec2,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Sample `oracle` at every cell centre with a cell-sized box
    pub fn new(
        width: i32,
        height: i32,
        cell_size: f32,
        origin: Vec2,
        oracle: &impl OccupancyOracle,
    ) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }

        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let center = origin + vec2(x as f32, y as f32) * cell_size + Vec2::splat(cell_size / 2.0);
                let walkable = !oracle.is_occupied(center, cell_size);
                cells.push(GridCell::new(x, y, walkable));
            }
        }

        let grid = Grid {
            width,
            height,
            cell_size,
            origin,
            cells,
        };
        debug!(
            width,
            height,
            blocked = grid.cells.iter().filter(|c| !c.walkable).count(),
            "grid snapshot built"
        );
        Ok(grid)
    }

    /// Build a grid from a walkability predicate over cell coordinates
    pub fn from_walkable(
        width: i32,
        height: i32,
        cell_size: f32,
        origin: Vec2,
        walkable: impl Fn(i32, i32) -> bool,
    ) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }

        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| GridCell::new(x, y, walkable(x, y)))
            .collect();

        Ok(Grid {
            width,
            height,
            cell_size,
            origin,
            cells,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// All cells in row-major order (index = x + y * width)
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn is_within_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Flat arena index of `(x, y)`, or `None` when out of bounds
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        self.is_within_bounds(x, y)
            .then(|| (x + y * self.width) as usize)
    }

    /// Convert a flat arena index back to `(x, y)`
    pub fn coords_of(&self, index: usize) -> (i32, i32) {
        let index = index as i32;
        (index % self.width, index / self.width)
    }

    pub fn cell_at(&self, x: i32, y: i32) -> Result<&GridCell, GridError> {
        self.index_of(x, y)
            .map(|i| &self.cells[i])
            .ok_or(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
    }

    /// Cell containing a world position
    pub fn cell_at_world(&self, world: Vec2) -> Result<&GridCell, GridError> {
        let (x, y) = self.world_to_grid(world);
        self.cell_at(x, y)
    }

    /// World position to cell coordinates. The result may lie outside the grid.
    pub fn world_to_grid(&self, world: Vec2) -> (i32, i32) {
        let local = (world - self.origin) / self.cell_size;
        (local.x.floor() as i32, local.y.floor() as i32)
    }

    /// Cell coordinates to the world position of the cell centre
    pub fn grid_to_world(&self, x: i32, y: i32) -> Vec2 {
        self.origin + vec2(x as f32, y as f32) * self.cell_size + Vec2::splat(self.cell_size / 2.0)
    }

    /// Cached walkability of the cell at `(x, y)`; out of bounds is not walkable
    pub fn is_walkable_cell(&self, x: i32, y: i32) -> bool {
        self.index_of(x, y)
            .map(|i| self.cells[i].walkable)
            .unwrap_or(false)
    }

    /// Cached walkability of the cell containing `world`; out of bounds is not walkable
    pub fn is_walkable(&self, world: Vec2) -> bool {
        let (x, y) = self.world_to_grid(world);
        self.is_walkable_cell(x, y)
    }
}

impl OccupancyOracle for Grid {
    fn is_occupied(&self, center: Vec2, extent: f32) -> bool {
        let ((min_x, min_y), (max_x, max_y)) =
            covered_cells(center, extent, self.cell_size, self.origin);
        (min_y..=max_y).any(|y| (min_x..=max_x).any(|x| !self.is_walkable_cell(x, y)))
    }
}
