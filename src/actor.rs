use crate::occupancy::OccupancyOracle;
use crate::pathfinding::Position;
use crate::Grid;
use macroquad::math::{vec2, Vec2};

/// A body in world space that applies velocity commands each frame
#[derive(Clone, Debug)]
pub struct Actor {
    /// Side length of the actor's square
    pub size: f32,

    /// Centre of the actor's square
    pub position: Vec2,

    /// Last velocity command, world units per second
    pub velocity: Vec2,
}

impl Actor {
    /// Create a resting actor at `position`
    pub fn new(position: Vec2, size: f32) -> Self {
        Actor {
            size,
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// Move by `velocity * dt` (call once per frame)
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Move by `velocity * dt`, sliding along whichever axis stays clear of obstacles.
    ///
    /// Returns false when neither axis could move.
    pub fn integrate_blocked(&mut self, dt: f32, oracle: &impl OccupancyOracle) -> bool {
        let step = self.velocity * dt;
        if step == Vec2::ZERO {
            return true;
        }

        let full = self.position + step;
        if !oracle.is_occupied(full, self.size) {
            self.position = full;
            return true;
        }

        let along_x = self.position + vec2(step.x, 0.0);
        if step.x != 0.0 && !oracle.is_occupied(along_x, self.size) {
            self.position = along_x;
            return true;
        }

        let along_y = self.position + vec2(0.0, step.y);
        if step.y != 0.0 && !oracle.is_occupied(along_y, self.size) {
            self.position = along_y;
            return true;
        }

        false
    }

    /// Grid cell under the actor's centre, if inside the grid
    pub fn cell(&self, grid: &Grid) -> Option<Position> {
        let (x, y) = grid.world_to_grid(self.position);
        grid.is_within_bounds(x, y).then(|| Position::new(x, y))
    }

    /// Get the corners of the actor's square as (left, bottom, right, top)
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let half_size = self.size / 2.0;
        let left = self.position.x - half_size;
        let bottom = self.position.y - half_size;
        let right = self.position.x + half_size;
        let top = self.position.y + half_size;

        (left, bottom, right, top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TileMap;

    #[test]
    fn test_actor_cell() {
        let grid = Grid::from_walkable(10, 10, 20.0, Vec2::ZERO, |_, _| true).unwrap();

        // Actor centred in cell (5, 5)
        let actor = Actor::new(vec2(5.0 * 20.0 + 10.0, 5.0 * 20.0 + 10.0), 10.0);
        assert_eq!(actor.cell(&grid), Some(Position::new(5, 5)));

        let outside = Actor::new(vec2(-1.0, 5.0), 10.0);
        assert_eq!(outside.cell(&grid), None);
    }

    #[test]
    fn test_actor_integrate() {
        let mut actor = Actor::new(Vec2::ZERO, 10.0);
        actor.velocity = vec2(100.0, 0.0);

        // 100 units per second for one second
        actor.integrate(1.0);

        assert_eq!(actor.position, vec2(100.0, 0.0));
    }

    #[test]
    fn test_actor_slides_along_wall() {
        let map = TileMap::with_blocked(5, 5, 1.0, Vec2::ZERO, &[(2, 1)]);
        let mut actor = Actor::new(vec2(1.5, 1.5), 0.5);
        actor.velocity = vec2(1.0, 1.0);

        // Diagonal step would clip the wall to the east; the north component survives
        assert!(actor.integrate_blocked(0.5, &map));
        assert_eq!(actor.position, vec2(1.5, 2.0));
    }

    #[test]
    fn test_actor_bounds() {
        let actor = Actor::new(vec2(10.0, 20.0), 4.0);
        assert_eq!(actor.bounds(), (8.0, 18.0, 12.0, 22.0));
    }
}
