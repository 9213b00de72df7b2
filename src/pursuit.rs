//! Frame-by-frame greedy pursuit with local obstacle avoidance.
//!
//! Cheap alternative to a full A* search: each tick the pursuer either heads
//! straight for the target or, when that cast is blocked, takes the clear
//! compass direction that ends closest to the target. Directions already tried
//! while skirting the current obstacle are not tried again, which keeps the
//! pursuer from flipping back and forth at a corner. There is no guarantee of
//! arrival; concave obstacles can stall it.

use crate::compass::Direction;
use crate::occupancy::OccupancyOracle;
use crate::raycast::{is_clear, Probe};
use macroquad::math::Vec2;
use std::collections::HashSet;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct PursuitSettings {
    /// World units per second
    pub speed: f32,
    pub cell_size: f32,
    /// How far ahead the direct cast looks, in cells
    pub lookahead_cells: f32,
    /// Reach of an attack along a cardinal axis, in cells
    pub attack_range_cells: f32,
    /// Clearance a detour direction needs, in cells
    pub detour_lookahead_cells: f32,
    /// Off-axis slack (fraction of a cell) still counted as cardinally aligned
    pub alignment_tolerance: f32,
    pub probe: Probe,
}

impl Default for PursuitSettings {
    fn default() -> Self {
        PursuitSettings {
            speed: 3.0,
            cell_size: 1.0,
            lookahead_cells: 5.0,
            attack_range_cells: 1.0,
            detour_lookahead_cells: 1.0,
            alignment_tolerance: 0.25,
            probe: Probe::for_cell(1.0, 0.5),
        }
    }
}

impl PursuitSettings {
    pub fn lookahead(&self) -> f32 {
        self.lookahead_cells * self.cell_size
    }

    pub fn attack_range(&self) -> f32 {
        self.attack_range_cells * self.cell_size
    }

    pub fn detour_lookahead(&self) -> f32 {
        self.detour_lookahead_cells * self.cell_size
    }

    fn tolerance(&self) -> f32 {
        self.alignment_tolerance * self.cell_size
    }
}

/// Motion command produced for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steering {
    /// In range and aligned; stop and strike
    Attack { direction: Direction },
    /// Heading straight for the target
    Direct { direction: Direction, velocity: Vec2 },
    /// Skirting an obstacle
    Detour { direction: Direction, velocity: Vec2 },
    /// No clear direction; pushing along the blocked heading
    Stalled { direction: Direction, velocity: Vec2 },
    /// Nothing to do
    Hold,
}

impl Steering {
    pub fn velocity(&self) -> Vec2 {
        match self {
            Steering::Direct { velocity, .. }
            | Steering::Detour { velocity, .. }
            | Steering::Stalled { velocity, .. } => *velocity,
            Steering::Attack { .. } | Steering::Hold => Vec2::ZERO,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Steering::Attack { direction }
            | Steering::Direct { direction, .. }
            | Steering::Detour { direction, .. }
            | Steering::Stalled { direction, .. } => *direction,
            Steering::Hold => Direction::Hold,
        }
    }
}

/// Per-agent memory of the current avoidance episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PursuitState {
    last_moving_direction: Direction,
    will_collide: bool,
    alternative_direction: Direction,
    attempted_directions: HashSet<Direction>,
}

impl PursuitState {
    pub fn last_moving_direction(&self) -> Direction {
        self.last_moving_direction
    }

    pub fn will_collide(&self) -> bool {
        self.will_collide
    }

    pub fn alternative_direction(&self) -> Direction {
        self.alternative_direction
    }

    pub fn attempted_directions(&self) -> &HashSet<Direction> {
        &self.attempted_directions
    }

    fn end_episode(&mut self) {
        self.will_collide = false;
        self.alternative_direction = Direction::Hold;
        self.attempted_directions.clear();
    }
}

#[derive(Debug, Clone)]
pub struct PursuitController {
    settings: PursuitSettings,
    state: PursuitState,
}

impl PursuitController {
    pub fn new(settings: PursuitSettings) -> Self {
        PursuitController {
            settings,
            state: PursuitState::default(),
        }
    }

    pub fn settings(&self) -> &PursuitSettings {
        &self.settings
    }

    pub fn state(&self) -> &PursuitState {
        &self.state
    }

    /// Drop the avoidance episode. The last moving direction is kept.
    pub fn reset(&mut self) {
        self.state.end_episode();
    }

    /// Heading toward the target snapped to one of the 9 canonical directions
    pub fn direction_to_target(pursuer: Vec2, target: Vec2) -> Direction {
        Direction::snap(target - pursuer)
    }

    /// Cardinal direction to strike in, if the target is within attack range,
    /// aligned with an axis and not behind an obstacle
    pub fn attack_direction(
        &self,
        oracle: &impl OccupancyOracle,
        pursuer: Vec2,
        target: Vec2,
    ) -> Option<Direction> {
        let delta = target - pursuer;
        let tolerance = self.settings.tolerance();

        if delta.x.abs() <= tolerance && delta.y.abs() <= tolerance {
            return Some(self.facing());
        }

        let (direction, reach) = if delta.y.abs() <= tolerance {
            (Direction::from_offset(delta.x.signum() as i32, 0), delta.x.abs())
        } else if delta.x.abs() <= tolerance {
            (Direction::from_offset(0, delta.y.signum() as i32), delta.y.abs())
        } else {
            return None;
        };

        if reach > self.settings.attack_range() + tolerance {
            return None;
        }

        is_clear(oracle, pursuer, direction, reach, &self.settings.probe).then_some(direction)
    }

    /// True when the cast toward the target is clear up to the lookahead or the target
    pub fn has_direct_path(&self, oracle: &impl OccupancyOracle, pursuer: Vec2, target: Vec2) -> bool {
        let direction = Self::direction_to_target(pursuer, target);
        let distance = self.settings.lookahead().min(pursuer.distance(target));
        is_clear(oracle, pursuer, direction, distance, &self.settings.probe)
    }

    /// Head straight for the target and close any avoidance episode
    pub fn move_direct(&mut self, pursuer: Vec2, target: Vec2) -> Steering {
        self.state.end_episode();

        let direction = Self::direction_to_target(pursuer, target);
        if direction == Direction::Hold {
            return Steering::Hold;
        }

        self.state.last_moving_direction = direction;
        Steering::Direct {
            direction,
            velocity: direction.vector() * self.settings.speed,
        }
    }

    /// Pick the untried clear direction that ends closest to the target.
    ///
    /// Falls back to the blocked heading, with the episode cleared, when no
    /// direction is clear.
    pub fn detour(&mut self, oracle: &impl OccupancyOracle, pursuer: Vec2, target: Vec2) -> Steering {
        let blocked = Self::direction_to_target(pursuer, target);

        let mut candidates: Vec<(Direction, f32)> = Direction::ALL
            .iter()
            .copied()
            .filter(|d| *d != blocked && !self.state.attempted_directions.contains(d))
            .map(|d| {
                let landing = pursuer + d.offset_vector() * self.settings.cell_size;
                (d, landing.distance(target))
            })
            .collect();
        // Stable sort keeps compass order between equally good candidates
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        let reach = self.settings.detour_lookahead();
        for (direction, distance) in candidates {
            let clear = is_clear(oracle, pursuer, direction, reach, &self.settings.probe);
            trace!(?direction, distance, clear, "detour candidate");
            if !clear {
                continue;
            }

            self.state.attempted_directions.insert(direction);
            self.state.will_collide = true;
            self.state.alternative_direction = direction;
            self.state.last_moving_direction = direction;
            debug!(?blocked, ?direction, "detouring around obstacle");
            return Steering::Detour {
                direction,
                velocity: direction.vector() * self.settings.speed,
            };
        }

        debug!(?blocked, "no clear detour, pursuit stalled");
        self.state.end_episode();
        if blocked != Direction::Hold {
            self.state.last_moving_direction = blocked;
        }
        Steering::Stalled {
            direction: blocked,
            velocity: blocked.vector() * self.settings.speed,
        }
    }

    /// Keep skirting along the stored alternative while it stays clear,
    /// otherwise choose a fresh detour
    pub fn continue_detour(
        &mut self,
        oracle: &impl OccupancyOracle,
        pursuer: Vec2,
        target: Vec2,
    ) -> Steering {
        match self.keep_detour(oracle, pursuer, target) {
            Some(steering) => steering,
            None => self.detour(oracle, pursuer, target),
        }
    }

    /// Full per-tick policy: attack, keep skirting, go direct, or pick a detour
    pub fn tick(&mut self, oracle: &impl OccupancyOracle, pursuer: Vec2, target: Vec2) -> Steering {
        if let Some(direction) = self.attack_direction(oracle, pursuer, target) {
            self.state.last_moving_direction = direction;
            return Steering::Attack { direction };
        }

        if let Some(steering) = self.keep_detour(oracle, pursuer, target) {
            return steering;
        }

        if self.has_direct_path(oracle, pursuer, target) {
            return self.move_direct(pursuer, target);
        }
        self.detour(oracle, pursuer, target)
    }

    fn keep_detour(
        &mut self,
        oracle: &impl OccupancyOracle,
        pursuer: Vec2,
        target: Vec2,
    ) -> Option<Steering> {
        if !self.state.will_collide {
            return None;
        }

        let alternative = self.state.alternative_direction;
        let reach = self.settings.detour_lookahead();
        if !is_clear(oracle, pursuer, alternative, reach, &self.settings.probe) {
            return None;
        }

        if self.has_direct_path(oracle, pursuer, target) {
            // Finish this step of the detour; direct pursuit resumes next tick
            self.state.end_episode();
        }
        self.state.last_moving_direction = alternative;
        Some(Steering::Detour {
            direction: alternative,
            velocity: alternative.vector() * self.settings.speed,
        })
    }

    /// Last cardinal heading, used when standing on the target
    fn facing(&self) -> Direction {
        let (dx, dy) = self.state.last_moving_direction.offset();
        match (dx, dy) {
            (0, 0) => Direction::South,
            (0, dy) => Direction::from_offset(0, dy),
            (dx, _) => Direction::from_offset(dx, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TileMap;
    use macroquad::math::vec2;

    fn controller() -> PursuitController {
        PursuitController::new(PursuitSettings {
            speed: 2.0,
            ..PursuitSettings::default()
        })
    }

    fn center(x: i32, y: i32) -> Vec2 {
        vec2(x as f32 + 0.5, y as f32 + 0.5)
    }

    #[test]
    fn test_direct_path_on_open_map() {
        let map = TileMap::new(10, 10, 1.0, Vec2::ZERO);
        let mut pursuit = controller();

        let steering = pursuit.tick(&map, center(0, 0), center(5, 0));
        assert_eq!(
            steering,
            Steering::Direct { direction: Direction::East, velocity: vec2(2.0, 0.0) }
        );
        assert!(!pursuit.state().will_collide());
        assert!(pursuit.state().attempted_directions().is_empty());
    }

    #[test]
    fn test_detour_around_single_block() {
        let map = TileMap::with_blocked(10, 10, 1.0, Vec2::ZERO, &[(1, 0)]);
        let mut pursuit = controller();

        let steering = pursuit.tick(&map, center(0, 0), center(5, 0));
        let Steering::Detour { direction, .. } = steering else {
            panic!("expected a detour, got {:?}", steering);
        };
        assert_ne!(direction, Direction::East);
        assert!(pursuit.state().attempted_directions().contains(&direction));
        assert!(pursuit.state().will_collide());
        assert_eq!(pursuit.state().alternative_direction(), direction);
        assert!(is_clear(&map, center(0, 0), direction, 1.0, &pursuit.settings().probe));
        // South leaves the map and the diagonals clip the block, so north it is
        assert_eq!(direction, Direction::North);
    }

    #[test]
    fn test_detour_keeps_heading_while_blocked() {
        let map = TileMap::with_blocked(10, 10, 1.0, Vec2::ZERO, &[(1, 0), (1, 1)]);
        let mut pursuit = controller();

        let first = pursuit.tick(&map, center(0, 0), center(5, 0));
        assert_eq!(first.direction(), Direction::North);

        // Still blocked toward the target from one tile up; keep going north
        let second = pursuit.tick(&map, center(0, 1), center(5, 0));
        assert_eq!(second.direction(), Direction::North);
        assert!(pursuit.state().will_collide());
    }

    #[test]
    fn test_revalidation_ends_episode_when_clear() {
        let map = TileMap::with_blocked(10, 10, 1.0, Vec2::ZERO, &[(1, 0)]);
        let mut pursuit = controller();
        pursuit.tick(&map, center(0, 0), center(5, 0));
        assert!(pursuit.state().will_collide());

        // From (0,2) the snapped heading is east and clear
        let steering = pursuit.tick(&map, center(0, 2), center(5, 2));
        assert_eq!(steering.direction(), Direction::North);
        assert!(!pursuit.state().will_collide());
        assert!(pursuit.state().attempted_directions().is_empty());

        let steering = pursuit.tick(&map, center(0, 2), center(5, 2));
        assert_eq!(steering.direction(), Direction::East);
    }

    #[test]
    fn test_boxed_in_pursuer_stalls() {
        let layout = "\
.#.
##.
...
";
        let parsed = TileMap::parse(layout, 1.0, Vec2::ZERO).unwrap();
        let mut pursuit = controller();

        let steering = pursuit.tick(&parsed.map, center(0, 0), center(2, 2));
        assert_eq!(
            steering,
            Steering::Stalled {
                direction: Direction::NorthEast,
                velocity: Direction::NorthEast.vector() * 2.0,
            }
        );
        assert!(pursuit.state().attempted_directions().is_empty());
        assert!(!pursuit.state().will_collide());
    }

    #[test]
    fn test_attack_gate_requires_cardinal_adjacency() {
        let map = TileMap::new(10, 10, 1.0, Vec2::ZERO);
        let pursuit = controller();

        assert_eq!(
            pursuit.attack_direction(&map, center(3, 3), center(4, 3)),
            Some(Direction::East)
        );
        assert_eq!(
            pursuit.attack_direction(&map, center(3, 3), center(3, 2)),
            Some(Direction::South)
        );
        assert_eq!(pursuit.attack_direction(&map, center(3, 3), center(4, 4)), None);
        assert_eq!(pursuit.attack_direction(&map, center(3, 3), center(5, 3)), None);
    }

    #[test]
    fn test_attack_suppresses_movement() {
        let map = TileMap::new(10, 10, 1.0, Vec2::ZERO);
        let mut pursuit = controller();

        let steering = pursuit.tick(&map, center(3, 3), center(3, 4));
        assert_eq!(steering, Steering::Attack { direction: Direction::North });
        assert_eq!(steering.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_wall_behind_target_does_not_block() {
        let map = TileMap::with_blocked(10, 10, 1.0, Vec2::ZERO, &[(4, 0)]);
        let pursuit = controller();
        assert!(pursuit.has_direct_path(&map, center(0, 0), center(2, 0)));
        assert!(!pursuit.has_direct_path(&map, center(0, 0), center(6, 0)));
    }
}
