use crate::compass::Direction;
use crate::occupancy::OccupancyOracle;
use macroquad::math::Vec2;

/// Shape of the box swept along a cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    /// Full side length of the swept box
    pub extent: f32,
    /// Distance between consecutive samples
    pub step: f32,
}

impl Probe {
    /// Probe sized relative to a cell: box of `extent_ratio` cells, samples every quarter cell
    pub fn for_cell(cell_size: f32, extent_ratio: f32) -> Self {
        Probe {
            extent: cell_size * extent_ratio,
            step: cell_size / 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastHit {
    Clear,
    Blocked { at: Vec2, distance: f32 },
}

impl CastHit {
    pub fn is_clear(&self) -> bool {
        matches!(self, CastHit::Clear)
    }
}

/// Sweep `probe` from `origin` along `direction` for `distance` world units.
///
/// Sampling starts one step away from the origin, so an agent never blocks its
/// own cast, and the exact end point is always sampled.
pub fn cast(
    oracle: &impl OccupancyOracle,
    origin: Vec2,
    direction: Direction,
    distance: f32,
    probe: &Probe,
) -> CastHit {
    let heading = direction.vector();
    if heading == Vec2::ZERO || distance <= 0.0 || !distance.is_finite() {
        return CastHit::Clear;
    }

    let step = if probe.step > 0.0 { probe.step } else { distance };
    let mut travelled = step.min(distance);
    loop {
        let at = origin + heading * travelled;
        if oracle.is_occupied(at, probe.extent) {
            return CastHit::Blocked {
                at,
                distance: travelled,
            };
        }
        if travelled >= distance {
            return CastHit::Clear;
        }
        travelled = (travelled + step).min(distance);
    }
}

pub fn is_clear(
    oracle: &impl OccupancyOracle,
    origin: Vec2,
    direction: Direction,
    distance: f32,
    probe: &Probe,
) -> bool {
    cast(oracle, origin, direction, distance, probe).is_clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TileMap;
    use macroquad::math::vec2;

    fn probe() -> Probe {
        Probe::for_cell(1.0, 0.5)
    }

    #[test]
    fn test_empty_map_is_clear() {
        let map = TileMap::new(10, 10, 1.0, Vec2::ZERO);
        assert!(is_clear(&map, vec2(0.5, 0.5), Direction::East, 5.0, &probe()));
        assert!(is_clear(&map, vec2(0.5, 0.5), Direction::NorthEast, 5.0, &probe()));
    }

    #[test]
    fn test_blocked_reports_first_hit() {
        let map = TileMap::with_blocked(10, 10, 1.0, Vec2::ZERO, &[(3, 0)]);
        match cast(&map, vec2(0.5, 0.5), Direction::East, 5.0, &probe()) {
            CastHit::Blocked { distance, .. } => assert!(distance > 2.0 && distance <= 2.5),
            CastHit::Clear => panic!("cast through a wall"),
        }
    }

    #[test]
    fn test_cast_stops_at_distance() {
        let map = TileMap::with_blocked(10, 10, 1.0, Vec2::ZERO, &[(4, 0)]);
        assert!(is_clear(&map, vec2(0.5, 0.5), Direction::East, 2.0, &probe()));
        assert!(!is_clear(&map, vec2(0.5, 0.5), Direction::East, 4.0, &probe()));
    }

    #[test]
    fn test_hold_and_zero_distance_are_clear() {
        let map = TileMap::with_blocked(3, 3, 1.0, Vec2::ZERO, &[(1, 1)]);
        assert!(is_clear(&map, vec2(0.5, 1.5), Direction::Hold, 3.0, &probe()));
        assert!(is_clear(&map, vec2(0.5, 1.5), Direction::East, 0.0, &probe()));
    }
}
