use macroquad::math::{vec2, Vec2};

/// Straight step cost in fixed-point units (1.0 == 10)
pub const STRAIGHT_COST: i32 = 10;
/// Diagonal step cost in fixed-point units (sqrt(2) ~= 1.4)
pub const DIAGONAL_COST: i32 = 14;

/// One of the 8 compass directions, or `Hold` for "no movement".
///
/// Grid `y` grows northward, so `North` is `(0, 1)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Hold,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    /// The 8 moving directions. Rankings that tie fall back to this order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Integer grid offset, each axis in {-1, 0, 1}
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Hold => (0, 0),
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
        }
    }

    /// Build a direction from an integer offset. Components are clamped to {-1, 0, 1}.
    pub fn from_offset(dx: i32, dy: i32) -> Direction {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Direction::North,
            (1, 1) => Direction::NorthEast,
            (1, 0) => Direction::East,
            (1, -1) => Direction::SouthEast,
            (0, -1) => Direction::South,
            (-1, -1) => Direction::SouthWest,
            (-1, 0) => Direction::West,
            (-1, 1) => Direction::NorthWest,
            _ => Direction::Hold,
        }
    }

    /// Unit-length world vector (diagonals are normalized, `Hold` is zero)
    pub fn vector(self) -> Vec2 {
        let (dx, dy) = self.offset();
        vec2(dx as f32, dy as f32).normalize_or_zero()
    }

    /// Raw offset as a float vector, diagonals have length sqrt(2)
    pub fn offset_vector(self) -> Vec2 {
        let (dx, dy) = self.offset();
        vec2(dx as f32, dy as f32)
    }

    /// Snap an arbitrary vector to the nearest of the 9 canonical directions.
    ///
    /// The vector is normalized first and each axis is rounded to the nearest of
    /// {-1, 0, 1}, so headings within 30 degrees of an axis snap to that axis.
    pub fn snap(v: Vec2) -> Direction {
        let n = v.normalize_or_zero();
        if n == Vec2::ZERO {
            return Direction::Hold;
        }
        Direction::from_offset(n.x.round() as i32, n.y.round() as i32)
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::South | Direction::West
        )
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::SouthEast | Direction::SouthWest | Direction::NorthWest
        )
    }

    pub fn opposite(self) -> Direction {
        let (dx, dy) = self.offset();
        Direction::from_offset(-dx, -dy)
    }

    /// Movement cost of a single step in this direction
    pub fn step_cost(self) -> i32 {
        if self.is_diagonal() {
            DIAGONAL_COST
        } else if self.is_cardinal() {
            STRAIGHT_COST
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_axes_and_diagonals() {
        assert_eq!(Direction::snap(vec2(5.0, 0.0)), Direction::East);
        assert_eq!(Direction::snap(vec2(5.0, 1.0)), Direction::East);
        assert_eq!(Direction::snap(vec2(-3.0, -3.0)), Direction::SouthWest);
        assert_eq!(Direction::snap(vec2(0.0, 2.0)), Direction::North);
        assert_eq!(Direction::snap(Vec2::ZERO), Direction::Hold);
    }

    #[test]
    fn test_offsets_round_trip() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            assert_eq!(Direction::from_offset(dx, dy), dir);
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn test_step_costs() {
        assert_eq!(Direction::East.step_cost(), 10);
        assert_eq!(Direction::NorthWest.step_cost(), 14);
        assert_eq!(Direction::Hold.step_cost(), 0);
        assert!((Direction::NorthEast.vector().length() - 1.0).abs() < 1e-6);
    }
}
