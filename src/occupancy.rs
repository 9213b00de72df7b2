use macroquad::math::Vec2;

/// Fraction of a cell shaved off each side of a query box so that tiles which
/// merely touch the box edge are not reported as overlapping.
const EDGE_EPSILON: f32 = 1e-4;

/// Answers whether an axis-aligned box in world space overlaps static obstacles.
///
/// `extent` is the full side length of the box centred on `center`.
pub trait OccupancyOracle {
    fn is_occupied(&self, center: Vec2, extent: f32) -> bool;
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for &T {
    fn is_occupied(&self, center: Vec2, extent: f32) -> bool {
        (**self).is_occupied(center, extent)
    }
}

/// Inclusive range of tile coordinates a box overlaps, as `((min_x, min_y), (max_x, max_y))`.
pub(crate) fn covered_cells(
    center: Vec2,
    extent: f32,
    cell_size: f32,
    origin: Vec2,
) -> ((i32, i32), (i32, i32)) {
    let half = extent.max(0.0) / 2.0;
    let shave = EDGE_EPSILON * cell_size;
    let local = center - origin;

    let min_x = ((local.x - half + shave) / cell_size).floor() as i32;
    let min_y = ((local.y - half + shave) / cell_size).floor() as i32;
    let max_x = ((local.x + half - shave) / cell_size).floor() as i32;
    let max_y = ((local.y + half - shave) / cell_size).floor() as i32;

    // A zero-sized box still covers the tile it sits in
    ((min_x.min(max_x), min_y.min(max_y)), (max_x.max(min_x), max_y.max(min_y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::math::vec2;

    #[test]
    fn test_cell_sized_box_covers_one_tile() {
        let (min, max) = covered_cells(vec2(1.5, 0.5), 1.0, 1.0, Vec2::ZERO);
        assert_eq!(min, (1, 0));
        assert_eq!(max, (1, 0));
    }

    #[test]
    fn test_box_straddling_seam() {
        let (min, max) = covered_cells(vec2(1.0, 0.5), 0.5, 1.0, Vec2::ZERO);
        assert_eq!(min, (0, 0));
        assert_eq!(max, (1, 0));
    }

    #[test]
    fn test_origin_offset() {
        let (min, max) = covered_cells(vec2(-9.5, 0.5), 1.0, 1.0, vec2(-10.0, 0.0));
        assert_eq!(min, (0, 0));
        assert_eq!(max, (0, 0));
    }
}
