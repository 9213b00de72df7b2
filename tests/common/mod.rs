#![allow(dead_code)]

use pursuit::{Grid, Position, TileMap};
use macroquad::math::{vec2, Vec2};

/// Parse a layout (row i is y = i) and snapshot it into a grid with 1-unit cells
pub fn grid_from_rows(rows: &[&str]) -> (Grid, TileMap, Option<Position>, Option<Position>) {
    let parsed = TileMap::parse_rows(rows, 1.0, Vec2::ZERO).expect("valid layout");
    let map = parsed.map;
    let grid = Grid::new(map.width(), map.height(), map.cell_size(), map.origin(), &map)
        .expect("valid grid");
    (grid, map, parsed.start, parsed.goal)
}

/// Grid with no obstacles
pub fn open_grid(width: i32, height: i32) -> Grid {
    Grid::from_walkable(width, height, 1.0, Vec2::ZERO, |_, _| true).expect("valid grid")
}

/// Grid where `blocked` cells are not walkable
pub fn grid_with_blocked(width: i32, height: i32, blocked: &[(i32, i32)]) -> Grid {
    Grid::from_walkable(width, height, 1.0, Vec2::ZERO, |x, y| !blocked.contains(&(x, y)))
        .expect("valid grid")
}

/// World-space centre of a 1-unit cell
pub fn center(x: i32, y: i32) -> Vec2 {
    vec2(x as f32 + 0.5, y as f32 + 0.5)
}

/// Every step between consecutive cells is one of the 8 neighbour offsets
pub fn is_connected(path: &[Position]) -> bool {
    path.windows(2).all(|pair| {
        let dx = (pair[1].x - pair[0].x).abs();
        let dy = (pair[1].y - pair[0].y).abs();
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    })
}
