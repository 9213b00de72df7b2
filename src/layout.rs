//! Mutable tile maps and the plain-text layout format.
//!
//! One line per row, row `i` is `y = i`:
//! - `#` or `■`: blocked tile
//! - `.` or `□`: free tile
//! - `S`, `G`, `T`: start, goal and target markers (free tiles)

use crate::occupancy::{covered_cells, OccupancyOracle};
use crate::pathfinding::Position;
use macroquad::math::{vec2, Vec2};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {row} is {found} tiles wide, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("unknown tile '{tile}' at row {row}, column {column}")]
    UnknownTile { row: usize, column: usize, tile: char },

    #[error("marker '{marker}' appears more than once")]
    DuplicateMarker { marker: char },
}

/// Live world of blocked tiles. Anything outside the mapped area counts as occupied.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    width: i32,
    height: i32,
    cell_size: f32,
    origin: Vec2,
    blocked: HashSet<(i32, i32)>,
}

/// A parsed layout plus its optional markers
#[derive(Debug, Clone)]
pub struct ParsedLayout {
    pub map: TileMap,
    pub start: Option<Position>,
    pub goal: Option<Position>,
    pub target: Option<Position>,
}

impl TileMap {
    pub fn new(width: i32, height: i32, cell_size: f32, origin: Vec2) -> Self {
        TileMap {
            width,
            height,
            cell_size,
            origin,
            blocked: HashSet::new(),
        }
    }

    pub fn with_blocked(
        width: i32,
        height: i32,
        cell_size: f32,
        origin: Vec2,
        blocked: &[(i32, i32)],
    ) -> Self {
        let mut map = Self::new(width, height, cell_size, origin);
        for &(x, y) in blocked {
            map.set_blocked(x, y, true);
        }
        map
    }

    /// Parse the text layout format
    pub fn parse(text: &str, cell_size: f32, origin: Vec2) -> Result<ParsedLayout, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();
        Self::parse_rows(&rows, cell_size, origin)
    }

    /// Parse a layout already split into rows
    pub fn parse_rows<S: AsRef<str>>(
        rows: &[S],
        cell_size: f32,
        origin: Vec2,
    ) -> Result<ParsedLayout, LayoutError> {
        let first = rows.first().ok_or(LayoutError::Empty)?;
        let width = first.as_ref().chars().count();

        let mut map = TileMap::new(width as i32, rows.len() as i32, cell_size, origin);
        let mut start = None;
        let mut goal = None;
        let mut target = None;

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }

            for (column, tile) in line.chars().enumerate() {
                let pos = Position::new(column as i32, row as i32);
                let marker = match tile {
                    '#' | '■' => {
                        map.blocked.insert((pos.x, pos.y));
                        continue;
                    }
                    '.' | '□' => continue,
                    'S' => &mut start,
                    'G' => &mut goal,
                    'T' => &mut target,
                    _ => return Err(LayoutError::UnknownTile { row, column, tile }),
                };
                if marker.replace(pos).is_some() {
                    return Err(LayoutError::DuplicateMarker { marker: tile });
                }
            }
        }

        Ok(ParsedLayout {
            map,
            start,
            goal,
            target,
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

    pub fn is_within_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Out of bounds counts as blocked
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        !self.is_within_bounds(x, y) || self.blocked.contains(&(x, y))
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        if !self.is_within_bounds(x, y) {
            return;
        }
        if blocked {
            self.blocked.insert((x, y));
        } else {
            self.blocked.remove(&(x, y));
        }
    }

    /// Flip a tile between blocked and free
    pub fn toggle(&mut self, x: i32, y: i32) {
        let blocked = self.blocked.contains(&(x, y));
        self.set_blocked(x, y, !blocked);
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.len()
    }

    /// World position of a tile centre
    pub fn tile_center(&self, x: i32, y: i32) -> Vec2 {
        self.origin + vec2(x as f32, y as f32) * self.cell_size + Vec2::splat(self.cell_size / 2.0)
    }

    /// Mirror left to right
    pub fn flipped_horizontal(&self) -> TileMap {
        let mut flipped = TileMap::new(self.width, self.height, self.cell_size, self.origin);
        flipped.blocked = self
            .blocked
            .iter()
            .map(|&(x, y)| (self.width - 1 - x, y))
            .collect();
        flipped
    }

    /// Mirror first row to last row
    pub fn flipped_vertical(&self) -> TileMap {
        let mut flipped = TileMap::new(self.width, self.height, self.cell_size, self.origin);
        flipped.blocked = self
            .blocked
            .iter()
            .map(|&(x, y)| (x, self.height - 1 - y))
            .collect();
        flipped
    }

    /// Render back to the layout format, free tiles as `.`
    pub fn to_layout_string(&self) -> String {
        let mut result = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                result.push(if self.is_blocked(x, y) { '#' } else { '.' });
            }
            result.push('\n');
        }
        result
    }
}

impl OccupancyOracle for TileMap {
    fn is_occupied(&self, center: Vec2, extent: f32) -> bool {
        let ((min_x, min_y), (max_x, max_y)) =
            covered_cells(center, extent, self.cell_size, self.origin);
        (min_y..=max_y).any(|y| (min_x..=max_x).any(|x| self.is_blocked(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "\
S..#
.#.#
...G
";

    #[test]
    fn test_parse_markers_and_walls() {
        let parsed = TileMap::parse(ROOM, 1.0, Vec2::ZERO).unwrap();
        assert_eq!(parsed.map.width(), 4);
        assert_eq!(parsed.map.height(), 3);
        assert_eq!(parsed.start, Some(Position::new(0, 0)));
        assert_eq!(parsed.goal, Some(Position::new(3, 2)));
        assert_eq!(parsed.target, None);
        assert!(parsed.map.is_blocked(3, 0));
        assert!(parsed.map.is_blocked(1, 1));
        assert!(!parsed.map.is_blocked(0, 0));
        assert_eq!(parsed.map.blocked_count(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(TileMap::parse("\n\n", 1.0, Vec2::ZERO).unwrap_err(), LayoutError::Empty);
        assert_eq!(
            TileMap::parse("...\n..\n", 1.0, Vec2::ZERO).unwrap_err(),
            LayoutError::RaggedRow { row: 1, expected: 3, found: 2 }
        );
        assert_eq!(
            TileMap::parse("..x\n", 1.0, Vec2::ZERO).unwrap_err(),
            LayoutError::UnknownTile { row: 0, column: 2, tile: 'x' }
        );
        assert_eq!(
            TileMap::parse("S.S\n", 1.0, Vec2::ZERO).unwrap_err(),
            LayoutError::DuplicateMarker { marker: 'S' }
        );
    }

    #[test]
    fn test_unicode_tiles() {
        let parsed = TileMap::parse("□■\n■□\n", 1.0, Vec2::ZERO).unwrap();
        assert!(parsed.map.is_blocked(1, 0));
        assert!(parsed.map.is_blocked(0, 1));
        assert!(!parsed.map.is_blocked(0, 0));
    }

    #[test]
    fn test_layout_string_round_trip() {
        let parsed = TileMap::parse(ROOM, 1.0, Vec2::ZERO).unwrap();
        let text = parsed.map.to_layout_string();
        assert_eq!(text, "...#\n.#.#\n....\n");
        let reparsed = TileMap::parse(&text, 1.0, Vec2::ZERO).unwrap();
        assert_eq!(reparsed.map, parsed.map);
    }

    #[test]
    fn test_outside_map_is_occupied() {
        let map = TileMap::new(3, 3, 1.0, Vec2::ZERO);
        assert!(!map.is_occupied(vec2(1.5, 1.5), 1.0));
        assert!(map.is_occupied(vec2(-0.5, 1.5), 0.5));
        assert!(map.is_occupied(vec2(2.9, 1.5), 0.5));
    }

    #[test]
    fn test_toggle_and_flip() {
        let mut map = TileMap::new(4, 2, 1.0, Vec2::ZERO);
        map.toggle(0, 0);
        assert!(map.is_blocked(0, 0));
        assert!(map.flipped_horizontal().is_blocked(3, 0));
        assert!(map.flipped_vertical().is_blocked(0, 1));
        map.toggle(0, 0);
        assert!(!map.is_blocked(0, 0));
        map.toggle(9, 9);
        assert_eq!(map.blocked_count(), 0);
    }
}
