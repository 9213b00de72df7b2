//! JSON path scenarios: a text layout with start and goal markers plus the
//! expected outcome of a search between them.
//!
//! ```json
//! {
//!   "testName": "wall_gap",
//!   "layout": ["S.#..", "..#..", "....G"],
//!   "expectedCost": 48
//! }
//! ```

use crate::error::GridError;
use crate::grid::Grid;
use crate::layout::{LayoutError, TileMap};
use crate::pathfinding::{format_path, search, PathOutcome, Position};
use macroquad::math::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid scenario {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("layout has no '{marker}' marker")]
    MissingMarker { marker: char },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathScenario {
    #[serde(rename = "testName")]
    pub test_name: String,
    pub layout: Vec<String>,
    #[serde(rename = "cellSize", default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(rename = "expectedCost", default, skip_serializing_if = "Option::is_none")]
    pub expected_cost: Option<i32>,
    #[serde(rename = "expectedLength", default, skip_serializing_if = "Option::is_none")]
    pub expected_length: Option<usize>,
    #[serde(rename = "expectNoPath", default)]
    pub expect_no_path: bool,
}

fn default_cell_size() -> f32 {
    1.0
}

/// Result of running one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub name: String,
    pub path: Vec<Position>,
    /// `None` when no path was found
    pub cost: Option<i32>,
    pub passed: bool,
    pub mismatch: Option<String>,
}

impl PathScenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ScenarioError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the grid snapshot and search from `S` to `G`
    pub fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        let parsed = TileMap::parse_rows(&self.layout, self.cell_size, Vec2::ZERO)?;
        let start = parsed.start.ok_or(ScenarioError::MissingMarker { marker: 'S' })?;
        let goal = parsed.goal.ok_or(ScenarioError::MissingMarker { marker: 'G' })?;

        let map = parsed.map;
        let grid = Grid::new(map.width(), map.height(), map.cell_size(), map.origin(), &map)?;
        let budget = (grid.width() * grid.height()) as usize;

        let (path, cost) = match search(&grid, start, goal, budget) {
            PathOutcome::Found(path) => (path.cells, Some(path.cost)),
            _ => (Vec::new(), None),
        };

        let mismatch = self.check(&path, cost);
        debug!(
            scenario = %self.test_name,
            path = %format_path(&path),
            passed = mismatch.is_none(),
            "scenario finished"
        );

        Ok(ScenarioReport {
            name: self.test_name.clone(),
            passed: mismatch.is_none(),
            path,
            cost,
            mismatch,
        })
    }

    fn check(&self, path: &[Position], cost: Option<i32>) -> Option<String> {
        if self.expect_no_path {
            return cost.map(|c| format!("expected no path, found one of cost {c}"));
        }
        let Some(cost) = cost else {
            return Some("expected a path, found none".to_string());
        };
        if let Some(expected) = self.expected_cost {
            if expected != cost {
                return Some(format!("expected cost {expected}, got {cost}"));
            }
        }
        if let Some(expected) = self.expected_length {
            if expected != path.len() {
                return Some(format!("expected {expected} cells, got {}", path.len()));
            }
        }
        None
    }

    /// Mirror left-right. The cell count of an optimal path depends on
    /// tie-breaking, so mirrors only keep the cost expectation.
    pub fn flipped_horizontal(&self) -> PathScenario {
        let layout = self
            .layout
            .iter()
            .map(|row| row.chars().rev().collect())
            .collect();
        self.mirror("h_flip", layout)
    }

    /// Mirror top-bottom
    pub fn flipped_vertical(&self) -> PathScenario {
        let layout = self.layout.iter().rev().cloned().collect();
        self.mirror("v_flip", layout)
    }

    /// Mirror both axes
    pub fn flipped_both(&self) -> PathScenario {
        let mut both = self.flipped_horizontal().flipped_vertical();
        both.test_name = format!("{}_hv_flip", self.test_name);
        both
    }

    /// Original plus all three mirrors
    pub fn variants(&self) -> Vec<PathScenario> {
        vec![
            self.clone(),
            self.flipped_horizontal(),
            self.flipped_vertical(),
            self.flipped_both(),
        ]
    }

    fn mirror(&self, suffix: &str, layout: Vec<String>) -> PathScenario {
        PathScenario {
            test_name: format!("{}_{}", self.test_name, suffix),
            layout,
            expected_length: None,
            ..self.clone()
        }
    }
}

/// Load and run every `*.json` scenario in `dir`, in file name order
pub fn run_scenario_dir(dir: impl AsRef<Path>) -> Result<Vec<ScenarioReport>, ScenarioError> {
    let dir = dir.as_ref();
    let io_error = |source| ScenarioError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| PathScenario::load(path)?.run())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(layout: &[&str]) -> PathScenario {
        PathScenario {
            test_name: "inline".to_string(),
            layout: layout.iter().map(|s| s.to_string()).collect(),
            cell_size: 1.0,
            expected_cost: None,
            expected_length: None,
            expect_no_path: false,
        }
    }

    #[test]
    fn test_json_keys_and_defaults() {
        let json = r#"{ "testName": "tiny", "layout": ["S.G"], "expectedCost": 20 }"#;
        let parsed: PathScenario = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.test_name, "tiny");
        assert_eq!(parsed.cell_size, 1.0);
        assert_eq!(parsed.expected_cost, Some(20));
        assert!(!parsed.expect_no_path);

        let report = parsed.run().unwrap();
        assert!(report.passed, "{:?}", report.mismatch);
        assert_eq!(report.path.len(), 3);
    }

    #[test]
    fn test_cost_mismatch_is_reported() {
        let mut s = scenario(&["S..G"]);
        s.expected_cost = Some(20);

        let report = s.run().unwrap();
        assert!(!report.passed);
        assert_eq!(report.cost, Some(30));
        assert_eq!(report.mismatch.as_deref(), Some("expected cost 20, got 30"));
    }

    #[test]
    fn test_expected_no_path() {
        let mut s = scenario(&["S#.", "##.", "..G"]);
        s.expect_no_path = true;

        let report = s.run().unwrap();
        assert!(report.passed);
        assert!(report.path.is_empty());
    }

    #[test]
    fn test_missing_goal_marker() {
        let err = scenario(&["S.."]).run().unwrap_err();
        assert!(matches!(err, ScenarioError::MissingMarker { marker: 'G' }));
    }

    #[test]
    fn test_mirrors_move_markers() {
        let s = scenario(&["S..", "..G"]);
        assert_eq!(s.flipped_horizontal().layout, vec!["..S", "G.."]);
        assert_eq!(s.flipped_vertical().layout, vec!["..G", "S.."]);
        assert_eq!(s.flipped_both().layout, vec!["G..", "..S"]);
        assert_eq!(s.flipped_both().test_name, "inline_hv_flip");
    }
}
