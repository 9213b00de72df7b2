use crate::pursuit::PursuitSettings;
use crate::raycast::Probe;
use crate::state_machine::AgentSettings;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub pursuit: PursuitConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub pathfinding: PathfindingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub visual: VisualConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Optional text layout loaded at startup instead of an empty map
    #[serde(default)]
    pub layout_file: Option<String>,
}

/// Pursuit tuning, distances in cells so it scales with `grid.cell_size`
#[derive(Debug, Clone, Deserialize)]
pub struct PursuitConfig {
    /// Cells per second
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_lookahead_cells")]
    pub lookahead_cells: f32,
    #[serde(default = "default_attack_range_cells")]
    pub attack_range_cells: f32,
    #[serde(default = "default_detour_lookahead_cells")]
    pub detour_lookahead_cells: f32,
    #[serde(default = "default_alignment_tolerance")]
    pub alignment_tolerance: f32,
    /// Probe box side as a fraction of a cell
    #[serde(default = "default_probe_extent")]
    pub probe_extent: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_independent")]
    pub independent: bool,
    #[serde(default = "default_detection_range_cells")]
    pub detection_range_cells: f32,
    /// Seconds
    #[serde(default = "default_attack_cooldown")]
    pub attack_cooldown: f32,
    /// Fraction of a cell
    #[serde(default = "default_waypoint_tolerance")]
    pub waypoint_tolerance: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathfindingConfig {
    /// Expansion cap for one search; 0 means width * height
    #[serde(default)]
    pub max_expansions: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, `RUST_LOG` takes precedence
    #[serde(default = "default_filter")]
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    #[serde(default = "default_show_path")]
    pub show_path: bool,
}

// Default values
fn default_width() -> i32 { 24 }
fn default_height() -> i32 { 18 }
fn default_cell_size() -> f32 { 32.0 }
fn default_speed() -> f32 { 3.0 }
fn default_lookahead_cells() -> f32 { 5.0 }
fn default_attack_range_cells() -> f32 { 1.0 }
fn default_detour_lookahead_cells() -> f32 { 1.0 }
fn default_alignment_tolerance() -> f32 { 0.25 }
fn default_probe_extent() -> f32 { 0.5 }
fn default_independent() -> bool { true }
fn default_detection_range_cells() -> f32 { 6.0 }
fn default_attack_cooldown() -> f32 { 0.8 }
fn default_waypoint_tolerance() -> f32 { 0.1 }
fn default_filter() -> String { "pursuit=info".to_string() }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_show_path() -> bool { true }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            cell_size: default_cell_size(),
            layout_file: None,
        }
    }
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            lookahead_cells: default_lookahead_cells(),
            attack_range_cells: default_attack_range_cells(),
            detour_lookahead_cells: default_detour_lookahead_cells(),
            alignment_tolerance: default_alignment_tolerance(),
            probe_extent: default_probe_extent(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            independent: default_independent(),
            detection_range_cells: default_detection_range_cells(),
            attack_cooldown: default_attack_cooldown(),
            waypoint_tolerance: default_waypoint_tolerance(),
        }
    }
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self { max_expansions: 0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            show_path: default_show_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            pursuit: PursuitConfig::default(),
            agent: AgentConfig::default(),
            pathfinding: PathfindingConfig::default(),
            logging: LoggingConfig::default(),
            visual: VisualConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match Config::from_file(CONFIG_FILE) {
            Ok(config) => {
                info!("loaded configuration from {CONFIG_FILE}");
                config
            }
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("no {CONFIG_FILE} found, using default configuration");
                Config::default()
            }
            Err(e) => {
                warn!("{e}; using default configuration");
                Config::default()
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn pursuit_settings(&self) -> PursuitSettings {
        let cell_size = self.grid.cell_size;
        PursuitSettings {
            speed: self.pursuit.speed * cell_size,
            cell_size,
            lookahead_cells: self.pursuit.lookahead_cells,
            attack_range_cells: self.pursuit.attack_range_cells,
            detour_lookahead_cells: self.pursuit.detour_lookahead_cells,
            alignment_tolerance: self.pursuit.alignment_tolerance,
            probe: Probe::for_cell(cell_size, self.pursuit.probe_extent),
        }
    }

    pub fn agent_settings(&self) -> AgentSettings {
        let cell_size = self.grid.cell_size;
        AgentSettings {
            independent: self.agent.independent,
            detection_range: self.agent.detection_range_cells * cell_size,
            attack_cooldown: self.agent.attack_cooldown,
            waypoint_tolerance: self.agent.waypoint_tolerance * cell_size,
        }
    }

    /// Expansion budget for a search over the configured grid
    pub fn max_expansions(&self) -> usize {
        match self.pathfinding.max_expansions {
            0 => (self.grid.width.max(0) as usize) * (self.grid.height.max(0) as usize),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.grid.width, 24);
        assert_eq!(config.logging.filter, "pursuit=info");
        assert_eq!(config.max_expansions(), 24 * 18);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_toml_str(
            "[grid]\ncell_size = 10.0\n\n[agent]\nindependent = false\n\n[pathfinding]\nmax_expansions = 50\n",
        )
        .unwrap();

        assert_eq!(config.grid.width, 24);
        assert!(!config.agent.independent);
        assert_eq!(config.max_expansions(), 50);

        let pursuit = config.pursuit_settings();
        assert_eq!(pursuit.cell_size, 10.0);
        assert_eq!(pursuit.speed, 30.0);
        assert_eq!(pursuit.lookahead(), 50.0);
        assert_eq!(pursuit.probe.extent, 5.0);

        let agent = config.agent_settings();
        assert_eq!(agent.detection_range, 60.0);
        assert_eq!(agent.waypoint_tolerance, 1.0);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = Config::from_toml_str("[grid\nwidth = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
