pub mod actor;
pub mod cell;
pub mod compass;
pub mod config;
pub mod error;
pub mod grid;
pub mod layout;
pub mod occupancy;
pub mod pathfinding;
pub mod pursuit;
pub mod queue;
pub mod raycast;
pub mod scenario;
pub mod state_machine;

pub use actor::Actor;
pub use cell::GridCell;
pub use compass::Direction;
pub use config::Config;
pub use error::{GridError, QueueError};
pub use grid::Grid;
pub use layout::{LayoutError, TileMap};
pub use occupancy::OccupancyOracle;
pub use pathfinding::{find_path, search, Path, PathOutcome, Position};
pub use pursuit::{PursuitController, PursuitSettings, Steering};
pub use queue::{Keyed, PriorityQueue};
pub use raycast::{cast, CastHit, Probe};
pub use scenario::{run_scenario_dir, PathScenario, ScenarioReport};
pub use state_machine::{AgentEvent, AgentSettings, AgentState, Perception, PursuitAgent, StateKind};
