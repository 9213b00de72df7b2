//! Per-agent combat and chase behaviour.
//!
//! States are plain enum variants carrying only their own scratch data. Each
//! tick runs the current state's execute function, which either keeps the
//! state (with a velocity) or names the next one. Health is checked before any
//! state runs, so death always wins.

use crate::compass::Direction;
use crate::grid::Grid;
use crate::occupancy::OccupancyOracle;
use crate::pathfinding::{search, PathOutcome, Position};
use crate::pursuit::{PursuitController, PursuitSettings, Steering};
use macroquad::math::Vec2;
use std::mem;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Independent agents only chase targets within `detection_range`;
    /// the rest always chase a living target
    pub independent: bool,
    pub detection_range: f32,
    /// Seconds an attack occupies the agent
    pub attack_cooldown: f32,
    /// Distance at which a route waypoint counts as reached
    pub waypoint_tolerance: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        AgentSettings {
            independent: true,
            detection_range: 6.0,
            attack_cooldown: 0.8,
            waypoint_tolerance: 0.1,
        }
    }
}

/// What the agent knows about the world this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub position: Vec2,
    pub target: Vec2,
    pub target_alive: bool,
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentState {
    Idle,
    Chase,
    AvoidObstacle,
    Attack { direction: Direction, elapsed: f32 },
    Dead,
    /// Walking a pre-planned route, `next` is the waypoint being approached
    Move { waypoints: Vec<Vec2>, next: usize },
}

/// Data-free tag of an `AgentState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    Chase,
    AvoidObstacle,
    Attack,
    Dead,
    Move,
}

impl AgentState {
    pub fn kind(&self) -> StateKind {
        match self {
            AgentState::Idle => StateKind::Idle,
            AgentState::Chase => StateKind::Chase,
            AgentState::AvoidObstacle => StateKind::AvoidObstacle,
            AgentState::Attack { .. } => StateKind::Attack,
            AgentState::Dead => StateKind::Dead,
            AgentState::Move { .. } => StateKind::Move,
        }
    }
}

/// Signals for collaborators outside the pursuit core (damage, loot, audio)
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    StateChanged { from: StateKind, to: StateKind },
    AttackStarted { direction: Direction },
    Died,
    PursuitStalled { direction: Direction },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub velocity: Vec2,
    pub events: Vec<AgentEvent>,
}

enum Step {
    Stay(Vec2),
    Change(AgentState),
}

#[derive(Debug, Clone)]
pub struct PursuitAgent {
    settings: AgentSettings,
    pursuit: PursuitController,
    state: AgentState,
    velocity: Vec2,
    pending: Vec<AgentEvent>,
}

impl PursuitAgent {
    pub fn new(settings: AgentSettings, pursuit: PursuitSettings) -> Self {
        PursuitAgent {
            settings,
            pursuit: PursuitController::new(pursuit),
            state: AgentState::Idle,
            velocity: Vec2::ZERO,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn pursuit(&self) -> &PursuitController {
        &self.pursuit
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn is_dead(&self) -> bool {
        self.state == AgentState::Dead
    }

    /// Walk `waypoints` in order. Ignored once dead or when the route is empty.
    pub fn command_move(&mut self, waypoints: Vec<Vec2>) -> bool {
        if self.is_dead() || waypoints.is_empty() {
            return false;
        }
        self.transition(AgentState::Move { waypoints, next: 0 });
        true
    }

    /// Plan an A* route over `grid` from `from` to `to` and walk it
    pub fn command_route(&mut self, grid: &Grid, from: Vec2, to: Vec2, max_expansions: usize) -> bool {
        let (sx, sy) = grid.world_to_grid(from);
        let (gx, gy) = grid.world_to_grid(to);
        match search(grid, Position::new(sx, sy), Position::new(gx, gy), max_expansions) {
            PathOutcome::Found(path) => self.command_move(path.to_world(grid)),
            outcome => {
                debug!(?outcome, "route command without a path");
                false
            }
        }
    }

    /// Advance one frame and return the velocity to apply plus any events
    pub fn tick(&mut self, oracle: &impl OccupancyOracle, perception: &Perception, dt: f32) -> TickOutput {
        let step = if perception.health <= 0 && !self.is_dead() {
            Step::Change(AgentState::Dead)
        } else {
            self.execute(oracle, perception, dt)
        };

        match step {
            Step::Stay(velocity) => self.velocity = velocity,
            Step::Change(next) => self.transition(next),
        }

        TickOutput {
            velocity: self.velocity,
            events: mem::take(&mut self.pending),
        }
    }

    fn execute(&mut self, oracle: &impl OccupancyOracle, p: &Perception, dt: f32) -> Step {
        let settings = &self.settings;
        let pursuit = &mut self.pursuit;
        let events = &mut self.pending;

        match &mut self.state {
            AgentState::Idle => execute_idle(settings, p),
            AgentState::Chase => execute_chase(settings, pursuit, oracle, p),
            AgentState::AvoidObstacle => execute_avoid(pursuit, oracle, p, events),
            AgentState::Attack { elapsed, .. } => execute_attack(settings, elapsed, dt),
            AgentState::Dead => Step::Stay(Vec2::ZERO),
            AgentState::Move { waypoints, next } => {
                execute_move(settings, pursuit.settings().speed, waypoints, next, p)
            }
        }
    }

    fn transition(&mut self, next: AgentState) {
        let from = self.state.kind();
        let to = next.kind();

        if from == StateKind::AvoidObstacle {
            self.pursuit.reset();
        }

        match &next {
            AgentState::Idle => self.pursuit.reset(),
            AgentState::Attack { direction, .. } => {
                self.pending.push(AgentEvent::AttackStarted { direction: *direction });
            }
            AgentState::Dead => self.pending.push(AgentEvent::Died),
            _ => {}
        }

        // Movement resumes on the first execute of the new state
        self.velocity = Vec2::ZERO;
        self.state = next;
        self.pending.push(AgentEvent::StateChanged { from, to });
        debug!(?from, ?to, "agent state change");
    }
}

fn chase_eligible(settings: &AgentSettings, p: &Perception) -> bool {
    p.target_alive
        && (!settings.independent || p.position.distance(p.target) <= settings.detection_range)
}

fn execute_idle(settings: &AgentSettings, p: &Perception) -> Step {
    if chase_eligible(settings, p) {
        Step::Change(AgentState::Chase)
    } else {
        Step::Stay(Vec2::ZERO)
    }
}

fn execute_chase(
    settings: &AgentSettings,
    pursuit: &mut PursuitController,
    oracle: &impl OccupancyOracle,
    p: &Perception,
) -> Step {
    if !chase_eligible(settings, p) {
        return Step::Change(AgentState::Idle);
    }
    if let Some(direction) = pursuit.attack_direction(oracle, p.position, p.target) {
        return Step::Change(AgentState::Attack {
            direction,
            elapsed: 0.0,
        });
    }
    if !pursuit.has_direct_path(oracle, p.position, p.target) {
        return Step::Change(AgentState::AvoidObstacle);
    }
    Step::Stay(pursuit.move_direct(p.position, p.target).velocity())
}

fn execute_avoid(
    pursuit: &mut PursuitController,
    oracle: &impl OccupancyOracle,
    p: &Perception,
    events: &mut Vec<AgentEvent>,
) -> Step {
    if !p.target_alive {
        return Step::Change(AgentState::Idle);
    }
    if pursuit.has_direct_path(oracle, p.position, p.target) {
        return Step::Change(AgentState::Chase);
    }

    match pursuit.continue_detour(oracle, p.position, p.target) {
        Steering::Stalled { direction, .. } => {
            events.push(AgentEvent::PursuitStalled { direction });
            Step::Change(AgentState::Idle)
        }
        steering => Step::Stay(steering.velocity()),
    }
}

fn execute_attack(settings: &AgentSettings, elapsed: &mut f32, dt: f32) -> Step {
    *elapsed += dt;
    if *elapsed >= settings.attack_cooldown {
        Step::Change(AgentState::Idle)
    } else {
        Step::Stay(Vec2::ZERO)
    }
}

fn execute_move(
    settings: &AgentSettings,
    speed: f32,
    waypoints: &[Vec2],
    next: &mut usize,
    p: &Perception,
) -> Step {
    if chase_eligible(settings, p) {
        return Step::Change(AgentState::Chase);
    }

    while let Some(waypoint) = waypoints.get(*next) {
        let offset = *waypoint - p.position;
        if offset.length() > settings.waypoint_tolerance {
            return Step::Stay(offset.normalize_or_zero() * speed);
        }
        *next += 1;
    }
    Step::Change(AgentState::Idle)
}
