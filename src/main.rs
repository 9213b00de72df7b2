use arboard::Clipboard;
use macroquad::prelude::*;
use pursuit::config::LoggingConfig;
use pursuit::pathfinding::format_path;
use pursuit::{
    find_path, Actor, AgentEvent, Config, Grid, GridError, PathScenario, Perception, Position, PursuitAgent,
    TileMap,
};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured directive
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_target(false)
        .init();
}

/// Load config.toml with a temporary subscriber so fallback warnings are not lost
fn load_config() -> Config {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&LoggingConfig::default().filter))
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(bootstrap, Config::load)
}

/// Run every scenario in `dir` with all 4 variants (original, h_flip, v_flip, hv_flip)
fn run_scenarios(dir: &Path) {
    let mut passed = 0;
    let mut failed = 0;
    let mut failures = Vec::new();

    println!("Running path scenarios from {} (4 variants per scenario)\n", dir.display());

    let mut paths: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect(),
        Err(e) => {
            println!("Failed to read {}: {}", dir.display(), e);
            return;
        }
    };
    paths.sort();

    for path in paths {
        let scenario = match PathScenario::load(&path) {
            Ok(scenario) => scenario,
            Err(e) => {
                failed += 1;
                println!("✗ {}", e);
                failures.push(path.display().to_string());
                continue;
            }
        };

        let mut failure = None;
        let mut base_cost = None;
        for variant in scenario.variants() {
            match variant.run() {
                Ok(report) if !report.passed => {
                    failure = Some(format!(
                        "{} ({})",
                        report.name,
                        report.mismatch.unwrap_or_default()
                    ));
                }
                Ok(report) if base_cost.is_some() && report.cost != base_cost => {
                    failure = Some(format!("{} (mirrored cost {:?} differs)", report.name, report.cost));
                }
                Ok(report) => {
                    base_cost = base_cost.or(report.cost);
                    continue;
                }
                Err(e) => failure = Some(format!("{} ({})", variant.test_name, e)),
            }
            break;
        }

        match failure {
            None => {
                passed += 1;
                println!("✓ {} (all 4 variants pass)", scenario.test_name);
            }
            Some(reason) => {
                failed += 1;
                println!("✗ {}", reason);
                failures.push(scenario.test_name.clone());
            }
        }
    }

    println!("\n========================================");
    println!("Scenario Results: {} passed, {} failed", passed, failed);
    println!("Total variants tested: {}", passed * 4);
    println!("========================================");

    if !failures.is_empty() {
        println!("\nFailed scenarios:");
        for name in failures {
            println!("  - {}", name);
        }
    }
}

/// Sandbox state. World `y` grows upward, screen `y` grows downward.
struct Sandbox {
    config: Config,
    map: TileMap,
    grid: Grid,
    agent: PursuitAgent,
    actor: Actor,
    target: Vec2,
    health: i32,
    route: Vec<Position>,
    show_path: bool,
}

impl Sandbox {
    fn new(config: Config) -> Result<Self, GridError> {
        let cell_size = config.grid.cell_size;
        let (map, start, target) = Self::initial_layout(&config);

        let start = start.unwrap_or(Position::new(1, 1));
        let target = target.unwrap_or(Position::new(map.width() - 2, map.height() - 2));

        let grid = Self::snapshot(&map)?;
        let actor = Actor::new(
            map.tile_center(start.x, start.y),
            cell_size * config.pursuit.probe_extent,
        );
        let agent = PursuitAgent::new(config.agent_settings(), config.pursuit_settings());

        Ok(Sandbox {
            target: map.tile_center(target.x, target.y),
            show_path: config.visual.show_path,
            health: 1,
            route: Vec::new(),
            config,
            map,
            grid,
            agent,
            actor,
        })
    }

    /// Empty map of the configured size, or the configured layout file
    fn initial_layout(config: &Config) -> (TileMap, Option<Position>, Option<Position>) {
        let grid = &config.grid;
        let empty = || TileMap::new(grid.width, grid.height, grid.cell_size, Vec2::ZERO);

        let Some(file) = &grid.layout_file else {
            return (empty(), None, None);
        };

        let parsed = fs::read_to_string(file)
            .map_err(|e| e.to_string())
            .and_then(|text| TileMap::parse(&text, grid.cell_size, Vec2::ZERO).map_err(|e| e.to_string()));
        match parsed {
            Ok(layout) => {
                info!(file = %file, blocked = layout.map.blocked_count(), "loaded layout");
                (layout.map, layout.start, layout.target.or(layout.goal))
            }
            Err(e) => {
                warn!(file = %file, "failed to load layout: {e}");
                (empty(), None, None)
            }
        }
    }

    fn snapshot(map: &TileMap) -> Result<Grid, GridError> {
        Grid::new(map.width(), map.height(), map.cell_size(), map.origin(), map)
    }

    fn map_height_px(&self) -> f32 {
        self.map.height() as f32 * self.map.cell_size()
    }

    fn screen_to_world(&self, (x, y): (f32, f32)) -> Vec2 {
        vec2(x, self.map_height_px() - y)
    }

    fn world_to_screen(&self, world: Vec2) -> Vec2 {
        vec2(world.x, self.map_height_px() - world.y)
    }

    fn handle_click(&mut self, mouse: (f32, f32)) {
        let world = self.screen_to_world(mouse);
        let (x, y) = self.grid.world_to_grid(world);
        if !self.map.is_within_bounds(x, y) {
            return;
        }

        // Left click: toggle obstacle
        if is_mouse_button_pressed(MouseButton::Left) {
            self.map.toggle(x, y);
            match Self::snapshot(&self.map) {
                Ok(grid) => self.grid = grid,
                Err(e) => warn!("failed to rebuild grid: {e}"),
            }
        }
        // Right click: move target
        else if is_mouse_button_pressed(MouseButton::Right) && !self.map.is_blocked(x, y) {
            self.target = world;
        }
    }

    fn command_route(&mut self) {
        let budget = self.config.max_expansions();
        if !self
            .agent
            .command_route(&self.grid, self.actor.position, self.target, budget)
        {
            info!("no route to target");
        }
    }

    fn update(&mut self, dt: f32) {
        let perception = Perception {
            position: self.actor.position,
            target: self.target,
            target_alive: true,
            health: self.health,
        };

        let output = self.agent.tick(&self.map, &perception, dt);
        for event in &output.events {
            match event {
                AgentEvent::StateChanged { from, to } => info!(?from, ?to, "state changed"),
                other => info!(event = ?other, "agent event"),
            }
        }

        self.actor.velocity = output.velocity;
        self.actor.integrate_blocked(dt, &self.map);

        self.route = match (self.show_path, self.actor.cell(&self.grid)) {
            (true, Some(from)) => {
                let (gx, gy) = self.grid.world_to_grid(self.target);
                find_path(&self.grid, from, Position::new(gx, gy))
            }
            _ => Vec::new(),
        };
    }

    fn copy_to_clipboard(&self) {
        let layout = self.map.to_layout_string();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(&layout) {
                    warn!("failed to copy to clipboard: {e}");
                } else {
                    info!("layout copied to clipboard");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => warn!("failed to access clipboard: {e}"),
        }
    }

    fn draw(&self) {
        let visual = &self.config.visual;
        clear_background(Color::from_rgba(
            visual.background_r,
            visual.background_g,
            visual.background_b,
            255,
        ));

        let cell_size = self.map.cell_size();
        for y in 0..self.map.height() {
            for x in 0..self.map.width() {
                let corner = self.world_to_screen(self.map.tile_center(x, y)) - Vec2::splat(cell_size / 2.0);
                let color = if self.map.is_blocked(x, y) {
                    RED
                } else {
                    Color::from_rgba(60, 60, 60, 255)
                };
                draw_rectangle(corner.x, corner.y, cell_size - 1.0, cell_size - 1.0, color);
            }
        }

        if self.show_path {
            for pair in self.route.windows(2) {
                let a = self.world_to_screen(self.grid.grid_to_world(pair[0].x, pair[0].y));
                let b = self.world_to_screen(self.grid.grid_to_world(pair[1].x, pair[1].y));
                draw_line(a.x, a.y, b.x, b.y, 3.0, Color::from_rgba(100, 200, 100, 255));
            }
        }

        let target = self.world_to_screen(self.target);
        draw_circle(target.x, target.y, cell_size / 3.0, YELLOW);

        let (left, _, _, top) = self.actor.bounds();
        let corner = self.world_to_screen(vec2(left, top));
        let agent_color = if self.agent.is_dead() { GRAY } else { BLUE };
        draw_rectangle(corner.x, corner.y, self.actor.size, self.actor.size, agent_color);

        let pursuit = self.agent.pursuit().state();
        let info = [
            format!("State: {:?}", self.agent.kind()),
            format!(
                "Heading: {:?}  detour: {:?}",
                pursuit.last_moving_direction(),
                pursuit.will_collide().then(|| pursuit.alternative_direction())
            ),
            format!("A*: {} ({} cells)", format_path(&self.route[..self.route.len().min(4)]), self.route.len()),
            "Left click: toggle obstacle | Right click: move target".to_string(),
            "M: follow A* route | K: kill agent | R: reset | P: toggle path | C: copy layout".to_string(),
        ];
        let base = self.map_height_px() + 20.0;
        for (i, line) in info.iter().enumerate() {
            draw_text(line, 10.0, base + i as f32 * 20.0, 20.0, WHITE);
        }
    }
}

#[macroquad::main("Pursuit Sandbox")]
async fn main() {
    let config = load_config();
    init_logging(&config.logging.filter);

    // Check command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--scenarios" {
        let dir = args.get(2).map(String::as_str).unwrap_or("./test_data");
        run_scenarios(Path::new(dir));
        return;
    }

    let mut state = match Sandbox::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("cannot start sandbox: {e}");
            return;
        }
    };

    loop {
        // Handle input
        if is_mouse_button_pressed(MouseButton::Left) || is_mouse_button_pressed(MouseButton::Right) {
            state.handle_click(mouse_position());
        }

        if is_key_pressed(KeyCode::M) {
            state.command_route();
        }

        if is_key_pressed(KeyCode::K) {
            state.health = 0;
        }

        if is_key_pressed(KeyCode::R) {
            match Sandbox::new(state.config.clone()) {
                Ok(fresh) => state = fresh,
                Err(e) => warn!("reset failed: {e}"),
            }
        }

        if is_key_pressed(KeyCode::P) {
            state.show_path = !state.show_path;
        }

        // Copy layout to clipboard on C key
        if is_key_pressed(KeyCode::C) {
            state.copy_to_clipboard();
        }

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.update(get_frame_time().min(0.1));
        state.draw();

        next_frame().await
    }
}
