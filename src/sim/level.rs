//! Level definitions, exit gates and spawning
//!
//! Levels are plain records supplied by the surrounding program (in code or
//! as JSON). Instantiating one resolves spawns and overrides into a
//! [`LevelState`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::Pursuer;
use super::geometry::Rect;
use super::obstacle::{DoorState, Obstacle, ObstacleSet};
use super::state::{Actor, LevelState, LevelTimer, Player};
use super::vision::VisionParams;
use crate::config::{SimConfig, validate_vision};
use crate::error::SimError;

/// Maze layouts are authored in cells and multiplied by this many units
pub const MAZE_SCALE: f32 = 12.0;
/// Per-level timer for the built-in mazes (seconds)
pub const MAZE_TIME: f32 = 15.0;
/// Clear fog radius in the built-in mazes
pub const MAZE_FOG_RADIUS: f32 = 150.0;
pub const MAZE_PLAYER_SPEED: f32 = 6.0;
pub const MAZE_PLAYER_SIZE: Vec2 = Vec2::new(50.0, 30.0);
/// Forest maze start; random walls never cover it
pub const FOREST_START: Vec2 = Vec2::new(400.0, 800.0);

/// What the player must reach to finish a level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExitGate {
    /// Overlap this rectangle
    Region(Rect),
    /// Overlap the level's door while it is open
    Door,
}

impl ExitGate {
    /// Overlap test against the gate region, gated by door state for doors
    pub fn is_satisfied(&self, player_box: &Rect, obstacles: &ObstacleSet) -> bool {
        match self {
            ExitGate::Region(rect) => rect.overlaps(player_box),
            ExitGate::Door => obstacles
                .door()
                .is_some_and(|door| !door.blocks() && door.rect.overlaps(player_box)),
        }
    }

    /// The rectangle a renderer should highlight
    pub fn region(&self, obstacles: &ObstacleSet) -> Option<Rect> {
        match self {
            ExitGate::Region(rect) => Some(*rect),
            ExitGate::Door => obstacles.door().map(|d| d.rect),
        }
    }
}

/// Where an actor starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Spawn {
    /// Exactly here
    At(Vec2),
    /// Random open spot with its center inside this region
    Random(Rect),
}

impl Spawn {
    pub fn is_finite(&self) -> bool {
        match self {
            Spawn::At(pos) => pos.is_finite(),
            Spawn::Random(region) => region.is_finite(),
        }
    }
}

/// A level as supplied by the surrounding program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    pub obstacles: Vec<Obstacle>,
    pub start: Spawn,
    pub exit: ExitGate,
    /// Seconds to reach the exit. `None` means untimed.
    #[serde(default)]
    pub time_budget: Option<f32>,
    #[serde(default)]
    pub enemies: Vec<Spawn>,

    // Per-level overrides of the global config
    #[serde(default)]
    pub player_speed: Option<f32>,
    #[serde(default)]
    pub enemy_speed: Option<f32>,
    #[serde(default)]
    pub player_size: Option<Vec2>,
    #[serde(default)]
    pub enemy_size: Option<Vec2>,
    #[serde(default)]
    pub vision: Option<VisionParams>,
    /// Clear radius of the fog disk when it should differ from vision range
    #[serde(default)]
    pub fog_radius: Option<f32>,
}

impl LevelDef {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Vision in effect on this level
    pub fn vision_or(&self, config: &SimConfig) -> VisionParams {
        self.vision.unwrap_or(config.vision)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason| {
            Err(SimError::InvalidLevel {
                level: self.name.clone(),
                reason,
            })
        };

        let doors = self.obstacles.iter().filter(|o| o.is_door()).count();
        if doors > 1 {
            return invalid("has more than one door");
        }
        if self.exit == ExitGate::Door && doors == 0 {
            return invalid("exits through a door but has none");
        }
        if self.time_budget.is_some_and(|t| !(t > 0.0 && t.is_finite())) {
            return invalid("time budget must be positive and finite");
        }
        if self.fog_radius.is_some_and(|r| !(r >= 0.0 && r.is_finite())) {
            return invalid("fog radius must be finite and not negative");
        }
        for size in [self.player_size, self.enemy_size].into_iter().flatten() {
            if !(size.x > 0.0 && size.y > 0.0 && size.is_finite()) {
                return invalid("actor size must be positive and finite");
            }
        }
        if self.player_speed.is_some_and(|v| !(v > 0.0 && v.is_finite())) {
            return invalid("player speed must be positive and finite");
        }
        if self.enemy_speed.is_some_and(|v| !(v >= 0.0 && v.is_finite())) {
            return invalid("enemy speed must be finite and not negative");
        }
        if !self.obstacles.iter().all(|o| o.rect.is_finite()) {
            return invalid("obstacle rectangles must be finite");
        }
        if let ExitGate::Region(rect) = &self.exit {
            if !rect.is_finite() {
                return invalid("exit region must be finite");
            }
        }
        if !std::iter::once(&self.start)
            .chain(&self.enemies)
            .all(Spawn::is_finite)
        {
            return invalid("spawn points and regions must be finite");
        }
        if let Some(vision) = &self.vision {
            validate_vision(vision)?;
        }
        Ok(())
    }

    /// Resolve spawns and overrides into a fresh level state
    pub fn instantiate<R: Rng>(
        &self,
        index: usize,
        config: &SimConfig,
        rng: &mut R,
    ) -> Result<LevelState, SimError> {
        self.validate()?;

        let obstacles = ObstacleSet::new(self.obstacles.clone());
        let attempts = config.spawn_attempts;

        let player_size = self.player_size.unwrap_or(config.actor_size);
        let player_speed = self.player_speed.unwrap_or(config.player_speed);
        let start = resolve_spawn(&self.start, player_size, &obstacles, attempts, &mut *rng);
        let player = Player::new(Actor::new(start, player_speed, player_size));

        let enemy_size = self.enemy_size.unwrap_or(config.actor_size);
        let enemy_speed = self.enemy_speed.unwrap_or(config.enemy_speed);
        let mut enemies = Vec::with_capacity(self.enemies.len());
        for spawn in &self.enemies {
            let pos = resolve_spawn(spawn, enemy_size, &obstacles, attempts, &mut *rng);
            enemies.push(Pursuer::new(Actor::new(pos, enemy_speed, enemy_size)));
        }

        Ok(LevelState {
            index,
            name: self.name.clone(),
            obstacles,
            player,
            enemies,
            exit: self.exit,
            timer: LevelTimer::new(self.time_budget),
            vision: self.vision_or(config),
            fog_radius: self.fog_radius,
            time_ticks: 0,
        })
    }
}

/// Parse a JSON array of levels
pub fn levels_from_json(json: &str) -> Result<Vec<LevelDef>, SimError> {
    let levels: Vec<LevelDef> = serde_json::from_str(json)?;
    for level in &levels {
        level.validate()?;
    }
    Ok(levels)
}

fn resolve_spawn<R: Rng>(
    spawn: &Spawn,
    size: Vec2,
    obstacles: &ObstacleSet,
    attempts: u32,
    rng: &mut R,
) -> Vec2 {
    match spawn {
        Spawn::At(pos) => *pos,
        Spawn::Random(region) => find_open_position(rng, region, size, obstacles, attempts),
    }
}

/// Random position in `region` where a box of `size` overlaps no blocking
/// obstacle
///
/// Gives up after `max_attempts` tries and returns the region's center, even
/// if that spot is blocked.
pub fn find_open_position<R: Rng>(
    rng: &mut R,
    region: &Rect,
    size: Vec2,
    obstacles: &ObstacleSet,
    max_attempts: u32,
) -> Vec2 {
    for _ in 0..max_attempts {
        let candidate = Vec2::new(
            sample_span(rng, region.left(), region.right()),
            sample_span(rng, region.top(), region.bottom()),
        );
        if !obstacles.collides(&Rect::from_center(candidate, size)) {
            return candidate;
        }
    }
    log::warn!(
        "No open position in {:?} after {} attempts, using region center",
        region,
        max_attempts
    );
    region.center()
}

fn sample_span<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    // rand scales the span up slightly, so leave headroom below f32::MAX
    if hi > lo && ((hi - lo) * 2.0).is_finite() {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

/// Wall from maze-cell coordinates
fn cell(x: i32, y: i32, w: i32, h: i32) -> Obstacle {
    Obstacle::wall(Rect::new(x as f32, y as f32, w as f32, h as f32).scaled(MAZE_SCALE))
}

fn cell_rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
    Rect::new(x as f32, y as f32, w as f32, h as f32).scaled(MAZE_SCALE)
}

/// The 80x80-cell boundary shared by every maze
fn maze_boundary() -> Vec<Obstacle> {
    vec![
        cell(0, 0, 80, 5),
        cell(0, 75, 80, 5),
        cell(0, 0, 5, 75),
        cell(75, 0, 5, 75),
    ]
}

fn maze_level(name: &str, obstacles: Vec<Obstacle>, start: Spawn, exit: Rect) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        obstacles,
        start,
        exit: ExitGate::Region(exit),
        time_budget: Some(MAZE_TIME),
        enemies: Vec::new(),
        player_speed: Some(MAZE_PLAYER_SPEED),
        enemy_speed: None,
        player_size: Some(MAZE_PLAYER_SIZE),
        enemy_size: None,
        vision: None,
        fog_radius: Some(MAZE_FOG_RADIUS),
    }
}

/// Giant spiral
pub fn spiral_maze() -> LevelDef {
    let mut walls = maze_boundary();
    walls.extend((0..35).step_by(5).map(|i| cell(5 + i, 5 + i, 70 - 2 * i, 5)));
    walls.extend((0..35).step_by(5).map(|i| cell(5 + i, 70 - i, 5, 65 - 2 * i)));
    walls.push(cell(40, 40, 5, 30));
    maze_level(
        "Giant Spiral",
        walls,
        Spawn::At(Vec2::new(100.0, 500.0)),
        cell_rect(70, 70, 5, 5),
    )
}

/// Grid labyrinth
pub fn grid_labyrinth() -> LevelDef {
    let mut walls = maze_boundary();
    for x in (10..70).step_by(15) {
        for y in (5..65).step_by(25) {
            walls.push(cell(x, y, 5, 20));
        }
    }
    for x in (5..65).step_by(20) {
        for y in (20..60).step_by(20) {
            walls.push(cell(x, y, 15, 5));
        }
    }
    walls.push(cell(35, 30, 5, 40));
    maze_level(
        "Grid Labyrinth",
        walls,
        Spawn::At(Vec2::new(100.0, 330.0)),
        cell_rect(5, 70, 5, 5),
    )
}

/// Forest of randomly placed short walls. The layout comes from `seed`.
///
/// Random walls landing on the start are dropped, so the mouse always
/// starts in the open.
pub fn forest_maze(seed: u64) -> LevelDef {
    let mut rng = Pcg32::seed_from_u64(seed);
    let start_box = Rect::from_center(FOREST_START, MAZE_PLAYER_SIZE);
    let mut walls = maze_boundary();
    for (w, h) in [(3, 15), (15, 3)] {
        for _ in 0..40 {
            let (x, y) = (rng.random_range(5..=70), rng.random_range(5..=70));
            let wall = cell(x, y, w, h);
            if !wall.rect.overlaps(&start_box) {
                walls.push(wall);
            }
        }
    }
    walls.push(cell(40, 35, 5, 40));
    maze_level(
        "Forest Maze",
        walls,
        Spawn::At(FOREST_START),
        cell_rect(70, 5, 5, 5),
    )
}

/// Walled room with a cat inside and a door in the lower-left corner
pub fn door_room() -> LevelDef {
    let walls = [
        Rect::new(200.0, 100.0, 20.0, 800.0),
        Rect::new(200.0, 100.0, 1600.0, 20.0),
        Rect::new(1800.0, 100.0, 20.0, 800.0),
        Rect::new(200.0, 900.0, 1600.0, 20.0),
        Rect::new(500.0, 300.0, 20.0, 400.0),
        Rect::new(800.0, 100.0, 20.0, 400.0),
        Rect::new(1100.0, 300.0, 20.0, 400.0),
        Rect::new(1400.0, 100.0, 20.0, 400.0),
        Rect::new(300.0, 500.0, 400.0, 20.0),
        Rect::new(900.0, 500.0, 400.0, 20.0),
        Rect::new(1300.0, 500.0, 400.0, 20.0),
    ];
    let mut obstacles: Vec<Obstacle> = walls.into_iter().map(Obstacle::wall).collect();
    obstacles.push(Obstacle::door(
        Rect::new(100.0, 900.0, 100.0, 20.0),
        DoorState::Closed,
    ));

    LevelDef {
        name: "Door Room".to_string(),
        obstacles,
        start: Spawn::At(Vec2::new(100.0, 100.0)),
        exit: ExitGate::Door,
        time_budget: None,
        enemies: vec![Spawn::Random(Rect::new(100.0, 100.0, 200.0, 200.0))],
        player_speed: Some(3.0),
        enemy_speed: Some(2.5),
        player_size: None,
        enemy_size: None,
        vision: Some(VisionParams {
            half_angle: 60.0,
            range: 400.0,
            peripheral_radius: 50.0,
            occlusion: true,
        }),
        fog_radius: None,
    }
}

/// All built-in levels in play order
pub fn builtin_levels(seed: u64) -> Vec<LevelDef> {
    vec![
        spiral_maze(),
        grid_labyrinth(),
        forest_maze(seed),
        door_room(),
    ]
}
