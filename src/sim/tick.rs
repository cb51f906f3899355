//! Fixed timestep session controller
//!
//! Advances the current level one tick at a time in a fixed order:
//! player movement, door clicks, enemies (in list order), then exit, catch
//! and timeout checks.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::{AiState, PursuerParams};
use super::level::{LevelDef, builtin_levels};
use super::movement::{MoveIntent, resolve_move};
use super::obstacle::DoorState;
use super::state::{LevelState, SessionPhase};
use super::vision::{FogMask, VisionCone, visible_obstacles};
use crate::config::SimConfig;
use crate::consts::MAX_SUBSTEPS;
use crate::error::SimError;

/// Input sampled by the boundary layer for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Held movement keys
    pub move_intent: MoveIntent,
    /// Pointer position the player turns toward
    pub facing_target: Option<Vec2>,
    /// Click this tick (may toggle the door)
    pub pointer_click: Option<Vec2>,
}

/// What a renderer needs to know about one enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub pos: Vec2,
    pub angle: f32,
    pub state: AiState,
    pub last_known_target: Option<Vec2>,
    pub cone: VisionCone,
}

/// Snapshot returned after each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub player_pos: Vec2,
    pub player_angle: f32,
    pub player_sprinting: bool,
    /// Sprint is off cooldown
    pub sprint_ready: bool,
    pub enemies: Vec<EnemyView>,
    /// Indices into the current level's obstacles
    pub visible_obstacles: Vec<usize>,
    pub door_state: Option<DoorState>,
    /// The exit was reached this tick (the level has already advanced)
    pub exit_reached: bool,
    pub phase: SessionPhase,
    pub level_index: usize,
    /// Seconds left on the level timer, `None` when untimed
    pub time_left: Option<f32>,
    /// Whole seconds for a HUD countdown
    pub seconds_left: Option<i64>,
    /// Ticks simulated on the current level
    pub level_ticks: u64,
    pub player_cone: VisionCone,
    pub fog: FogMask,
}

/// A play session over an ordered list of levels
#[derive(Debug, Clone)]
pub struct Session {
    config: SimConfig,
    levels: Vec<LevelDef>,
    /// Run seed for reproducibility
    seed: u64,
    rng: Pcg32,
    level: LevelState,
    phase: SessionPhase,
    /// Whether the player moved at sprint speed on the last tick
    sprinting: bool,
}

impl Session {
    /// Create a session and load the first level
    pub fn new(config: SimConfig, levels: Vec<LevelDef>, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let first = levels.first().ok_or(SimError::NoLevels)?;
        for level in &levels {
            level.validate()?;
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let level = first.instantiate(0, &config, &mut rng)?;
        log::info!("Session seed {} starting on level 0 ({})", seed, level.name);

        Ok(Self {
            config,
            levels,
            seed,
            rng,
            level,
            phase: SessionPhase::Playing,
            sprinting: false,
        })
    }

    /// Session over the built-in levels
    pub fn with_builtin_levels(config: SimConfig, seed: u64) -> Result<Self, SimError> {
        Self::new(config, builtin_levels(seed), seed)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn level(&self) -> &LevelState {
        &self.level
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Replace the current level with a fresh copy of level `index`
    ///
    /// Resets obstacles, actors and the timer, and resumes play.
    pub fn load_level(&mut self, index: usize) -> Result<&LevelState, SimError> {
        let def = self.levels.get(index).ok_or(SimError::LevelOutOfRange {
            index,
            count: self.levels.len(),
        })?;
        self.level = def.instantiate(index, &self.config, &mut self.rng)?;
        self.phase = SessionPhase::Playing;
        self.sprinting = false;
        log::info!(
            "Loaded level {} ({}, {} obstacles, {} enemies)",
            index,
            self.level.name,
            self.level.obstacles.len(),
            self.level.enemies.len()
        );
        Ok(&self.level)
    }

    /// Toggle the door if `click` lands inside it
    pub fn toggle_door(&mut self, click: Vec2) -> bool {
        self.level.obstacles.toggle_door_at(click)
    }

    /// Advance the simulation by one tick of `dt` seconds
    pub fn advance_tick(&mut self, input: &TickInput, dt: f32) -> TickResult {
        if self.phase.is_over() {
            return self.result(false);
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.level.time_ticks += 1;
        self.update_player(input, dt);

        if let Some(click) = input.pointer_click {
            self.toggle_door(click);
        }

        self.update_enemies();
        self.level.timer.advance(dt);

        let exit_reached = self.level.exit_reached();
        if exit_reached {
            self.advance_level();
        } else if self.config.enemy_contact_loses && self.level.player_caught() {
            log::warn!("Caught on level {}", self.level.index);
            self.phase = SessionPhase::Caught;
        } else if self.level.timer.expired() {
            log::warn!("Time's up on level {}", self.level.index);
            self.phase = SessionPhase::TimedOut;
        }

        self.result(exit_reached)
    }

    fn update_player(&mut self, input: &TickInput, dt: f32) {
        let player = &mut self.level.player;

        // Facing follows the pointer whether or not the move succeeds
        if let Some(target) = input.facing_target {
            player.actor.face_toward(target);
        }

        let intent = input.move_intent;
        let wants_sprint = intent.sprint && !intent.is_idle();
        self.sprinting = player.sprint.update(wants_sprint, dt, &self.config.sprint);
        let speed = if self.sprinting {
            self.config.sprint.speed.max(player.actor.speed)
        } else {
            player.actor.speed
        };

        let displacement = intent.displacement(player.actor.angle, speed);
        resolve_move(
            &mut player.actor,
            displacement,
            &self.level.obstacles,
            self.config.collision,
        );
    }

    fn update_enemies(&mut self) {
        let params = PursuerParams {
            vision: self.level.vision,
            wander_jitter: self.config.wander_jitter,
            collision: self.config.collision,
        };
        let target = self.level.player.actor.pos;
        let LevelState {
            obstacles, enemies, ..
        } = &mut self.level;

        for enemy in enemies.iter_mut() {
            enemy.update(target, obstacles, &params, &mut self.rng);
        }
    }

    fn advance_level(&mut self) {
        let next = self.level.index + 1;
        if next >= self.levels.len() {
            log::info!("Escaped all {} levels", self.levels.len());
            self.phase = SessionPhase::Escaped;
            return;
        }
        if let Err(err) = self.load_level(next) {
            log::error!("Failed to load level {}: {}", next, err);
        }
    }

    /// Snapshot of the current level without advancing
    pub fn snapshot(&self) -> TickResult {
        self.result(false)
    }

    fn result(&self, exit_reached: bool) -> TickResult {
        let level = &self.level;
        let player = &level.player.actor;
        let policy = self.config.clip_policy;

        let enemies = level
            .enemies
            .iter()
            .map(|e| EnemyView {
                pos: e.actor.pos,
                angle: e.actor.angle,
                state: e.state,
                last_known_target: e.last_known_target,
                cone: VisionCone::compute(
                    e.actor.pos,
                    e.actor.angle,
                    &level.vision,
                    &level.obstacles,
                    policy,
                ),
            })
            .collect();

        TickResult {
            player_pos: player.pos,
            player_angle: player.angle,
            player_sprinting: self.sprinting,
            sprint_ready: level.player.sprint.available(),
            enemies,
            visible_obstacles: visible_obstacles(
                player.pos,
                player.angle,
                &level.vision,
                &level.obstacles,
            ),
            door_state: level.obstacles.door_state(),
            exit_reached,
            phase: self.phase,
            level_index: level.index,
            time_left: level.timer.remaining(),
            seconds_left: level.timer.whole_seconds_left(),
            level_ticks: level.time_ticks,
            player_cone: VisionCone::compute(
                player.pos,
                player.angle,
                &level.vision,
                &level.obstacles,
                policy,
            ),
            fog: FogMask::around(player.pos, &level.vision, level.fog_radius),
        }
    }
}

/// Frame-time accumulator that turns variable frame deltas into fixed ticks
#[derive(Debug, Clone)]
pub struct FixedStep {
    dt: f32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Add a frame's elapsed time and return how many ticks to run
    pub fn push(&mut self, frame_time: f32) -> u32 {
        // Clamp long stalls (tab switch, debugger) so we never spiral.
        // A NaN would poison the accumulator for good.
        if frame_time.is_finite() {
            self.accumulator += frame_time.clamp(0.0, 0.1);
        }

        let mut ticks = 0;
        while self.accumulator >= self.dt && ticks < MAX_SUBSTEPS {
            self.accumulator -= self.dt;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::geometry::Rect;
    use crate::sim::level::{ExitGate, Spawn, door_room};
    use crate::sim::obstacle::Obstacle;

    fn corridor(time_budget: Option<f32>) -> LevelDef {
        LevelDef {
            name: "Corridor".to_string(),
            obstacles: vec![
                Obstacle::wall(Rect::new(0.0, 0.0, 400.0, 10.0)),
                Obstacle::wall(Rect::new(0.0, 60.0, 400.0, 10.0)),
            ],
            start: Spawn::At(Vec2::new(20.0, 35.0)),
            exit: ExitGate::Region(Rect::new(380.0, 10.0, 20.0, 50.0)),
            time_budget,
            enemies: Vec::new(),
            player_speed: None,
            enemy_speed: None,
            player_size: None,
            enemy_size: None,
            vision: None,
            fog_radius: None,
        }
    }

    fn walk_right() -> TickInput {
        TickInput {
            move_intent: MoveIntent::forward(),
            facing_target: Some(Vec2::new(10_000.0, 35.0)),
            pointer_click: None,
        }
    }

    #[test]
    fn test_new_requires_levels() {
        let err = Session::new(SimConfig::default(), Vec::new(), 1).unwrap_err();
        assert!(matches!(err, SimError::NoLevels));
    }

    #[test]
    fn test_new_rejects_non_finite_setup() {
        let config = SimConfig {
            wander_jitter: f32::INFINITY,
            ..SimConfig::default()
        };
        let err = Session::new(config, vec![corridor(None)], 1).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig { field: "wander_jitter", .. }));

        let mut def = corridor(None);
        def.enemies = vec![Spawn::Random(Rect::new(0.0, 0.0, f32::INFINITY, 50.0))];
        let err = Session::new(SimConfig::default(), vec![def], 1).unwrap_err();
        assert!(matches!(err, SimError::InvalidLevel { .. }));
    }

    #[test]
    fn test_load_level_out_of_range() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(None)], 1).unwrap();
        let err = session.load_level(5).unwrap_err();
        assert!(matches!(err, SimError::LevelOutOfRange { index: 5, count: 1 }));
    }

    #[test]
    fn test_player_walks_and_faces_pointer() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(None)], 1).unwrap();
        let result = session.advance_tick(&walk_right(), SIM_DT);
        assert!((result.player_pos - Vec2::new(23.0, 35.0)).length() < 1e-4);
        assert!(result.player_angle.abs() < 1e-3);
        assert_eq!(result.phase, SessionPhase::Playing);
        assert!(!result.exit_reached);
    }

    #[test]
    fn test_facing_updates_even_when_blocked() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(None)], 1).unwrap();
        // Face straight up into the wall and push forward
        let input = TickInput {
            move_intent: MoveIntent::forward(),
            facing_target: Some(Vec2::new(20.0, -100.0)),
            pointer_click: None,
        };
        let mut last = session.snapshot().player_pos;
        for _ in 0..20 {
            let result = session.advance_tick(&input, SIM_DT);
            assert!((result.player_angle + 90.0).abs() < 1e-3);
            assert!(!session.level().obstacles.collides(&session.level().player.actor.bounding_box()));
            last = result.player_pos;
        }
        // Box top edge stops short of the wall bottom (y = 10)
        assert!(last.y - 5.0 >= 10.0);
    }

    #[test]
    fn test_exit_on_last_level_escapes() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(None)], 1).unwrap();
        let mut result = session.snapshot();
        for _ in 0..200 {
            result = session.advance_tick(&walk_right(), SIM_DT);
            if result.exit_reached {
                break;
            }
        }
        assert!(result.exit_reached);
        assert_eq!(result.phase, SessionPhase::Escaped);

        // Finished sessions stop advancing
        let after = session.advance_tick(&walk_right(), SIM_DT);
        assert_eq!(after.player_pos, result.player_pos);
    }

    #[test]
    fn test_exit_advances_to_next_level() {
        let levels = vec![corridor(None), corridor(Some(30.0))];
        let mut session = Session::new(SimConfig::default(), levels, 1).unwrap();
        let mut result = session.snapshot();
        for _ in 0..200 {
            result = session.advance_tick(&walk_right(), SIM_DT);
            if result.exit_reached {
                break;
            }
        }
        assert!(result.exit_reached);
        assert_eq!(result.level_index, 1);
        assert_eq!(result.phase, SessionPhase::Playing);
        assert_eq!(result.player_pos, Vec2::new(20.0, 35.0));
        assert_eq!(result.time_left, Some(30.0));
    }

    #[test]
    fn test_timer_expiry_times_out() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(Some(1.0))], 1).unwrap();
        let idle = TickInput::default();
        let first = session.advance_tick(&idle, 0.5);
        assert_eq!(first.phase, SessionPhase::Playing);
        assert_eq!(first.time_left, Some(0.5));
        let second = session.advance_tick(&idle, 0.5);
        assert_eq!(second.phase, SessionPhase::TimedOut);

        // Reloading resets the timer and resumes play
        let level = session.load_level(0).expect("level exists");
        assert_eq!(level.timer.remaining(), Some(1.0));
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_door_gate() {
        let mut def = door_room();
        def.enemies.clear();
        let mut session = Session::new(SimConfig::default(), vec![def], 1).unwrap();

        // Stand the player on the door's rectangle while it is closed
        session.level.player.actor.pos = Vec2::new(150.0, 910.0);
        let result = session.advance_tick(&TickInput::default(), SIM_DT);
        assert!(!result.exit_reached);
        assert_eq!(result.door_state, Some(DoorState::Closed));

        // Clicking the door opens it; the overlap now completes the level
        let click = TickInput {
            pointer_click: Some(Vec2::new(120.0, 905.0)),
            ..Default::default()
        };
        let result = session.advance_tick(&click, SIM_DT);
        assert!(result.exit_reached);
        assert_eq!(result.phase, SessionPhase::Escaped);
    }

    #[test]
    fn test_toggle_door_outside_is_noop() {
        let mut session = Session::new(SimConfig::default(), vec![door_room()], 1).unwrap();
        assert!(!session.toggle_door(Vec2::new(5.0, 5.0)));
        assert_eq!(session.snapshot().door_state, Some(DoorState::Closed));
        assert!(session.toggle_door(Vec2::new(150.0, 910.0)));
        assert_eq!(session.snapshot().door_state, Some(DoorState::Open));
    }

    #[test]
    fn test_enemy_contact_catches_player() {
        let mut def = corridor(None);
        def.enemies = vec![Spawn::At(Vec2::new(60.0, 35.0))];
        let mut session = Session::new(SimConfig::default(), vec![def.clone()], 1).unwrap();
        // Cat faces +x at spawn; turn it around so it sees the mouse
        session.level.enemies[0].actor.angle = 180.0;

        let mut phase = SessionPhase::Playing;
        for _ in 0..40 {
            phase = session.advance_tick(&TickInput::default(), SIM_DT).phase;
            if phase.is_over() {
                break;
            }
        }
        assert_eq!(phase, SessionPhase::Caught);

        let config = SimConfig {
            enemy_contact_loses: false,
            ..SimConfig::default()
        };
        let mut session = Session::new(config, vec![def], 1).unwrap();
        session.level.enemies[0].actor.angle = 180.0;
        for _ in 0..40 {
            let result = session.advance_tick(&TickInput::default(), SIM_DT);
            assert_eq!(result.phase, SessionPhase::Playing);
        }
    }

    #[test]
    fn test_result_reports_ticks_and_countdown() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(Some(3.0))], 1).unwrap();
        let start = session.snapshot();
        assert_eq!(start.level_ticks, 0);
        assert_eq!(start.seconds_left, Some(3));
        assert!(start.sprint_ready);

        let idle = TickInput::default();
        let mut result = start;
        for _ in 0..3 {
            result = session.advance_tick(&idle, 0.4);
        }
        assert_eq!(result.level_ticks, 3);
        assert_eq!(result.seconds_left, Some(2));

        // A bad dt is ignored rather than corrupting the timer
        let result = session.advance_tick(&idle, f32::NAN);
        assert_eq!(result.level_ticks, 4);
        assert_eq!(result.seconds_left, Some(2));

        session.load_level(0).expect("level exists");
        assert_eq!(session.snapshot().level_ticks, 0);
    }

    #[test]
    fn test_sprint_cooldown_reported() {
        let config = SimConfig {
            sprint: crate::sim::movement::SprintParams {
                speed: 6.0,
                duration: 0.5,
                cooldown: 1.0,
            },
            ..SimConfig::default()
        };
        let mut session = Session::new(config, vec![corridor(None)], 1).unwrap();
        let input = TickInput {
            move_intent: MoveIntent {
                forward: true,
                sprint: true,
                ..Default::default()
            },
            ..walk_right()
        };
        assert!(session.advance_tick(&input, 0.25).sprint_ready);
        // Burst runs out on this tick and the cooldown begins
        let result = session.advance_tick(&input, 0.25);
        assert!(result.player_sprinting);
        assert!(!result.sprint_ready);
        let result = session.advance_tick(&input, 0.25);
        assert!(!result.player_sprinting);
    }

    #[test]
    fn test_sprint_speeds_up_player() {
        let mut session = Session::new(SimConfig::default(), vec![corridor(None)], 1).unwrap();
        let input = TickInput {
            move_intent: MoveIntent {
                forward: true,
                sprint: true,
                ..Default::default()
            },
            ..walk_right()
        };
        let result = session.advance_tick(&input, SIM_DT);
        assert!(result.player_sprinting);
        assert!((result.player_pos.x - 26.0).abs() < 1e-4);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut session = Session::with_builtin_levels(SimConfig::default(), seed).unwrap();
            session.load_level(3).expect("door room");
            (0..120)
                .map(|i| {
                    let input = TickInput {
                        move_intent: MoveIntent {
                            forward: i % 3 != 0,
                            ..Default::default()
                        },
                        facing_target: Some(Vec2::new(150.0, 400.0)),
                        pointer_click: None,
                    };
                    let r = session.advance_tick(&input, SIM_DT);
                    (r.player_pos, r.enemies.iter().map(|e| (e.pos, e.state)).collect::<Vec<_>>())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_session_from_json_levels() {
        let json = r#"[
            {
                "name": "Hall",
                "obstacles": [
                    { "rect": { "x": 0.0, "y": 0.0, "width": 300.0, "height": 10.0 } },
                    { "rect": { "x": 0.0, "y": 90.0, "width": 10.0, "height": 20.0 },
                      "kind": { "Door": "Closed" } }
                ],
                "start": { "At": [50.0, 50.0] },
                "exit": "Door",
                "time_budget": 10.0
            }
        ]"#;
        let levels = crate::sim::level::levels_from_json(json).expect("valid levels");
        let mut session = Session::new(SimConfig::default(), levels, 9).unwrap();
        let result = session.snapshot();
        assert_eq!(result.player_pos, Vec2::new(50.0, 50.0));
        assert_eq!(result.door_state, Some(DoorState::Closed));
        assert_eq!(result.time_left, Some(10.0));
        assert!(result.enemies.is_empty());
        assert!(session.toggle_door(Vec2::new(5.0, 100.0)));
    }

    #[test]
    fn test_fixed_step_accumulates() {
        let mut step = FixedStep::new(0.25);
        assert_eq!(step.push(0.1), 0);
        assert_eq!(step.push(0.1), 0);
        assert_eq!(step.push(0.1), 1);
        // Long stalls are clamped
        assert_eq!(step.push(10.0), 0);

        // Garbage frame times count as zero and do not stall later frames
        let mut step = FixedStep::new(0.25);
        assert_eq!(step.push(f32::NAN), 0);
        assert_eq!(step.push(f32::INFINITY), 0);
        assert_eq!(step.push(-1.0), 0);
        assert_eq!(step.push(0.1), 0);
        assert_eq!(step.push(0.1), 0);
        assert_eq!(step.push(0.1), 1);
    }
}
