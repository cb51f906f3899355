//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (owned by the session)
//! - Stable update order (player, door, enemies in list order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod geometry;
pub mod level;
pub mod movement;
pub mod obstacle;
pub mod state;
pub mod tick;
pub mod vision;

pub use ai::{AiState, Pursuer, PursuerParams};
pub use geometry::{
    ClipPolicy, Rect, clip_ray_to_obstacles, clip_ray_with, segment_intersect,
    segment_rect_intersect, segment_rect_intersect_with,
};
pub use level::{
    ExitGate, LevelDef, Spawn, builtin_levels, door_room, find_open_position, forest_maze,
    grid_labyrinth, levels_from_json, spiral_maze,
};
pub use movement::{
    CollisionMode, MoveIntent, MoveOutcome, SprintParams, SprintState, move_forward, resolve_move,
};
pub use obstacle::{DoorState, Obstacle, ObstacleKind, ObstacleSet};
pub use state::{Actor, LevelState, LevelTimer, Player, SessionPhase};
pub use tick::{EnemyView, FixedStep, Session, TickInput, TickResult};
pub use vision::{
    FogMask, VisionCone, VisionParams, in_cone, is_point_visible, line_of_sight,
    visible_obstacles,
};
