//! Session state and core simulation types
//!
//! Everything a tick reads or writes lives here, apart from the RNG which the
//! session owns.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::Pursuer;
use super::geometry::Rect;
use super::level::ExitGate;
use super::movement::SprintState;
use super::obstacle::ObstacleSet;
use super::vision::VisionParams;
use crate::heading_degrees;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Active gameplay on the current level
    Playing,
    /// Exit of the last level reached
    Escaped,
    /// Level timer ran out
    TimedOut,
    /// An enemy touched the player
    Caught,
}

impl SessionPhase {
    pub fn is_over(self) -> bool {
        self != SessionPhase::Playing
    }
}

/// Any moving entity: position, facing and an axis-aligned collision box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub pos: Vec2,
    /// Facing in degrees, 0 = +x
    pub angle: f32,
    /// Units per tick
    pub speed: f32,
    /// Full collision box width/height, centered on `pos`
    pub size: Vec2,
}

impl Actor {
    pub fn new(pos: Vec2, speed: f32, size: Vec2) -> Self {
        Self {
            pos,
            angle: 0.0,
            speed,
            size,
        }
    }

    /// Collision box at the current position
    pub fn bounding_box(&self) -> Rect {
        self.bounding_box_at(self.pos)
    }

    /// Collision box if the actor stood at `pos`
    pub fn bounding_box_at(&self, pos: Vec2) -> Rect {
        Rect::from_center(pos, self.size)
    }

    /// Turn to face `target`. A target on top of the actor gives facing 0.
    pub fn face_toward(&mut self, target: Vec2) {
        self.angle = heading_degrees(self.pos, target);
    }
}

/// The player-controlled mouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub actor: Actor,
    #[serde(default)]
    pub sprint: SprintState,
}

impl Player {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            sprint: SprintState::default(),
        }
    }
}

/// Countdown in seconds. `None` budget means the level is untimed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelTimer {
    pub budget: Option<f32>,
    pub elapsed: f32,
}

impl LevelTimer {
    pub fn new(budget: Option<f32>) -> Self {
        Self {
            budget,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Seconds remaining, never negative
    pub fn remaining(&self) -> Option<f32> {
        self.budget.map(|b| (b - self.elapsed).max(0.0))
    }

    /// Whole seconds left as shown on a HUD (elapsed time truncated)
    pub fn whole_seconds_left(&self) -> Option<i64> {
        self.budget
            .map(|b| b.floor() as i64 - self.elapsed.floor() as i64)
    }

    pub fn expired(&self) -> bool {
        self.budget.is_some_and(|b| self.elapsed >= b)
    }
}

/// The one current level: obstacles, actors, exit gate and timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    /// Index into the session's level list
    pub index: usize,
    pub name: String,
    pub obstacles: ObstacleSet,
    pub player: Player,
    /// Enemies in fixed update order
    pub enemies: Vec<Pursuer>,
    pub exit: ExitGate,
    pub timer: LevelTimer,
    /// Vision used by the player and every enemy on this level
    pub vision: VisionParams,
    /// Radius of the clear disk in the fog mask, when it differs from the
    /// vision range
    pub fog_radius: Option<f32>,
    /// Simulation tick counter since level start
    pub time_ticks: u64,
}

impl LevelState {
    /// True if the player's box satisfies this level's exit gate
    pub fn exit_reached(&self) -> bool {
        self.exit
            .is_satisfied(&self.player.actor.bounding_box(), &self.obstacles)
    }

    /// True if any enemy box overlaps the player's box
    pub fn player_caught(&self) -> bool {
        let player_box = self.player.actor.bounding_box();
        self.enemies
            .iter()
            .any(|e| e.actor.bounding_box().overlaps(&player_box))
    }
}
