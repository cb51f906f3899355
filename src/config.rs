//! Simulation tuning
//!
//! Global knobs, overridable per level. Loaded from JSON by the surrounding
//! program or built in code; partial JSON falls back to the defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SimError;
use crate::sim::geometry::ClipPolicy;
use crate::sim::movement::{CollisionMode, SprintParams};
use crate::sim::vision::VisionParams;

/// Global simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Movement ===
    /// Player speed (units per tick)
    pub player_speed: f32,
    /// Sprint burst tuning
    pub sprint: SprintParams,
    /// Enemy speed (units per tick)
    pub enemy_speed: f32,
    /// Default actor collision box (full width/height)
    pub actor_size: Vec2,
    /// How blocked displacements resolve
    pub collision: CollisionMode,

    // === Vision ===
    pub vision: VisionParams,
    /// Edge hit selection when clipping cone rays
    pub clip_policy: ClipPolicy,

    // === AI ===
    /// Wander facing jitter per tick (+/- degrees)
    pub wander_jitter: f32,
    /// Tries for a random open spawn before falling back to the region center
    pub spawn_attempts: u32,
    /// End the run when an enemy box touches the player box
    pub enemy_contact_loses: bool,

    // === Timing ===
    /// Ticks per second
    pub frame_rate: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            sprint: SprintParams {
                speed: SPRINT_SPEED,
                duration: SPRINT_DURATION,
                cooldown: SPRINT_COOLDOWN,
            },
            enemy_speed: ENEMY_SPEED,
            actor_size: Vec2::new(ACTOR_WIDTH, ACTOR_HEIGHT),
            collision: CollisionMode::AllOrNothing,

            vision: VisionParams::default(),
            clip_policy: ClipPolicy::FirstEdge,

            wander_jitter: WANDER_JITTER,
            spawn_attempts: SPAWN_ATTEMPTS,
            enemy_contact_loses: true,

            frame_rate: FRAME_RATE,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Seconds per tick at the configured frame rate
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.frame_rate
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |field, reason| Err(SimError::InvalidConfig { field, reason });

        // JSON literals past f32::MAX parse as infinity
        let knobs = [
            ("player_speed", self.player_speed),
            ("enemy_speed", self.enemy_speed),
            ("sprint.speed", self.sprint.speed),
            ("sprint.duration", self.sprint.duration),
            ("sprint.cooldown", self.sprint.cooldown),
            ("actor_size", self.actor_size.x),
            ("actor_size", self.actor_size.y),
            ("wander_jitter", self.wander_jitter),
            ("frame_rate", self.frame_rate),
        ];
        if let Some(&(field, _)) = knobs.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(field, "must be finite");
        }

        if !(self.player_speed > 0.0) {
            return invalid("player_speed", "must be positive");
        }
        if !(self.enemy_speed >= 0.0) {
            return invalid("enemy_speed", "must not be negative");
        }
        if !(self.sprint.speed > 0.0) {
            return invalid("sprint.speed", "must be positive");
        }
        if !(self.sprint.duration >= 0.0) || !(self.sprint.cooldown >= 0.0) {
            return invalid("sprint", "times must not be negative");
        }
        if !(self.actor_size.x > 0.0 && self.actor_size.y > 0.0) {
            return invalid("actor_size", "must be positive");
        }
        validate_vision(&self.vision)?;
        if !(0.0..=360.0).contains(&self.wander_jitter) {
            return invalid("wander_jitter", "must be in [0, 360]");
        }
        if !(self.frame_rate > 0.0) {
            return invalid("frame_rate", "must be positive");
        }
        Ok(())
    }
}

/// Shared by the global config and per-level vision overrides
pub fn validate_vision(vision: &VisionParams) -> Result<(), SimError> {
    if !(vision.half_angle > 0.0 && vision.half_angle <= 180.0) {
        return Err(SimError::InvalidConfig {
            field: "vision.half_angle",
            reason: "must be in (0, 180]",
        });
    }
    if !(vision.range >= 0.0 && vision.range.is_finite()) {
        return Err(SimError::InvalidConfig {
            field: "vision.range",
            reason: "must be finite and not negative",
        });
    }
    if !(vision.peripheral_radius >= 0.0 && vision.peripheral_radius.is_finite()) {
        return Err(SimError::InvalidConfig {
            field: "vision.peripheral_radius",
            reason: "must be finite and not negative",
        });
    }
    Ok(())
}
