//! Movement and collision resolution
//!
//! A displacement is accepted whole or not at all by default. Axis sliding is
//! available as an opt-in mode.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::obstacle::ObstacleSet;
use super::state::Actor;
use crate::direction_from_degrees;

/// Held movement keys for one tick, relative to the actor's facing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub sprint: bool,
}

impl MoveIntent {
    pub fn forward() -> Self {
        Self {
            forward: true,
            ..Default::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.strafe_left || self.strafe_right)
    }

    /// Displacement for this tick: each held direction adds a step of
    /// `speed` along `angle` offset by 0, 180, -90 or +90 degrees
    pub fn displacement(&self, angle: f32, speed: f32) -> Vec2 {
        [
            (self.forward, 0.0),
            (self.backward, 180.0),
            (self.strafe_left, -90.0),
            (self.strafe_right, 90.0),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .map(|(_, offset)| direction_from_degrees(angle + offset) * speed)
        .sum()
    }
}

/// How a blocked displacement is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionMode {
    /// Any overlap rejects the whole displacement
    #[default]
    AllOrNothing,
    /// Fall back to the x component, then the y component
    AxisSlide,
}

/// What happened to a requested displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing to do
    Idle,
    /// Full displacement accepted
    Moved,
    /// Only one axis accepted (slide mode)
    Slid,
    /// Rejected; position unchanged
    Blocked,
}

/// Apply `displacement` to `actor` unless the moved box would overlap a
/// blocking obstacle
pub fn resolve_move(
    actor: &mut Actor,
    displacement: Vec2,
    obstacles: &ObstacleSet,
    mode: CollisionMode,
) -> MoveOutcome {
    if displacement == Vec2::ZERO {
        return MoveOutcome::Idle;
    }

    let fits = |pos: Vec2| !obstacles.collides(&actor.bounding_box_at(pos));

    let candidate = actor.pos + displacement;
    if fits(candidate) {
        actor.pos = candidate;
        return MoveOutcome::Moved;
    }

    if mode == CollisionMode::AxisSlide {
        for axis in [Vec2::new(displacement.x, 0.0), Vec2::new(0.0, displacement.y)] {
            if axis == Vec2::ZERO {
                continue;
            }
            let candidate = actor.pos + axis;
            if fits(candidate) {
                actor.pos = candidate;
                return MoveOutcome::Slid;
            }
        }
    }

    MoveOutcome::Blocked
}

/// Step forward along the current facing at the actor's speed
pub fn move_forward(actor: &mut Actor, obstacles: &ObstacleSet, mode: CollisionMode) -> MoveOutcome {
    let step = direction_from_degrees(actor.angle) * actor.speed;
    resolve_move(actor, step, obstacles, mode)
}

/// Sprint tuning (speeds per tick, times in seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprintParams {
    pub speed: f32,
    pub duration: f32,
    pub cooldown: f32,
}

/// Sprint burst/cooldown bookkeeping for the player
///
/// Holding sprint starts a burst of at most `duration` seconds. The burst ends
/// when it runs out or the key is released, and a cooldown follows during
/// which sprinting is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintState {
    pub active: bool,
    pub burst_left: f32,
    pub cooldown_left: f32,
}

impl SprintState {
    /// Advance by `dt` and report whether this tick moves at sprint speed
    pub fn update(&mut self, held: bool, dt: f32, params: &SprintParams) -> bool {
        if self.cooldown_left > 0.0 {
            self.cooldown_left = (self.cooldown_left - dt).max(0.0);
            return false;
        }

        if !held {
            if self.active {
                self.end_burst(params);
            }
            return false;
        }

        if !self.active {
            self.active = true;
            self.burst_left = params.duration;
        }
        self.burst_left -= dt;
        if self.burst_left <= 0.0 {
            self.end_burst(params);
        }
        true
    }

    fn end_burst(&mut self, params: &SprintParams) {
        self.active = false;
        self.burst_left = 0.0;
        self.cooldown_left = params.cooldown;
    }

    pub fn available(&self) -> bool {
        self.cooldown_left <= 0.0
    }
}
