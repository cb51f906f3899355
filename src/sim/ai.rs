//! Pursuer AI: wander until the target is seen, then chase it
//!
//! Visibility is re-evaluated from scratch every tick. There is no memory
//! beyond the current tick, so a pursuer flickers between states when the
//! target sits on the edge of its cone.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::movement::{CollisionMode, MoveOutcome, move_forward};
use super::obstacle::ObstacleSet;
use super::state::Actor;
use super::vision::{VisionParams, is_point_visible};

/// Behaviour state of a pursuer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Wander,
    Chase,
}

/// Per-tick knobs shared by all pursuers on a level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuerParams {
    pub vision: VisionParams,
    /// Max facing change per wander tick (+/- degrees)
    pub wander_jitter: f32,
    pub collision: CollisionMode,
}

/// An enemy actor with its AI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pursuer {
    pub actor: Actor,
    pub state: AiState,
    /// Where the target was last seen. Only set while chasing.
    pub last_known_target: Option<Vec2>,
}

impl Pursuer {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            state: AiState::Wander,
            last_known_target: None,
        }
    }

    /// Look for the target, then act on what was seen
    pub fn update<R: Rng>(
        &mut self,
        target: Vec2,
        obstacles: &ObstacleSet,
        params: &PursuerParams,
        rng: &mut R,
    ) -> MoveOutcome {
        self.perceive(target, obstacles, &params.vision);
        match self.state {
            AiState::Chase => self.chase(obstacles, params.collision),
            AiState::Wander => self.wander(obstacles, params, rng),
        }
    }

    /// Update state and last-known target from a fresh visibility check
    pub fn perceive(&mut self, target: Vec2, obstacles: &ObstacleSet, vision: &VisionParams) {
        let seen = is_point_visible(self.actor.pos, self.actor.angle, target, vision, obstacles);
        let next = if seen { AiState::Chase } else { AiState::Wander };
        if next != self.state {
            log::debug!(
                "Pursuer at ({:.1}, {:.1}) {:?} -> {:?}",
                self.actor.pos.x,
                self.actor.pos.y,
                self.state,
                next
            );
        }
        self.state = next;
        self.last_known_target = seen.then_some(target);
    }

    fn chase(&mut self, obstacles: &ObstacleSet, collision: CollisionMode) -> MoveOutcome {
        let Some(target) = self.last_known_target else {
            return MoveOutcome::Idle;
        };
        // Already standing on the target: hold position and facing
        if target == self.actor.pos {
            return MoveOutcome::Idle;
        }
        self.actor.face_toward(target);
        move_forward(&mut self.actor, obstacles, collision)
    }

    fn wander<R: Rng>(
        &mut self,
        obstacles: &ObstacleSet,
        params: &PursuerParams,
        rng: &mut R,
    ) -> MoveOutcome {
        // The sampler needs a finite span. NaN also lands on 360 here.
        let jitter = params.wander_jitter.abs().min(360.0);
        if jitter > 0.0 {
            self.actor.angle += rng.random_range(-jitter..=jitter);
        }
        move_forward(&mut self.actor, obstacles, params.collision)
    }
}
