//! Mouse Maze - simulation core for a top-down maze escape game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, vision, movement, AI, sessions)
//! - `config`: Data-driven tuning knobs
//! - `error`: Errors for the fallible setup paths
//!
//! Rendering and input sampling live outside this crate. A driver calls
//! [`sim::Session::advance_tick`] once per frame and draws what comes back.

pub mod config;
pub mod error;
pub mod sim;

pub use config::SimConfig;
pub use error::SimError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target frame rate (one tick per rendered frame)
    pub const FRAME_RATE: f32 = 60.0;
    /// Fixed simulation timestep at the default frame rate
    pub const SIM_DT: f32 = 1.0 / FRAME_RATE;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Actor defaults (units per tick)
    pub const PLAYER_SPEED: f32 = 3.0;
    pub const SPRINT_SPEED: f32 = 6.0;
    /// Sprint burst length and the cooldown after it (seconds)
    pub const SPRINT_DURATION: f32 = 5.0;
    pub const SPRINT_COOLDOWN: f32 = 5.0;
    pub const ENEMY_SPEED: f32 = 2.5;

    /// Actor collision box (full width/height)
    pub const ACTOR_WIDTH: f32 = 20.0;
    pub const ACTOR_HEIGHT: f32 = 10.0;

    /// Vision defaults (degrees / units)
    pub const VISION_HALF_ANGLE: f32 = 60.0;
    pub const VISION_RANGE: f32 = 400.0;
    pub const PERIPHERAL_RADIUS: f32 = 50.0;
    /// Fog opacity outside the visible disk (0-255)
    pub const FOG_ALPHA: u8 = 200;

    /// Wander jitter per tick (+/- degrees)
    pub const WANDER_JITTER: f32 = 10.0;

    /// Attempts for random open-position searches before falling back
    pub const SPAWN_ATTEMPTS: u32 = 100;

    /// Inclusive slack on the cone edge to absorb f32 round-off (degrees).
    /// atan2 error near the edge is around 1e-5.
    pub const CONE_EDGE_TOLERANCE: f32 = 1e-4;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Bearing from `from` to `to` in degrees (0 = +x). Coincident points give 0.
#[inline]
pub fn heading_degrees(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x).to_degrees()
}

/// Unit vector pointing along an angle given in degrees
#[inline]
pub fn direction_from_degrees(angle: f32) -> Vec2 {
    let rad = angle.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert!((normalize_degrees(725.0) - 5.0).abs() < 1e-4);
        assert!(normalize_degrees(-1e-9) < 360.0);
    }

    #[test]
    fn test_heading_coincident_points_is_zero() {
        let p = Vec2::new(12.0, -4.0);
        assert_eq!(heading_degrees(p, p), 0.0);
    }

    #[test]
    fn test_heading_and_direction_agree() {
        let from = Vec2::new(1.0, 1.0);
        let to = Vec2::new(1.0, 11.0);
        let heading = heading_degrees(from, to);
        assert!((heading - 90.0).abs() < 1e-4);
        let dir = direction_from_degrees(heading);
        assert!(dir.x.abs() < 1e-5);
        assert!((dir.y - 1.0).abs() < 1e-5);
    }
}
