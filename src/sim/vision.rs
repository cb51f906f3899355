//! Vision cones, line of sight and fog
//!
//! A cone is derived fresh every tick from an actor's position and facing.
//! Nothing here is stored between ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{ClipPolicy, clip_ray_with, segment_rect_intersect};
use super::obstacle::ObstacleSet;
use crate::consts::*;
use crate::{direction_from_degrees, heading_degrees, normalize_degrees};

/// Vision tuning for a viewer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionParams {
    /// Half of the cone's opening angle (degrees)
    pub half_angle: f32,
    /// Maximum sight distance
    pub range: f32,
    /// Radius of the unobstructed near-awareness circle (0 disables it)
    #[serde(default)]
    pub peripheral_radius: f32,
    /// Whether obstacles hide targets inside the cone
    #[serde(default = "default_occlusion")]
    pub occlusion: bool,
}

fn default_occlusion() -> bool {
    true
}

impl Default for VisionParams {
    fn default() -> Self {
        Self {
            half_angle: VISION_HALF_ANGLE,
            range: VISION_RANGE,
            peripheral_radius: PERIPHERAL_RADIUS,
            occlusion: true,
        }
    }
}

/// The clipped visible region of one viewer for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionCone {
    pub origin: Vec2,
    /// End of the left edge ray (facing - half angle), after clipping
    pub left: Vec2,
    /// End of the right edge ray (facing + half angle), after clipping
    pub right: Vec2,
    pub peripheral_radius: f32,
}

impl VisionCone {
    /// Build the cone for a viewer at `origin` facing `angle` degrees
    pub fn compute(
        origin: Vec2,
        angle: f32,
        params: &VisionParams,
        obstacles: &ObstacleSet,
        policy: ClipPolicy,
    ) -> Self {
        let edge = |offset: f32| {
            let far = origin + direction_from_degrees(angle + offset) * params.range;
            clip_ray_with(origin, far, obstacles.blockers(), policy)
        };

        Self {
            origin,
            left: edge(-params.half_angle),
            right: edge(params.half_angle),
            peripheral_radius: params.peripheral_radius,
        }
    }

    /// Point inside the clipped triangle or the peripheral circle
    pub fn contains_point(&self, p: Vec2) -> bool {
        if self.peripheral_radius > 0.0 && p.distance(self.origin) <= self.peripheral_radius {
            return true;
        }
        point_in_triangle(p, self.origin, self.left, self.right)
    }
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (p - b).perp_dot(a - b);
    let d2 = (p - c).perp_dot(b - c);
    let d3 = (p - a).perp_dot(c - a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// True if `point` lies within range and inside the cone's angular span,
/// ignoring obstacles. The cone edge is inclusive.
pub fn in_cone(viewer: Vec2, angle: f32, point: Vec2, params: &VisionParams) -> bool {
    if viewer.distance(point) > params.range {
        return false;
    }
    let diff = normalize_degrees(heading_degrees(viewer, point) - angle);
    let half = params.half_angle + CONE_EDGE_TOLERANCE;
    diff <= half || diff >= 360.0 - half
}

/// True if no blocking obstacle crosses the segment `from -> to`
pub fn line_of_sight(from: Vec2, to: Vec2, obstacles: &ObstacleSet) -> bool {
    !obstacles
        .blockers()
        .any(|rect| segment_rect_intersect(from, to, rect).is_some())
}

/// Whether a viewer at `viewer` facing `angle` can see `point`
pub fn is_point_visible(
    viewer: Vec2,
    angle: f32,
    point: Vec2,
    params: &VisionParams,
    obstacles: &ObstacleSet,
) -> bool {
    in_cone(viewer, angle, point, params)
        && (!params.occlusion || line_of_sight(viewer, point, obstacles))
}

/// Indices of obstacles whose center sits inside the viewer's cone
///
/// No occlusion test: a wall hidden behind another wall still counts, which
/// is what the outline reveal draws.
pub fn visible_obstacles(
    viewer: Vec2,
    angle: f32,
    params: &VisionParams,
    obstacles: &ObstacleSet,
) -> Vec<usize> {
    obstacles
        .iter()
        .enumerate()
        .filter(|(_, o)| in_cone(viewer, angle, o.rect.center(), params))
        .map(|(i, _)| i)
        .collect()
}

/// Fog overlay description: opaque everywhere except a disk around the viewer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogMask {
    pub center: Vec2,
    pub radius: f32,
    /// Opacity of the fogged area (0-255)
    pub alpha: u8,
}

impl FogMask {
    /// Fog around `center`. The clear radius defaults to the vision range.
    pub fn around(center: Vec2, params: &VisionParams, radius_override: Option<f32>) -> Self {
        Self {
            center,
            radius: radius_override.unwrap_or(params.range),
            alpha: FOG_ALPHA,
        }
    }

    pub fn is_clear(&self, p: Vec2) -> bool {
        p.distance(self.center) <= self.radius
    }
}
