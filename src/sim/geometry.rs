//! Geometry kernel: segments and axis-aligned rectangles
//!
//! Screen-style coordinates: +x right, +y down, so a rectangle's `top` is its
//! smallest y. Every query takes its obstacles explicitly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Corner, size and far edges are all finite
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.right(), self.bottom()]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Half-open containment: left/top edges are inside, right/bottom are not
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Strict overlap test. Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Multiply position and size by `factor` (maze layouts are authored small)
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Boundary edges in the fixed test order: top, right, bottom, left
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let tl = Vec2::new(self.left(), self.top());
        let tr = Vec2::new(self.right(), self.top());
        let br = Vec2::new(self.right(), self.bottom());
        let bl = Vec2::new(self.left(), self.bottom());
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }
}

/// How a segment picks among several edge hits on one rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClipPolicy {
    /// First hit in edge order top, right, bottom, left
    #[default]
    FirstEdge,
    /// Hit closest to the segment start
    Nearest,
}

/// Intersection point of segments `a1-a2` and `b1-b2`
///
/// Parallel and collinear segments never intersect, even when they overlap.
pub fn segment_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let denom = (a1.x - a2.x) * (b1.y - b2.y) - (a1.y - a2.y) * (b1.x - b2.x);
    if denom == 0.0 {
        return None;
    }

    let t = ((a1.x - b1.x) * (b1.y - b2.y) - (a1.y - b1.y) * (b1.x - b2.x)) / denom;
    let u = -((a1.x - a2.x) * (a1.y - b1.y) - (a1.y - a2.y) * (a1.x - b1.x)) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + t * (a2 - a1))
    } else {
        None
    }
}

/// First edge hit of segment `p1-p2` on `rect`, in edge order top, right,
/// bottom, left. Not necessarily the hit closest to `p1`.
pub fn segment_rect_intersect(p1: Vec2, p2: Vec2, rect: &Rect) -> Option<Vec2> {
    rect.edges()
        .into_iter()
        .find_map(|(e1, e2)| segment_intersect(p1, p2, e1, e2))
}

/// Edge hit of segment `p1-p2` on `rect`, chosen by `policy`
pub fn segment_rect_intersect_with(
    p1: Vec2,
    p2: Vec2,
    rect: &Rect,
    policy: ClipPolicy,
) -> Option<Vec2> {
    match policy {
        ClipPolicy::FirstEdge => segment_rect_intersect(p1, p2, rect),
        ClipPolicy::Nearest => rect
            .edges()
            .into_iter()
            .filter_map(|(e1, e2)| segment_intersect(p1, p2, e1, e2))
            .min_by(|a, b| {
                a.distance_squared(p1)
                    .partial_cmp(&b.distance_squared(p1))
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
    }
}

/// Shorten the ray `origin -> target` against each obstacle in order
///
/// Every obstacle that crosses the (already shortened) ray moves the target to
/// the hit point, so the result depends on obstacle order when several
/// obstacles lie along the ray.
pub fn clip_ray_to_obstacles<'a>(
    origin: Vec2,
    target: Vec2,
    obstacles: impl IntoIterator<Item = &'a Rect>,
) -> Vec2 {
    clip_ray_with(origin, target, obstacles, ClipPolicy::FirstEdge)
}

/// [`clip_ray_to_obstacles`] with an explicit per-rectangle clip policy
pub fn clip_ray_with<'a>(
    origin: Vec2,
    target: Vec2,
    obstacles: impl IntoIterator<Item = &'a Rect>,
    policy: ClipPolicy,
) -> Vec2 {
    obstacles.into_iter().fold(target, |end, rect| {
        segment_rect_intersect_with(origin, end, rect, policy).unwrap_or(end)
    })
}
