//! Obstacle set: static walls plus an optional toggle-able door
//!
//! A closed door blocks exactly like a wall. An open door blocks nothing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Door open/closed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoorState {
    #[default]
    Closed,
    Open,
}

impl DoorState {
    pub fn toggled(self) -> Self {
        match self {
            DoorState::Closed => DoorState::Open,
            DoorState::Open => DoorState::Closed,
        }
    }

    pub fn is_open(self) -> bool {
        self == DoorState::Open
    }
}

/// What kind of obstacle a rectangle is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    Wall,
    Door(DoorState),
}

/// An axis-aligned obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
    #[serde(default)]
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub const fn wall(rect: Rect) -> Self {
        Self {
            rect,
            kind: ObstacleKind::Wall,
        }
    }

    pub const fn door(rect: Rect, state: DoorState) -> Self {
        Self {
            rect,
            kind: ObstacleKind::Door(state),
        }
    }

    /// Whether this obstacle currently stops movement and sight
    #[inline]
    pub fn blocks(&self) -> bool {
        match self.kind {
            ObstacleKind::Wall => true,
            ObstacleKind::Door(state) => !state.is_open(),
        }
    }

    pub fn is_door(&self) -> bool {
        matches!(self.kind, ObstacleKind::Door(_))
    }
}

/// Ordered obstacles for one level. Order matters for ray clipping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    /// Build from plain wall rectangles
    pub fn from_walls(walls: impl IntoIterator<Item = Rect>) -> Self {
        Self::new(walls.into_iter().map(Obstacle::wall).collect())
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    /// Rectangles that currently block movement and sight, in order
    pub fn blockers(&self) -> impl Iterator<Item = &Rect> {
        self.obstacles.iter().filter(|o| o.blocks()).map(|o| &o.rect)
    }

    /// True if `rect` overlaps any blocking obstacle
    pub fn collides(&self, rect: &Rect) -> bool {
        self.blockers().any(|r| r.overlaps(rect))
    }

    /// The level's door, if it has one (the first door wins)
    pub fn door(&self) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.is_door())
    }

    pub fn door_state(&self) -> Option<DoorState> {
        self.door().and_then(|o| match o.kind {
            ObstacleKind::Door(state) => Some(state),
            ObstacleKind::Wall => None,
        })
    }

    /// Toggle the door if `click` lands inside it. Returns true on a toggle.
    pub fn toggle_door_at(&mut self, click: Vec2) -> bool {
        let Some(door) = self.obstacles.iter_mut().find(|o| o.is_door()) else {
            return false;
        };
        if !door.rect.contains_point(click) {
            return false;
        }
        if let ObstacleKind::Door(state) = door.kind {
            let next = state.toggled();
            door.kind = ObstacleKind::Door(next);
            log::debug!("Door toggled to {:?}", next);
        }
        true
    }
}

impl<'a> IntoIterator for &'a ObstacleSet {
    type Item = &'a Obstacle;
    type IntoIter = std::slice::Iter<'a, Obstacle>;

    fn into_iter(self) -> Self::IntoIter {
        self.obstacles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door_room() -> ObstacleSet {
        ObstacleSet::new(vec![
            Obstacle::wall(Rect::new(0.0, 0.0, 100.0, 10.0)),
            Obstacle::door(Rect::new(100.0, 900.0, 100.0, 20.0), DoorState::Closed),
        ])
    }

    #[test]
    fn test_closed_door_blocks_open_door_does_not() {
        let mut set = door_room();
        let probe = Rect::from_center(Vec2::new(150.0, 910.0), Vec2::new(20.0, 10.0));
        assert!(set.collides(&probe));
        assert_eq!(set.blockers().count(), 2);

        assert!(set.toggle_door_at(Vec2::new(150.0, 905.0)));
        assert_eq!(set.door_state(), Some(DoorState::Open));
        assert!(!set.collides(&probe));
        assert_eq!(set.blockers().count(), 1);
    }

    #[test]
    fn test_click_outside_door_is_noop() {
        let mut set = door_room();
        assert!(!set.toggle_door_at(Vec2::new(50.0, 5.0)));
        assert_eq!(set.door_state(), Some(DoorState::Closed));
    }

    #[test]
    fn test_door_state_persists_until_toggled_again() {
        let mut set = door_room();
        let click = Vec2::new(110.0, 901.0);
        set.toggle_door_at(click);
        set.toggle_door_at(Vec2::new(5.0, 5.0));
        assert_eq!(set.door_state(), Some(DoorState::Open));
        set.toggle_door_at(click);
        assert_eq!(set.door_state(), Some(DoorState::Closed));
    }

    #[test]
    fn test_no_door() {
        let mut set = ObstacleSet::from_walls([Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(set.door_state(), None);
        assert!(!set.toggle_door_at(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_obstacle_kind_defaults_to_wall_in_json() {
        let o: Obstacle =
            serde_json::from_str(r#"{"rect":{"x":1.0,"y":2.0,"width":3.0,"height":4.0}}"#)
                .expect("valid obstacle");
        assert_eq!(o.kind, ObstacleKind::Wall);
        assert!(o.blocks());
    }
}
