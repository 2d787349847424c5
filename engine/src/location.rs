use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::{prelude::*, terrain::Tile};

/// Vertical direction of travel between floors.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Up,
    Down,
}

/// A cell on a specific floor of the dungeon.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub depth: usize,
    pub pos: IVec2,
}

impl Location {
    pub fn new(depth: usize, pos: impl Into<IVec2>) -> Self {
        Location {
            depth,
            pos: pos.into(),
        }
    }

    /// Chessboard distance to another location on the same floor.
    pub fn distance(&self, other: &Location) -> Option<i32> {
        (self.depth == other.depth).then(|| (other.pos - self.pos).chess_len())
    }

    pub fn tile(&self, r: &impl AsRef<Runtime>) -> Tile {
        let r = r.as_ref();
        r.floors
            .get(self.depth)
            .map(|f| f.tile(self.pos))
            .unwrap_or_default()
    }

    pub fn is_walkable(&self, r: &impl AsRef<Runtime>) -> bool {
        self.tile(r).is_walkable()
    }

    pub fn entities_at<'a>(
        &self,
        r: &'a impl AsRef<Runtime>,
    ) -> impl Iterator<Item = Entity> + 'a {
        r.as_ref().placement.entities_at(*self)
    }

    pub fn mob_at(&self, r: &impl AsRef<Runtime>) -> Option<Entity> {
        self.entities_at(r).find(|e| e.obstructs(r))
    }

    pub fn item_at(&self, r: &impl AsRef<Runtime>) -> Option<Entity> {
        self.entities_at(r).find(|e| e.is_item(r))
    }

    /// Whether a character could step here right now.
    pub fn is_open(&self, r: &impl AsRef<Runtime>) -> bool {
        self.is_walkable(r) && self.mob_at(r).is_none()
    }

    /// Walkable cells around this one.
    pub fn walk_neighbors<'a>(
        &self,
        r: &'a impl AsRef<Runtime>,
    ) -> impl Iterator<Item = Location> + 'a {
        let origin = *self;
        DIR_8
            .iter()
            .map(move |&d| origin + d)
            .filter(move |loc| loc.is_walkable(r))
    }

    /// Location is in the player's current field of view.
    pub fn is_visible(&self, r: &impl AsRef<Runtime>) -> bool {
        r.as_ref().fov.contains(*self)
    }

    pub fn is_discovered(&self, r: &impl AsRef<Runtime>) -> bool {
        self.tile(r).discovered
    }

    /// Leave a bloodstain on the floor.
    pub(crate) fn decorate(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        if let Some(floor) = r.floors.get_mut(self.depth) {
            floor.bloody(self.pos);
        }
    }
}

impl Add<IVec2> for Location {
    type Output = Location;

    fn add(self, rhs: IVec2) -> Self::Output {
        Location {
            depth: self.depth,
            pos: self.pos + rhs,
        }
    }
}
