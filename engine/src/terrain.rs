use serde::{Deserialize, Serialize};

use crate::{mapgen::Room, prelude::*};

/// Terrain type of a single map cell.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize,
)]
#[serde(try_from = "char", into = "char")]
pub enum Terrain {
    #[default]
    Wall,
    Ground,
    Corridor,
}

use Terrain::*;

impl Terrain {
    pub fn is_walkable(self) -> bool {
        !matches!(self, Wall)
    }

    pub fn is_transparent(self) -> bool {
        !matches!(self, Wall)
    }
}

impl TryFrom<char> for Terrain {
    type Error = &'static str;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '#' => Ok(Wall),
            '.' => Ok(Ground),
            ',' => Ok(Corridor),
            _ => Err("invalid terrain char"),
        }
    }
}

impl From<Terrain> for char {
    fn from(val: Terrain) -> Self {
        // NB. This must match TryFrom inputs above.
        match val {
            Wall => '#',
            Ground => '.',
            Corridor => ',',
        }
    }
}

/// Map cell with its terrain and what the player knows about it.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize,
)]
pub struct Tile {
    pub terrain: Terrain,
    /// Player has seen this cell at some point. Never reverts to false.
    pub discovered: bool,
    /// Someone bled here.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bloody: bool,
}

impl Tile {
    pub fn is_walkable(&self) -> bool {
        self.terrain.is_walkable()
    }

    pub fn is_transparent(&self) -> bool {
        self.terrain.is_transparent()
    }
}

/// One level of the dungeon.
///
/// The shape of the floor is fixed once generated, only discovery and
/// decoration change afterwards.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub depth: usize,
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    pub rooms: Vec<Room>,
    /// Index of the room with the up portal.
    pub landing_room: usize,
    pub up: IVec2,
    pub down: IVec2,
}

impl Floor {
    /// Create a floor that is solid wall.
    pub fn new(depth: usize, width: i32, height: i32) -> Self {
        Floor {
            depth,
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
            rooms: Vec::new(),
            landing_room: 0,
            up: IVec2::ZERO,
            down: IVec2::ZERO,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    fn idx(&self, pos: IVec2) -> Option<usize> {
        self.contains(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Tile at position, out of bounds cells are undiscovered wall.
    pub fn tile(&self, pos: IVec2) -> Tile {
        self.idx(pos).map(|i| self.tiles[i]).unwrap_or_default()
    }

    pub fn is_walkable(&self, pos: IVec2) -> bool {
        self.tile(pos).is_walkable()
    }

    pub fn is_transparent(&self, pos: IVec2) -> bool {
        self.tile(pos).is_transparent()
    }

    pub(crate) fn set_terrain(&mut self, pos: IVec2, terrain: Terrain) {
        if let Some(i) = self.idx(pos) {
            self.tiles[i].terrain = terrain;
        }
    }

    pub(crate) fn discover(&mut self, pos: IVec2) {
        if let Some(i) = self.idx(pos) {
            self.tiles[i].discovered = true;
        }
    }

    pub(crate) fn bloody(&mut self, pos: IVec2) {
        if let Some(i) = self.idx(pos) {
            self.tiles[i].bloody = true;
        }
    }

    /// Iterate all cells with their positions, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, Tile)> + '_ {
        let w = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (ivec2(i as i32 % w, i as i32 / w), *t))
    }

    pub fn walkable_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.iter()
            .filter(|(_, t)| t.is_walkable())
            .map(|(p, _)| p)
    }

    /// Whether a projectile can fly from `a` to `b`.
    ///
    /// Only the cells strictly between the endpoints need to be
    /// transparent.
    pub fn has_clear_line(&self, a: IVec2, b: IVec2) -> bool {
        util::bresenham_line(a, b)
            .skip(1)
            .all(|p| self.is_transparent(p))
    }

    /// Text picture of the terrain, one row per line.
    pub fn ascii_map(&self) -> String {
        let mut ret = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                ret.push(char::from(self.tile(ivec2(x, y)).terrain));
            }
            ret.push('\n');
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        let mut floor = Floor::new(0, 4, 3);
        assert!(floor.contains(ivec2(3, 2)));
        assert!(!floor.contains(ivec2(4, 0)));
        assert!(!floor.contains(ivec2(0, -1)));
        assert_eq!(floor.tile(ivec2(-1, 9)), Tile::default());

        floor.set_terrain(ivec2(1, 1), Ground);
        floor.set_terrain(ivec2(9, 9), Ground);
        assert_eq!(floor.walkable_cells().collect::<Vec<_>>(), vec![ivec2(1, 1)]);
        assert_eq!(floor.ascii_map(), "####\n#.##\n####\n");
    }

    #[test]
    fn line_of_fire() {
        let mut floor = Floor::new(0, 6, 3);
        for x in 0..6 {
            floor.set_terrain(ivec2(x, 1), Ground);
        }
        assert!(floor.has_clear_line(ivec2(0, 1), ivec2(5, 1)));
        floor.set_terrain(ivec2(3, 1), Wall);
        assert!(!floor.has_clear_line(ivec2(0, 1), ivec2(5, 1)));
        // Endpoints themselves don't matter.
        assert!(floor.has_clear_line(ivec2(0, 1), ivec2(3, 1)));
    }
}
