//! Binary space partition floor generator.

use anyhow::{anyhow, Result};
use pathfinding::prelude::astar;
use rand::{prelude::*, seq::index};
use serde::{Deserialize, Serialize};
use util::PlottedDistribution;

use crate::{
    data::{Data, LeveledList},
    prelude::*,
    terrain::{Floor, Terrain},
    FLOOR_HEIGHT, FLOOR_WIDTH,
};

/// How many times the floor rectangle gets split.
const BSP_DEPTH: u32 = 5;

/// Smallest allowed partition width and height.
const BSP_MIN_SIZE: i32 = 3;

/// Partitions more elongated than this are always split across the long
/// side.
const BSP_MAX_RATIO: f32 = 2.0;

/// Axis-aligned cell rectangle.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Room {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Room { x, y, w, h }
    }

    pub fn contains(&self, p: IVec2) -> bool {
        (self.x..self.x + self.w).contains(&p.x)
            && (self.y..self.y + self.h).contains(&p.y)
    }

    pub fn cells(&self) -> impl Iterator<Item = IVec2> {
        let Room { x, y, w, h } = *self;
        (y..y + h).flat_map(move |y| (x..x + w).map(move |x| ivec2(x, y)))
    }

    pub fn random_point(&self, rng: &mut (impl Rng + ?Sized)) -> IVec2 {
        ivec2(
            rng.gen_range(self.x..self.x + self.w),
            rng.gen_range(self.y..self.y + self.h),
        )
    }
}

/// Something generation wants to create on a floor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Spawn {
    Enemy(String),
    Item(String),
    Portal(Direction),
}

/// Generated floor terrain and the entities to populate it with.
#[derive(Clone, Debug)]
pub struct Layout {
    pub floor: Floor,
    pub spawns: Vec<(IVec2, Spawn)>,
}

/// Parameters for generating one floor.
pub struct Level<'a> {
    depth: usize,
    settings: &'a Settings,
}

impl<'a> Level<'a> {
    pub fn new(depth: usize, settings: &'a Settings) -> Self {
        Level { depth, settings }
    }

    pub fn generate(&self, rng: &mut (impl Rng + ?Sized)) -> Result<Layout> {
        let data = Data::get();
        let mut floor = Floor::new(self.depth, FLOOR_WIDTH, FLOOR_HEIGHT);

        // Leave the far edges uncarved, leaves are inset on the near edges.
        let root = Room::new(0, 0, FLOOR_WIDTH - 1, FLOOR_HEIGHT - 1);
        partition(&mut floor, rng, root, BSP_DEPTH);

        let n = floor.rooms.len();
        let (up_room, down_room) = match n {
            0 => return Err(anyhow!("floor {} has no rooms", self.depth)),
            1 => (0, 0),
            _ => {
                let pair = index::sample(rng, n, 2);
                (pair.index(0), pair.index(1))
            }
        };

        floor.landing_room = up_room;
        floor.up = floor.rooms[up_room].random_point(rng);
        floor.down = floor.rooms[down_room].random_point(rng);
        while floor.down == floor.up {
            floor.down = floor.rooms[down_room].random_point(rng);
        }

        let mut spawns = vec![
            (floor.up, Spawn::Portal(Direction::Up)),
            (floor.down, Spawn::Portal(Direction::Down)),
        ];

        for (i, room) in floor.rooms.iter().enumerate() {
            if i == up_room
                || rng.gen::<f32>() >= self.settings.enemy_chance
            {
                continue;
            }

            let id = pick(&data.leveled_lists.enemies, self.depth, rng)?;
            let free: Vec<IVec2> = room
                .cells()
                .filter(|p| {
                    !spawns.iter().any(|(q, s)| {
                        q == p && matches!(s, Spawn::Enemy(_))
                    })
                })
                .collect();
            if let Some(&p) = free.choose(rng) {
                spawns.push((p, Spawn::Enemy(id)));
            }
        }

        let num_items =
            self.settings.item_count.sample(rng).round().max(0.0) as usize;
        for _ in 0..num_items {
            let id = pick(&data.leveled_lists.items, self.depth, rng)?;
            let room = floor.rooms[rng.gen_range(0..n)];
            spawns.push((room.random_point(rng), Spawn::Item(id)));
        }

        log::debug!(
            "generated floor {} with {} rooms and {} spawns",
            self.depth,
            n,
            spawns.len()
        );

        Ok(Layout { floor, spawns })
    }
}

/// Pick an identifier from the closest table at or above `depth`.
pub(crate) fn pick(
    list: &LeveledList,
    depth: usize,
    rng: &mut (impl Rng + ?Sized),
) -> Result<String> {
    let (_, table) = list
        .range(..=depth)
        .next_back()
        .ok_or_else(|| anyhow!("no leveled table for depth {depth}"))?;
    let entries: Vec<(&String, &u32)> = table.iter().collect();
    let (id, _) = entries.choose_weighted(rng, |(_, w)| **w)?;
    Ok(id.to_string())
}

/// Split `rect` recursively, carving rooms into leaves and joining sibling
/// partitions with corridors on the way back up.
fn partition(
    floor: &mut Floor,
    rng: &mut (impl Rng + ?Sized),
    rect: Room,
    depth: u32,
) {
    let min = BSP_MIN_SIZE;
    if depth == 0 || (rect.w < 2 * min && rect.h < 2 * min) {
        let room = Room::new(rect.x + 1, rect.y + 1, rect.w - 1, rect.h - 1);
        for p in room.cells() {
            floor.set_terrain(p, Terrain::Ground);
        }
        floor.rooms.push(room);
        return;
    }

    let horizontal = if rect.h < 2 * min
        || rect.w as f32 > rect.h as f32 * BSP_MAX_RATIO
    {
        false
    } else if rect.w < 2 * min
        || rect.h as f32 > rect.w as f32 * BSP_MAX_RATIO
    {
        true
    } else {
        rng.gen()
    };

    let (a, b, position) = if horizontal {
        let p = rng.gen_range(rect.y + min..=rect.y + rect.h - min);
        (
            Room::new(rect.x, rect.y, rect.w, p - rect.y),
            Room::new(rect.x, p, rect.w, rect.y + rect.h - p),
            p,
        )
    } else {
        let p = rng.gen_range(rect.x + min..=rect.x + rect.w - min);
        (
            Room::new(rect.x, rect.y, p - rect.x, rect.h),
            Room::new(p, rect.y, rect.x + rect.w - p, rect.h),
            p,
        )
    };

    partition(floor, rng, a, depth - 1);
    partition(floor, rng, b, depth - 1);
    connect(floor, rng, (a, b), horizontal, position);
}

/// Dig a straight corridor across the split line between two sibling
/// partitions.
fn connect(
    floor: &mut Floor,
    rng: &mut (impl Rng + ?Sized),
    (a, b): (Room, Room),
    horizontal: bool,
    position: i32,
) {
    // Work in (along the split line, across the split line) coordinates.
    let to_pos = |along: i32, across: i32| {
        if horizontal {
            ivec2(along, across)
        } else {
            ivec2(across, along)
        }
    };
    let (along_span, start, end) = if horizontal {
        (a.x + 1..a.x + a.w, a.y, b.y + b.h)
    } else {
        (a.y + 1..a.y + a.h, a.x, b.x + b.w)
    };

    // Offsets where both sides have open cells facing each other.
    let candidates: Vec<(i32, i32, i32)> = along_span
        .filter_map(|along| {
            let back = (start..position)
                .rev()
                .find(|&c| floor.is_walkable(to_pos(along, c)))?;
            let fwd = (position..end)
                .find(|&c| floor.is_walkable(to_pos(along, c)))?;
            Some((along, back, fwd))
        })
        .collect();

    if let Some(&(along, back, fwd)) = candidates.choose(rng) {
        for c in back + 1..fwd {
            floor.set_terrain(to_pos(along, c), Terrain::Corridor);
        }
    } else {
        tunnel(floor, a, b);
    }
}

/// Fallback connection, a winding tunnel between the two partitions.
fn tunnel(floor: &mut Floor, a: Room, b: Room) {
    let (Some(start), Some(goal)) = (
        a.cells().find(|&p| floor.is_walkable(p)),
        b.cells().find(|&p| floor.is_walkable(p)),
    ) else {
        return;
    };

    let bounds = Room::new(
        a.x.min(b.x),
        a.y.min(b.y),
        (a.x + a.w).max(b.x + b.w) - a.x.min(b.x),
        (a.y + a.h).max(b.y + b.h) - a.y.min(b.y),
    );
    let path = astar(
        &start,
        |&p| {
            DIR_4
                .iter()
                .map(move |&d| p + d)
                .filter(|&q| bounds.contains(q))
                .map(|q| (q, 1))
                .collect::<Vec<_>>()
        },
        |&p| (goal - p).taxi_len(),
        |&p| p == goal,
    );

    if let Some((path, _)) = path {
        for p in path {
            if !floor.is_walkable(p) {
                floor.set_terrain(p, Terrain::Corridor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use util::{dijkstra_map, srng};

    use super::*;

    fn layouts() -> impl Iterator<Item = Layout> {
        let settings = Settings::default();
        (0..20).map(move |i| {
            Level::new(i % 5, &settings)
                .generate(&mut srng(&i))
                .unwrap()
        })
    }

    #[test]
    fn floors_are_connected() {
        for layout in layouts() {
            let floor = &layout.floor;
            let reached = dijkstra_map(
                |&p: &IVec2| {
                    DIR_8
                        .iter()
                        .map(move |&d| p + d)
                        .filter(|&q| floor.is_walkable(q))
                        .collect::<Vec<_>>()
                },
                Some(floor.up),
            )
            .count();
            assert_eq!(
                reached,
                floor.walkable_cells().count(),
                "disconnected floor:\n{}",
                floor.ascii_map()
            );
        }
    }

    #[test]
    fn edges_stay_solid() {
        for layout in layouts() {
            let floor = &layout.floor;
            for (p, t) in floor.iter() {
                if p.x == 0
                    || p.y == 0
                    || p.x == floor.width() - 1
                    || p.y == floor.height() - 1
                {
                    assert!(!t.is_walkable(), "open edge at {p}");
                }
            }
        }
    }

    #[test]
    fn spawn_placement() {
        for layout in layouts() {
            let floor = &layout.floor;
            assert!(floor.rooms.len() >= 2);
            assert_ne!(floor.up, floor.down);

            let landing = floor.rooms[floor.landing_room];
            assert!(landing.contains(floor.up));
            assert!(!landing.contains(floor.down));

            for (p, spawn) in &layout.spawns {
                assert!(floor.is_walkable(*p));
                if let Spawn::Enemy(_) = spawn {
                    assert!(!landing.contains(*p), "enemy in landing room");
                }
            }
        }
    }

    #[test]
    fn leveled_table_walks_down() {
        let data = Data::get();
        let mut rng = srng("leveled");
        // Past the deepest table, the deepest table is used.
        for _ in 0..100 {
            let id = pick(&data.leveled_lists.enemies, 99, &mut rng).unwrap();
            assert!(data.leveled_lists.enemies[&4].contains_key(&id));
        }
        // Depth 1 has no own table and falls back to depth 0.
        for _ in 0..100 {
            let id = pick(&data.leveled_lists.enemies, 1, &mut rng).unwrap();
            assert!(data.leveled_lists.enemies[&0].contains_key(&id));
        }
    }

    #[test]
    fn rooms_are_inset_leaves() {
        let room = Room::new(2, 3, 4, 2);
        assert_eq!(room.cells().count(), 8);
        assert!(room.contains(ivec2(5, 4)));
        assert!(!room.contains(ivec2(6, 4)));
    }
}
