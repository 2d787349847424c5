use pathfinding::prelude::*;

use crate::{prelude::*, terrain::Floor};

/// Cost unit of one orthogonal step.
const STEP_COST: u32 = 100;

impl Floor {
    /// Shortest walkable path between two cells.
    ///
    /// The path starts with the first step to take and ends at `to`. The
    /// origin is not included. Returns an empty path when `to` can't be
    /// reached. Diagonal steps cost `diagonal_cost` orthogonal steps.
    pub fn path(
        &self,
        from: IVec2,
        to: IVec2,
        diagonal_cost: f32,
    ) -> Vec<IVec2> {
        if from == to || !self.is_walkable(to) {
            return Vec::new();
        }

        let diagonal =
            (STEP_COST as f32 * diagonal_cost).round().max(1.0) as u32;

        let Some((mut path, _)) = astar(
            &from,
            |&p| {
                DIR_8
                    .iter()
                    .map(move |&d| p + d)
                    .filter(|&q| self.is_walkable(q))
                    .map(move |q| {
                        let cost = if (q - p).is_diagonal_step() {
                            diagonal
                        } else {
                            STEP_COST
                        };
                        (q, cost)
                    })
                    .collect::<Vec<_>>()
            },
            |&p| (to - p).chess_len() as u32 * STEP_COST,
            |&p| p == to,
        ) else {
            return Vec::new();
        };

        path.remove(0);
        path
    }
}

impl Runtime {
    /// Path between two locations on the same floor, see [`Floor::path`].
    pub fn path(&self, from: Location, to: Location) -> Vec<IVec2> {
        if from.depth != to.depth {
            return Vec::new();
        }
        let Some(floor) = self.floors.get(from.depth) else {
            return Vec::new();
        };
        floor.path(from.pos, to.pos, self.settings.diagonal_cost)
    }
}

#[cfg(test)]
mod tests {
    use crate::terrain::Terrain;

    use super::*;

    fn open_floor() -> Floor {
        let mut floor = Floor::new(0, 8, 8);
        for y in 1..7 {
            for x in 1..7 {
                floor.set_terrain(ivec2(x, y), Terrain::Ground);
            }
        }
        floor
    }

    #[test]
    fn straight_path_excludes_origin() {
        let floor = open_floor();
        let path = floor.path(ivec2(1, 1), ivec2(4, 1), 1.01);
        assert_eq!(path, vec![ivec2(2, 1), ivec2(3, 1), ivec2(4, 1)]);
    }

    #[test]
    fn diagonal_path() {
        let floor = open_floor();
        let path = floor.path(ivec2(1, 1), ivec2(4, 4), 1.01);
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some(&ivec2(4, 4)));
        // Consecutive steps are always adjacent.
        let mut prev = ivec2(1, 1);
        for p in path {
            assert!((p - prev).is_adjacent());
            prev = p;
        }
    }

    #[test]
    fn straight_beats_zigzag() {
        let floor = open_floor();
        // Any path of three steps reaches (4, 2), the slightly pricier
        // diagonals make the one with a single diagonal step win.
        let path = floor.path(ivec2(1, 1), ivec2(4, 2), 1.01);
        assert_eq!(path.len(), 3);
        let diagonals = path
            .iter()
            .scan(ivec2(1, 1), |prev, &p| {
                let d = (p - *prev).is_diagonal_step();
                *prev = p;
                Some(d)
            })
            .filter(|&d| d)
            .count();
        assert_eq!(diagonals, 1);
    }

    #[test]
    fn no_path() {
        let mut floor = open_floor();
        for y in 1..7 {
            floor.set_terrain(ivec2(3, y), Terrain::Wall);
        }
        assert!(floor.path(ivec2(1, 1), ivec2(5, 5), 1.01).is_empty());
        assert!(floor.path(ivec2(1, 1), ivec2(0, 0), 1.01).is_empty());
        assert!(floor.path(ivec2(1, 1), ivec2(1, 1), 1.01).is_empty());
    }
}
