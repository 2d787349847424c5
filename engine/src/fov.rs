//! Player field of view and discovery.

use crate::{
    ecs::{Discovered, LastSeen},
    prelude::*,
    terrain::Floor,
};

/// Cells the player can currently see.
///
/// This is derived state, it's left out of save files and recomputed from
/// the player's position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
    depth: usize,
    cells: HashSet<IVec2>,
}

impl Visibility {
    pub fn contains(&self, loc: Location) -> bool {
        loc.depth == self.depth && self.cells.contains(&loc.pos)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.cells.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Floor {
    /// Cells visible from `origin` within a circle of `radius`.
    ///
    /// Opaque cells are seen but block sight past them. Visibility between
    /// transparent cells is symmetric, a transparent cell is only seen if
    /// it can also see `origin` back.
    pub fn fov_from(&self, origin: IVec2, radius: i32) -> HashSet<IVec2> {
        self.shadowcast(origin, radius)
            .filter(|&p| {
                p == origin
                    || !self.is_transparent(p)
                    || self.shadowcast(p, radius).any(|q| q == origin)
            })
            .collect()
    }

    /// One-way shadowcast from `origin`, may contain repeats.
    fn shadowcast(
        &self,
        origin: IVec2,
        radius: i32,
    ) -> impl Iterator<Item = IVec2> + '_ {
        #[derive(Copy, Clone)]
        struct FovState<'a> {
            origin: IVec2,
            floor: &'a Floor,
            radius: i32,
            is_edge: bool,
        }

        impl PartialEq for FovState<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.origin == other.origin
                    && self.radius == other.radius
                    && self.is_edge == other.is_edge
            }
        }

        impl fov::State for FovState<'_> {
            type Vector = IVec2;

            fn advance(&self, offset: IVec2) -> Option<Self> {
                if self.is_edge {
                    return None;
                }

                if offset.length_squared() > self.radius * self.radius {
                    return None;
                }

                let pos = self.origin + offset;
                if !self.floor.contains(pos) {
                    return None;
                }

                let is_edge = !self.floor.is_transparent(pos);
                Some(FovState { is_edge, ..*self })
            }
        }

        fov::Square::new(FovState {
            origin,
            floor: self,
            radius,
            is_edge: false,
        })
        .map(move |(v, _)| origin + v)
    }
}

impl Runtime {
    /// Recompute the player's view, then discover what's in it.
    pub(crate) fn refresh_fov(&mut self) {
        self.update_visibility();

        let depth = self.fov.depth;
        let cells: Vec<IVec2> = self.fov.cells().collect();
        if let Some(floor) = self.floors.get_mut(depth) {
            for &p in &cells {
                floor.discover(p);
            }
        }

        let r = &*self;
        let seen: Vec<(Entity, IVec2)> = r
            .placement
            .entities_on(depth)
            .filter_map(|e| Some((e, e.loc(r)?)))
            .filter(|(_, loc)| r.fov.contains(*loc))
            .map(|(e, loc)| (e, loc.pos))
            .collect();
        for (e, pos) in seen {
            e.set(self, Discovered(true));
            e.set(self, LastSeen(Some(pos)));
        }
    }

    /// Recompute the visibility mask only, without touching discovery.
    pub(crate) fn update_visibility(&mut self) {
        let r = &*self;
        let Some(loc) = r.player.and_then(|p| p.loc(r)) else {
            // Keep the depth so the floor of death is still known.
            self.fov.cells.clear();
            return;
        };
        let cells = match self.floors.get(loc.depth) {
            Some(floor) => floor.fov_from(loc.pos, self.settings.fov_radius),
            None => Default::default(),
        };
        self.fov = Visibility {
            depth: loc.depth,
            cells,
        };
    }

    pub fn visibility(&self) -> &Visibility {
        &self.fov
    }
}
