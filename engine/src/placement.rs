use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Place {
    In(Entity),
    At(Location),
}

use Place::*;

impl From<Entity> for Place {
    fn from(e: Entity) -> Self {
        In(e)
    }
}

impl From<Location> for Place {
    fn from(loc: Location) -> Self {
        At(loc)
    }
}

/// Spatial index, used for efficiently finding locations of entities and
/// entities at locations.
///
/// Every floor keeps an ordered roster of the entities on it. Entities are
/// appended to the roster when they arrive on the floor and keep their
/// position while they move around on it. AI turn order follows the roster.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(from = "Vec<(Entity, Place)>", into = "Vec<(Entity, Place)>")]
pub struct Placement {
    places: HashMap<Entity, Place>,
    floors: BTreeMap<usize, IndexSet<Entity>>,
    cells: HashMap<Location, IndexSet<Entity>>,
    containers: HashMap<Entity, IndexSet<Entity>>,
}

impl Placement {
    pub fn get(&self, e: &Entity) -> Option<Place> {
        self.places.get(e).copied()
    }

    pub fn entities_at(
        &self,
        loc: Location,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.cells.get(&loc).into_iter().flatten().copied()
    }

    pub fn entities_in(
        &self,
        container: &Entity,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.containers.get(container).into_iter().flatten().copied()
    }

    /// Entities on a floor in roster order.
    pub fn entities_on(
        &self,
        depth: usize,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.floors.get(&depth).into_iter().flatten().copied()
    }

    pub fn entity_pos(&self, e: &Entity) -> Option<Location> {
        match self.places.get(e) {
            None => None,
            Some(At(loc)) => Some(*loc),
            Some(In(e)) => self.entity_pos(e),
        }
    }

    pub fn remove(&mut self, e: &Entity) {
        match self.places.remove(e) {
            Some(At(loc)) => {
                if let Some(set) = self.floors.get_mut(&loc.depth) {
                    set.shift_remove(e);
                }
                if let Some(set) = self.cells.get_mut(&loc) {
                    set.shift_remove(e);
                }
            }
            Some(In(container)) => {
                if let Some(set) = self.containers.get_mut(&container) {
                    set.shift_remove(e);
                }
            }
            None => {}
        }
    }

    /// Whether `e` is inside `container`, directly or nested.
    pub fn contains(&self, container: &Entity, e: &Entity) -> bool {
        self.entities_in(container)
            .any(|i| &i == e || self.contains(&i, e))
    }

    pub fn insert(&mut self, place: Place, e: Entity) {
        if let (Some(At(old)), At(new)) = (self.places.get(&e).copied(), place)
        {
            if old.depth == new.depth {
                // Moving within a floor, keep the roster position.
                if let Some(set) = self.cells.get_mut(&old) {
                    set.shift_remove(&e);
                }
                self.cells.entry(new).or_default().insert(e);
                self.places.insert(e, place);
                return;
            }
        }

        if let In(container) = place {
            assert!(
                container != e && !self.contains(&e, &container),
                "Placement::insert: Containment loop"
            );
        }

        self.remove(&e);
        self.places.insert(e, place);
        match place {
            At(loc) => {
                self.floors.entry(loc.depth).or_default().insert(e);
                self.cells.entry(loc).or_default().insert(e);
            }
            In(container) => {
                self.containers.entry(container).or_default().insert(e);
            }
        }
    }
}

impl From<Vec<(Entity, Place)>> for Placement {
    fn from(s: Vec<(Entity, Place)>) -> Self {
        let mut ret = Self::default();
        for (e, p) in s {
            ret.insert(p, e);
        }
        ret
    }
}

impl From<Placement> for Vec<(Entity, Place)> {
    fn from(p: Placement) -> Self {
        // Floors in roster order first, then container contents with
        // containers sorted to keep the output stable.
        let mut ret: Vec<(Entity, Place)> = p
            .floors
            .values()
            .flatten()
            .map(|e| (*e, p.places[e]))
            .collect();

        let mut containers: Vec<_> = p.containers.iter().collect();
        containers.sort_by_key(|(c, _)| **c);
        for (c, set) in containers {
            ret.extend(set.iter().map(|e| (*e, In(*c))));
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(world: &mut hecs::World) -> Entity {
        Entity(world.spawn(()))
    }

    #[test]
    fn roster_order_survives_moves() {
        let mut world = hecs::World::new();
        let (a, b, c) = (spawn(&mut world), spawn(&mut world), spawn(&mut world));
        let mut p = Placement::default();

        p.insert(Location::new(0, ivec2(1, 1)).into(), a);
        p.insert(Location::new(0, ivec2(2, 2)).into(), b);
        p.insert(Location::new(0, ivec2(3, 3)).into(), c);

        // Moving on the same floor keeps a at the front.
        p.insert(Location::new(0, ivec2(5, 5)).into(), a);
        assert_eq!(p.entities_on(0).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(p.entities_at(Location::new(0, ivec2(1, 1))).count(), 0);
        assert_eq!(
            p.entities_at(Location::new(0, ivec2(5, 5))).collect::<Vec<_>>(),
            vec![a]
        );

        // Changing floors moves it to the back of the new roster.
        p.insert(Location::new(1, ivec2(5, 5)).into(), a);
        p.insert(Location::new(0, ivec2(5, 5)).into(), a);
        assert_eq!(p.entities_on(0).collect::<Vec<_>>(), vec![b, c, a]);
    }

    #[test]
    fn containers() {
        let mut world = hecs::World::new();
        let (bag, item) = (spawn(&mut world), spawn(&mut world));
        let mut p = Placement::default();
        let loc = Location::new(2, ivec2(4, 7));

        p.insert(loc.into(), bag);
        p.insert(bag.into(), item);
        assert_eq!(p.entity_pos(&item), Some(loc));
        assert!(p.contains(&bag, &item));
        assert_eq!(p.entities_on(2).collect::<Vec<_>>(), vec![bag]);

        p.remove(&item);
        assert_eq!(p.entity_pos(&item), None);
        assert_eq!(p.entities_in(&bag).count(), 0);
    }

    #[test]
    fn serialized_order() {
        let mut world = hecs::World::new();
        let (a, b, bag, item) = (
            spawn(&mut world),
            spawn(&mut world),
            spawn(&mut world),
            spawn(&mut world),
        );
        let mut p = Placement::default();
        p.insert(Location::new(0, ivec2(1, 1)).into(), b);
        p.insert(Location::new(0, ivec2(2, 1)).into(), a);
        p.insert(Location::new(0, ivec2(3, 1)).into(), bag);
        p.insert(bag.into(), item);

        let json = serde_json::to_string(&p).unwrap();
        let p2: Placement = serde_json::from_str(&json).unwrap();
        assert_eq!(p2.entities_on(0).collect::<Vec<_>>(), vec![b, a, bag]);
        assert_eq!(p2.entity_pos(&item), Some(Location::new(0, ivec2(3, 1))));
    }
}
