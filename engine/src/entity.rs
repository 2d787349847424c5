//! Generic entity logic.
use std::{fmt, str::FromStr};

use derive_more::Deref;
use hecs::Component;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{ecs::*, placement::Place, prelude::*};

// Dummy wrapper so we can write impls for it directly instead of deriving a
// trait for hecs::Entity and writing every fn signature twice.
/// Game entity identifier datatype. All the actual contents live in the ECS.
#[derive(
    Copy,
    Clone,
    Hash,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Debug,
    Deref,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Entity(pub(crate) hecs::Entity);

impl Entity {
    pub(crate) fn get<T>(&self, r: &impl AsRef<Runtime>) -> T
    where
        T: Component + Clone + Default,
    {
        let r = r.as_ref();
        r.ecs
            .get::<&T>(**self)
            .map(|c| (*c).clone())
            .unwrap_or_default()
    }

    /// Get a component that has no meaningful default value.
    pub(crate) fn try_get<T>(&self, r: &impl AsRef<Runtime>) -> Option<T>
    where
        T: Component + Clone,
    {
        let r = r.as_ref();
        r.ecs.get::<&T>(**self).ok().map(|c| (*c).clone())
    }

    pub(crate) fn set<T>(&self, r: &mut impl AsMut<Runtime>, val: T)
    where
        T: Component + Default + PartialEq,
    {
        let r = r.as_mut();
        if val == T::default() {
            // Remove default values, abstraction layer assumes components are
            // always present but defaulted.
            //
            // Will give an error if the component wasn't there to begin with,
            // just ignore that.
            let _ = r.ecs.remove_one::<T>(**self);
        } else if r.ecs.insert_one(**self, val).is_err() {
            log::warn!("Entity::set: {self} does not exist");
        }
    }

    /// Access and mutate a component using a closure.
    ///
    /// Use for complex components that aren't just atomic values.
    pub(crate) fn with_mut<T: Component + Default + PartialEq, U>(
        &self,
        r: &mut impl AsMut<Runtime>,
        mut f: impl FnMut(&mut T) -> U,
    ) -> U {
        let r = r.as_mut();
        let mut delete = false;
        let mut insert = false;
        let ret;

        let mut scratch = T::default();
        if let Ok(query) = r.ecs.query_one_mut::<&mut T>(**self) {
            ret = f(&mut *query);
            // We created a default value once, reuse it here.
            if *query == scratch {
                delete = true;
            }
        } else {
            ret = f(&mut scratch);
            if scratch != T::default() {
                insert = true;
            }
        }

        if delete {
            // Component became default value, remove from ECS.
            let _ = r.ecs.remove_one::<T>(**self);
        } else if insert && r.ecs.insert_one(**self, scratch).is_err() {
            log::warn!("Entity::with_mut: {self} does not exist");
        }

        ret
    }

    /// Mutate a component that has no default value. Returns `None` if the
    /// entity doesn't have the component.
    pub(crate) fn try_with_mut<T: Component, U>(
        &self,
        r: &mut impl AsMut<Runtime>,
        f: impl FnOnce(&mut T) -> U,
    ) -> Option<U> {
        let r = r.as_mut();
        r.ecs.query_one_mut::<&mut T>(**self).ok().map(f)
    }

    pub fn loc(&self, r: &impl AsRef<Runtime>) -> Option<Location> {
        let r = r.as_ref();
        r.placement.entity_pos(self)
    }

    /// Container entity this one is held in.
    pub fn holder(&self, r: &impl AsRef<Runtime>) -> Option<Entity> {
        match r.as_ref().placement.get(self) {
            Some(Place::In(e)) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn place(
        &self,
        r: &mut impl AsMut<Runtime>,
        place: impl Into<Place>,
    ) {
        let r = r.as_mut();
        let place = place.into();
        if Some(place) != r.placement.get(self) {
            r.placement.insert(place, *self);
        }
    }

    pub fn name(&self, r: &impl AsRef<Runtime>) -> String {
        self.get::<Name>(r).0
    }

    pub fn icon(&self, r: &impl AsRef<Runtime>) -> char {
        match self.get::<Icon>(r) {
            Icon('\0') => '?',
            Icon(c) => c,
        }
    }

    pub fn kind(&self, r: &impl AsRef<Runtime>) -> Kind {
        self.get::<Kind>(r)
    }

    pub fn is_player(&self, r: &impl AsRef<Runtime>) -> bool {
        self.kind(r) == Kind::Actor(ActorKind::Player)
    }

    /// Actors block movement, everything else can be stepped over.
    pub fn obstructs(&self, r: &impl AsRef<Runtime>) -> bool {
        matches!(self.kind(r), Kind::Actor(_))
    }

    pub fn is_item(&self, r: &impl AsRef<Runtime>) -> bool {
        self.kind(r) == Kind::Item
    }

    /// Entity exists in the world, either on a floor or held by someone.
    pub fn is_alive(&self, r: &impl AsRef<Runtime>) -> bool {
        self.loc(r).is_some()
    }

    pub fn is_discovered(&self, r: &impl AsRef<Runtime>) -> bool {
        self.get::<Discovered>(r).0
    }

    pub fn last_seen(&self, r: &impl AsRef<Runtime>) -> Option<IVec2> {
        self.get::<LastSeen>(r).0
    }

    /// Where the player believes the entity to be, if anywhere.
    ///
    /// Entities in view show up where they are, out of view entities show
    /// up at their last seen position unless the player can see that spot
    /// and therefore knows they aren't there anymore.
    pub fn apparent_pos(&self, r: &impl AsRef<Runtime>) -> Option<IVec2> {
        let r = r.as_ref();
        let loc = self.loc(r)?;
        if r.fov.contains(loc) {
            return Some(loc.pos);
        }
        if !self.is_discovered(r) {
            return None;
        }
        let seen = Location::new(loc.depth, self.last_seen(r)?);
        (!r.fov.contains(seen)).then_some(seen.pos)
    }

    /// Remove the entity from the world.
    pub(crate) fn destroy(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        for e in self.contents(r).collect::<Vec<_>>() {
            e.destroy(r);
        }
        r.placement.remove(self);
        if Some(*self) != r.player {
            let _ = r.ecs.despawn(**self);
        }
    }

    pub fn contents<'a>(
        &self,
        r: &'a impl AsRef<Runtime>,
    ) -> impl Iterator<Item = Entity> + 'a {
        let r = r.as_ref();
        r.placement.entities_in(self)
    }
}

// Show entities as short opaque identifiers in save files.

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.to_bits())
    }
}

impl FromStr for Entity {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits: u64 = s
            .strip_prefix('#')
            .and_then(|s| s.parse().ok())
            .ok_or("bad entity")?;
        Ok(Entity(hecs::Entity::from_bits(bits).ok_or("bad entity")?))
    }
}
