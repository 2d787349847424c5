//! Entity logic for items and equipment.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::{msg, placement::Place, prelude::*};

/// A ranged attack, from a weapon or built into a creature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ranged {
    pub verb: String,
    pub damage: f32,
    /// Charge drawn from the reactor per shot.
    #[serde(default)]
    pub energy: f32,
    /// Shots per attack.
    #[serde(alias = "fire_rate")]
    pub rate: i32,
    /// Distance up to which there is no penalty to hit.
    pub range: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub melee_verb: String,
    pub melee_damage: f32,
    pub melee_speed: i32,
    /// Can be equipped without spending a turn.
    pub quick_draw: bool,
    pub difficulty: i32,
    #[serde(default)]
    pub ranged: Option<Ranged>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub defense: i32,
    pub difficulty: i32,
}

/// Energy shield generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reactor {
    pub max_charge: f32,
    /// Charge regained per turn.
    pub recharge_rate: f32,
    /// Turns without recharge after the shield is broken.
    pub recovery: i32,
    /// Charge recycled back from every shot fired.
    pub recoil_charge: f32,
    pub difficulty: i32,

    #[serde(default)]
    pub charge: f32,
    #[serde(default)]
    pub hit_this_turn: bool,
    /// Turns left in the current recovery period.
    #[serde(default)]
    pub recovering: i32,
}

impl Reactor {
    /// Passive per-turn charge gain.
    ///
    /// A depleting hit starts the recovery window on the same turn, so the
    /// reactor stays dry for exactly `recovery` ticks.
    pub fn recharge(&mut self) {
        let was_hit = std::mem::take(&mut self.hit_this_turn);
        if self.recovering > 0 {
            self.recovering -= 1;
        } else if !was_hit {
            self.charge =
                (self.charge + self.recharge_rate).min(self.max_charge);
        }
    }

    /// Charge gained on the next passive recharge.
    pub fn recharge_this_turn(&self) -> f32 {
        if self.hit_this_turn || self.recovering > 0 {
            0.0
        } else {
            self.recharge_rate.min(self.max_charge - self.charge).max(0.0)
        }
    }

    /// Fill up the charge and clear any recovery state.
    pub fn fill(&mut self) {
        self.charge = self.max_charge;
        self.hit_this_turn = false;
        self.recovering = 0;
    }
}

/// Single-use recharge for reactors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub power: f32,
    pub difficulty: i32,
}

/// Item category with its category-specific values.
///
/// Only items have this component so it has no default value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Weapon(Weapon),
    Armor(Armor),
    Reactor(Reactor),
    Battery(Battery),
}

impl ItemKind {
    /// Equipment slot the item goes into, `None` if it can't be equipped.
    pub fn slot(&self) -> EquippedAt {
        match self {
            ItemKind::Weapon(_) => EquippedAt::Weapon,
            ItemKind::Armor(_) => EquippedAt::Armor,
            ItemKind::Reactor(_) => EquippedAt::Reactor,
            ItemKind::Battery(_) => EquippedAt::None,
        }
    }

    pub fn difficulty(&self) -> i32 {
        match self {
            ItemKind::Weapon(a) => a.difficulty,
            ItemKind::Armor(a) => a.difficulty,
            ItemKind::Reactor(a) => a.difficulty,
            ItemKind::Battery(a) => a.difficulty,
        }
    }
}

#[derive(
    Copy,
    Clone,
    Default,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum EquippedAt {
    // Have a baked-in None value so this can be used directly as a component
    #[default]
    None,
    Weapon,
    Armor,
    Reactor,
}

impl EquippedAt {
    pub fn is_some(&self) -> bool {
        !matches!(self, EquippedAt::None)
    }

    /// The actual slots, without `None`.
    pub fn slots() -> impl Iterator<Item = EquippedAt> {
        EquippedAt::iter().filter(|s| s.is_some())
    }
}

impl Entity {
    pub fn item_kind(&self, r: &impl AsRef<Runtime>) -> Option<ItemKind> {
        self.try_get(r)
    }

    pub fn is_equipped(&self, r: &impl AsRef<Runtime>) -> bool {
        self.equipped_at(r).is_some()
    }

    pub fn equipped_at(&self, r: &impl AsRef<Runtime>) -> EquippedAt {
        self.get(r)
    }

    /// Whether the item takes no time to equip.
    pub fn is_quick_draw(&self, r: &impl AsRef<Runtime>) -> bool {
        matches!(
            self.item_kind(r),
            Some(ItemKind::Weapon(Weapon {
                quick_draw: true,
                ..
            }))
        )
    }

    pub fn equipment<'a>(
        &self,
        r: &'a impl AsRef<Runtime>,
    ) -> impl Iterator<Item = (EquippedAt, Entity)> + 'a {
        self.contents(r).filter_map(|e| {
            let slot = e.equipped_at(r);
            slot.is_some().then_some((slot, e))
        })
    }

    /// Item equipped in the given slot.
    pub fn equipped(
        &self,
        r: &impl AsRef<Runtime>,
        slot: EquippedAt,
    ) -> Option<Entity> {
        self.equipment(r).find(|(s, _)| *s == slot).map(|(_, e)| e)
    }

    pub fn weapon(&self, r: &impl AsRef<Runtime>) -> Option<Weapon> {
        match self.equipped(r, EquippedAt::Weapon)?.item_kind(r)? {
            ItemKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn armor(&self, r: &impl AsRef<Runtime>) -> Option<Armor> {
        match self.equipped(r, EquippedAt::Armor)?.item_kind(r)? {
            ItemKind::Armor(a) => Some(a),
            _ => None,
        }
    }

    pub fn reactor(&self, r: &impl AsRef<Runtime>) -> Option<Reactor> {
        match self.equipped(r, EquippedAt::Reactor)?.item_kind(r)? {
            ItemKind::Reactor(a) => Some(a),
            _ => None,
        }
    }

    /// Modify the equipped reactor. Returns `None` if there isn't one.
    pub(crate) fn with_reactor_mut<U>(
        &self,
        r: &mut impl AsMut<Runtime>,
        f: impl FnOnce(&mut Reactor) -> U,
    ) -> Option<U> {
        let r = r.as_mut();
        let item = self.equipped(r, EquippedAt::Reactor)?;
        item.try_with_mut(r, |kind: &mut ItemKind| match kind {
            ItemKind::Reactor(reactor) => Some(f(reactor)),
            _ => None,
        })
        .flatten()
    }

    /// Put an item from the inventory in its equipment slot.
    ///
    /// An item already in the slot is swapped out and stays in the
    /// inventory. Reactors start out empty when equipped.
    pub fn equip(&self, r: &mut impl AsMut<Runtime>, item: &Entity) -> bool {
        let r = r.as_mut();

        if item.holder(r) != Some(*self) || item.is_equipped(r) {
            return false;
        }
        let Some(kind) = item.item_kind(r) else {
            return false;
        };
        let slot = kind.slot();
        if !slot.is_some() {
            log::debug!("Entity::equip: {} has no slot", item.name(r));
            return false;
        }

        if let Some(old) = self.equipped(r, slot) {
            old.set(r, EquippedAt::None);
        }
        item.set(r, slot);
        if slot == EquippedAt::Reactor {
            self.with_reactor_mut(r, |a| {
                a.charge = 0.0;
                a.hit_this_turn = false;
                a.recovering = 0;
            });
        }

        msg!(r, "{} equipped {}", self.name(r), item.name(r));
        true
    }

    pub fn unequip(&self, r: &mut impl AsMut<Runtime>, item: &Entity) -> bool {
        let r = r.as_mut();

        if item.holder(r) != Some(*self) || !item.is_equipped(r) {
            return false;
        }
        item.set(r, EquippedAt::None);
        msg!(r, "{} unequipped {}", self.name(r), item.name(r));
        true
    }

    /// Move a held item to the ground at the holder's feet.
    pub fn drop_item(
        &self,
        r: &mut impl AsMut<Runtime>,
        item: &Entity,
    ) -> bool {
        let r = r.as_mut();

        if item.holder(r) != Some(*self) {
            return false;
        }
        let Some(loc) = self.loc(r) else {
            return false;
        };
        item.set(r, EquippedAt::None);
        item.place(r, loc);
        msg!(r, "{} dropped {}", self.name(r), item.name(r));
        true
    }

    /// Pick up the first item on the ground at the entity's location.
    pub fn pick_up(&self, r: &mut impl AsMut<Runtime>) -> bool {
        let r = r.as_mut();

        let Some(Place::At(loc)) = r.placement.get(self) else {
            return false;
        };
        let Some(item) = loc.item_at(r) else {
            return false;
        };
        item.place(r, *self);
        msg!(r, "{} picked up {}", self.name(r), item.name(r));
        true
    }

    /// Use up a consumable item.
    ///
    /// Batteries recharge the equipped reactor, nothing else can be used.
    pub fn use_item(&self, r: &mut impl AsMut<Runtime>, item: &Entity) -> bool {
        let r = r.as_mut();

        if item.holder(r) != Some(*self) {
            return false;
        }
        let Some(ItemKind::Battery(battery)) = item.item_kind(r) else {
            return false;
        };
        if self
            .with_reactor_mut(r, |a| {
                a.charge = (a.charge + battery.power).min(a.max_charge);
            })
            .is_none()
        {
            return false;
        }

        msg!(r, "{} used {}", self.name(r), item.name(r));
        item.destroy(r);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Background;

    fn reactor(max: f32) -> Reactor {
        Reactor {
            max_charge: max,
            recharge_rate: 1.0,
            recovery: 2,
            recoil_charge: 0.0,
            difficulty: 0,
            charge: 0.0,
            hit_this_turn: false,
            recovering: 0,
        }
    }

    #[test]
    fn recharge_cycle() {
        let mut a = reactor(2.5);
        a.recharge();
        a.recharge();
        assert_eq!(a.charge, 2.0);
        assert_eq!(a.recharge_this_turn(), 0.5);
        a.recharge();
        assert_eq!(a.charge, 2.5);
        assert_eq!(a.recharge_this_turn(), 0.0);

        // A hit skips one recharge.
        a.charge = 1.0;
        a.hit_this_turn = true;
        assert_eq!(a.recharge_this_turn(), 0.0);
        a.recharge();
        assert_eq!(a.charge, 1.0);
        assert!(!a.hit_this_turn);

        // Recovery skips several.
        a.recovering = 2;
        a.recharge();
        a.recharge();
        assert_eq!(a.charge, 1.0);
        a.recharge();
        assert_eq!(a.charge, 2.0);
    }

    #[test]
    fn depletion_window_lasts_recovery_turns() {
        let mut a = reactor(5.0);
        // State left behind by a hit that drained the reactor.
        a.hit_this_turn = true;
        a.recovering = a.recovery;

        for _ in 0..a.recovery {
            assert_eq!(a.recharge_this_turn(), 0.0);
            a.recharge();
            assert_eq!(a.charge, 0.0);
        }
        assert_eq!(a.recovering, 0);
        assert_eq!(a.recharge_this_turn(), 1.0);
        a.recharge();
        assert_eq!(a.charge, 1.0);
    }

    fn officer() -> (Runtime, Entity) {
        let settings = Settings {
            background: Background::Officer,
            ..Default::default()
        };
        let r = Runtime::new(settings).unwrap();
        let player = r.player().unwrap();
        (r, player)
    }

    #[test]
    fn starting_kit() {
        let (r, player) = officer();
        let slots: Vec<EquippedAt> =
            player.equipment(&r).map(|(s, _)| s).collect();
        assert_eq!(slots.len(), 3);
        for slot in EquippedAt::slots() {
            assert!(player.equipped(&r, slot).is_some());
        }
        let a = player.reactor(&r).unwrap();
        assert_eq!(a.charge, a.max_charge);
        assert_eq!(player.contents(&r).count(), 6);
    }

    #[test]
    fn swap_and_reset_reactor() {
        let (mut r, player) = officer();
        let pistol = player.equipped(&r, EquippedAt::Weapon).unwrap();
        let knife = player
            .contents(&r)
            .find(|e| e.name(&r) == "knife")
            .unwrap();

        assert!(player.equip(&mut r, &knife));
        assert_eq!(player.equipped(&r, EquippedAt::Weapon), Some(knife));
        assert!(!pistol.is_equipped(&r));
        assert_eq!(pistol.holder(&r), Some(player));
        // Already equipped.
        assert!(!player.equip(&mut r, &knife));

        let reactor = player.equipped(&r, EquippedAt::Reactor).unwrap();
        assert!(player.unequip(&mut r, &reactor));
        assert_eq!(player.reactor(&r), None);
        assert!(player.equip(&mut r, &reactor));
        assert_eq!(player.reactor(&r).unwrap().charge, 0.0);
    }

    #[test]
    fn batteries() {
        let (mut r, player) = officer();
        let battery = player
            .contents(&r)
            .find(|e| e.name(&r) == "battery")
            .unwrap();
        let max = player.reactor(&r).unwrap().max_charge;

        // Full reactor, charge stays clamped.
        assert!(player.use_item(&mut r, &battery));
        assert_eq!(player.reactor(&r).unwrap().charge, max);
        assert!(!battery.is_alive(&r));
        assert_eq!(player.contents(&r).count(), 5);

        // Weapons can't be used.
        let pistol = player.equipped(&r, EquippedAt::Weapon).unwrap();
        assert!(!player.use_item(&mut r, &pistol));

        // Without a reactor batteries do nothing.
        let reactor = player.equipped(&r, EquippedAt::Reactor).unwrap();
        player.unequip(&mut r, &reactor);
        let battery = player
            .contents(&r)
            .find(|e| e.name(&r) == "battery")
            .unwrap();
        assert!(!player.use_item(&mut r, &battery));
        assert!(battery.is_alive(&r));
    }

    #[test]
    fn drop_and_pick_up() {
        let (mut r, player) = officer();
        let armor = player.equipped(&r, EquippedAt::Armor).unwrap();
        let loc = player.loc(&r).unwrap();

        assert!(player.drop_item(&mut r, &armor));
        assert_eq!(armor.holder(&r), None);
        assert_eq!(armor.loc(&r), Some(loc));
        assert!(!armor.is_equipped(&r));
        assert!(player.armor(&r).is_none());
        // Not held anymore.
        assert!(!player.drop_item(&mut r, &armor));

        // Something else may have been lying on the same spot.
        while armor.holder(&r) != Some(player) {
            assert!(player.pick_up(&mut r));
        }
        assert!(!armor.is_equipped(&r));
    }
}
