//! Entity logic for characters.

use crate::{
    ecs::{InnateRanged, IsDead, Level, Life, Stats, Xp},
    formula,
    item::{ItemKind, Ranged},
    prelude::*,
};

impl Entity {
    pub fn is_character(&self, r: &impl AsRef<Runtime>) -> bool {
        self.obstructs(r)
    }

    pub fn is_dead(&self, r: &impl AsRef<Runtime>) -> bool {
        self.get::<IsDead>(r).0
    }

    pub fn level(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<Level>(r).0
    }

    pub fn xp(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<Xp>(r).0
    }

    pub fn life(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.get::<Life>(r).0
    }

    pub fn base_stats(&self, r: &impl AsRef<Runtime>) -> Stats {
        self.get(r)
    }

    pub fn defense(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.base_stats(r).defense + self.armor(r).map_or(0, |a| a.defense)
    }

    pub fn melee_damage(&self, r: &impl AsRef<Runtime>) -> f32 {
        self.base_stats(r).damage
            + self.weapon(r).map_or(0.0, |w| w.melee_damage)
    }

    /// Ranged attack of the equipped weapon or failing that the innate
    /// one.
    pub fn ranged_attack(&self, r: &impl AsRef<Runtime>) -> Option<Ranged> {
        self.weapon(r)
            .and_then(|w| w.ranged)
            .or_else(|| self.get::<InnateRanged>(r).0)
    }

    /// Whether the ranged attack comes from a weapon and draws energy.
    fn has_ranged_weapon(&self, r: &impl AsRef<Runtime>) -> bool {
        self.weapon(r).is_some_and(|w| w.ranged.is_some())
    }

    pub fn ranged_damage(&self, r: &impl AsRef<Runtime>) -> f32 {
        self.ranged_attack(r).map_or(0.0, |a| a.damage)
    }

    /// Number of blows or shots in one attack.
    pub fn attack_rate(
        &self,
        r: &impl AsRef<Runtime>,
        is_ranged: bool,
    ) -> i32 {
        if is_ranged {
            if let Some(a) = self.ranged_attack(r) {
                return a.rate;
            }
        } else if let Some(w) = self.weapon(r) {
            return w.melee_speed;
        }
        self.base_stats(r).attack_rate
    }

    /// Hit chance penalty from equipment the character isn't skilled
    /// enough for.
    pub fn encumbrance(&self, r: &impl AsRef<Runtime>) -> i32 {
        let level = self.level(r);
        self.equipment(r)
            .filter_map(|(_, e)| e.item_kind(r))
            .map(|k| (k.difficulty() - level).max(0))
            .sum()
    }

    /// Distance with no penalty to ranged hit chance.
    pub fn range(&self, r: &impl AsRef<Runtime>) -> i32 {
        self.ranged_attack(r).map_or(0, |a| a.range)
    }

    /// Distance beyond which ranged attacks can't hit.
    pub fn max_range(&self, r: &impl AsRef<Runtime>) -> i32 {
        if self.ranged_attack(r).is_none() {
            return 0;
        }
        formula::max_range(self.encumbrance(r), self.range(r))
    }

    /// Melee hit chance against an unencumbered target.
    pub fn accuracy(&self, r: &impl AsRef<Runtime>) -> f32 {
        formula::melee_hit_chance(self.encumbrance(r), 0)
    }

    pub fn energy(&self, r: &impl AsRef<Runtime>) -> f32 {
        self.reactor(r).map_or(0.0, |a| a.charge)
    }

    pub fn max_energy(&self, r: &impl AsRef<Runtime>) -> f32 {
        self.reactor(r).map_or(0.0, |a| a.max_charge)
    }

    /// Energy the reactor will regain at the end of this turn.
    pub fn recharge_this_turn(&self, r: &impl AsRef<Runtime>) -> f32 {
        self.reactor(r).map_or(0.0, |a| a.recharge_this_turn())
    }

    /// Gross energy cost of one shot.
    pub fn energy_per_shot(&self, r: &impl AsRef<Runtime>) -> f32 {
        if !self.has_ranged_weapon(r) {
            return 0.0;
        }
        self.ranged_attack(r).map_or(0.0, |a| a.energy)
    }

    /// Energy taken out of the reactor by one shot after the recoil is
    /// recycled.
    pub fn net_shot_cost(&self, r: &impl AsRef<Runtime>) -> f32 {
        let cost = self.energy_per_shot(r);
        let recoil = self.reactor(r).map_or(0.0, |a| a.recoil_charge);
        cost - cost.min(recoil)
    }

    /// Has a ranged attack and the energy to fire it once.
    pub fn can_shoot(&self, r: &impl AsRef<Runtime>) -> bool {
        self.ranged_attack(r).is_some()
            && self.energy(r) >= self.energy_per_shot(r)
    }

    pub(crate) fn recharge(&self, r: &mut impl AsMut<Runtime>) {
        self.with_reactor_mut(r, |a| a.recharge());
    }

    /// Move or bump into the character at the destination.
    ///
    /// Peaceful steps never attack. Returns whether the character did
    /// anything. A zero step counts as standing still.
    pub(crate) fn step(
        &self,
        r: &mut impl AsMut<Runtime>,
        dir: IVec2,
        peaceful: bool,
    ) -> bool {
        let r = r.as_mut();
        let Some(loc) = self.loc(r) else {
            return false;
        };
        if dir == IVec2::ZERO {
            return true;
        }

        let dest = loc + dir;
        if !dest.is_walkable(r) {
            return false;
        }
        let blocker =
            dest.entities_at(r).find(|e| e != self && e.obstructs(r));
        match blocker {
            None => {
                self.place(r, dest);
                true
            }
            Some(target) if !peaceful => {
                self.attack(r, &target, false);
                true
            }
            Some(_) => false,
        }
    }

    /// Whether a character of this kind would want to use the item.
    pub fn is_usable(&self, r: &impl AsRef<Runtime>, item: &Entity) -> bool {
        matches!(item.item_kind(r), Some(ItemKind::Battery(_)))
            && self.reactor(r).is_some()
    }
}
