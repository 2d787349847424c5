//! Attack resolution, damage and death.

use crate::{
    ai::Brain, ecs::*, formula, item::EquippedAt, msg, msg::Event,
    prelude::*, ShieldPolicy,
};

impl Entity {
    /// Attack another character with melee or the ranged attack.
    ///
    /// The attack repeats for the attack rate. Weapon shots draw energy
    /// and the volley stops when the reactor runs dry.
    pub(crate) fn attack(
        &self,
        r: &mut impl AsMut<Runtime>,
        target: &Entity,
        is_ranged: bool,
    ) {
        let r = r.as_mut();

        let (Some(origin), Some(dest)) = (self.loc(r), target.loc(r)) else {
            return;
        };

        let attack = if is_ranged {
            self.ranged_damage(r)
        } else {
            self.melee_damage(r)
        };
        let damage = formula::damage(attack, target.defense(r));

        let (a_enc, d_enc) = (self.encumbrance(r), target.encumbrance(r));
        let mut chance = if is_ranged {
            let dist = origin.distance(&dest).unwrap_or(i32::MAX);
            formula::ranged_hit_chance(a_enc, d_enc, dist, self.range(r))
        } else {
            formula::melee_hit_chance(a_enc, d_enc)
        };
        if r.settings.clamp_hit_chance {
            chance = chance.clamp(0.0, 1.0);
        }

        let uses_energy = is_ranged && self.energy_per_shot(r) > 0.0;

        for _ in 0..self.attack_rate(r, is_ranged) {
            if uses_energy {
                if self.energy(r) < self.energy_per_shot(r) {
                    break;
                }
                let cost = self.net_shot_cost(r);
                self.with_reactor_mut(r, |a| {
                    a.charge = (a.charge - cost).max(0.0);
                });
            }

            if is_ranged {
                r.push_event(Event::Shot {
                    from: origin,
                    to: dest,
                });
            }

            if !r.rng.roll(chance) {
                r.push_event(Event::Miss(*target));
                continue;
            }

            msg!(
                r,
                "{} hit {} for {:.1} damage",
                self.name(r),
                target.name(r),
                damage
            );
            r.push_event(Event::Hurt(*target));
            target.take_damage(r, damage);

            if target.is_dead(r) {
                msg!(r, "{} killed {}", self.name(r), target.name(r));
                if self.is_player(r) {
                    let xp = target.xp(r);
                    self.gain_xp(r, xp);
                }
                break;
            }
        }
    }

    /// Apply damage, shields first and then flesh.
    pub(crate) fn take_damage(
        &self,
        r: &mut impl AsMut<Runtime>,
        damage: f32,
    ) {
        let r = r.as_mut();
        let policy = r.settings.shield_policy;

        let energy = self.energy(r);
        let flesh = if energy > 0.0 {
            if energy > damage {
                self.with_reactor_mut(r, |a| a.charge = energy - damage);
                None
            } else {
                self.with_reactor_mut(r, |a| {
                    a.charge = 0.0;
                    a.recovering = a.recovery;
                });
                msg!(r, "{} energy depleted", self.name(r));
                match policy {
                    ShieldPolicy::DiscardExcess => None,
                    ShieldPolicy::CarryExcess => Some(damage - energy),
                }
            }
        } else {
            Some(damage)
        };

        self.with_reactor_mut(r, |a| a.hit_this_turn = true);

        let Some(flesh) = flesh else {
            return;
        };

        let life = self.life(r);
        if formula::is_lethal(flesh, life, &mut r.rng) {
            self.die(r);
        } else if formula::is_injury(flesh, life, &mut r.rng) {
            msg!(r, "{} suffered an injury", self.name(r));
            self.set(r, Life(life - 1));
            if let Some(loc) = self.loc(r) {
                loc.decorate(r);
            }
            if life - 1 <= 0 {
                self.die(r);
            }
        }
    }

    /// Kill a character, leaving behind its belongings and a corpse.
    pub(crate) fn die(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        if self.is_dead(r) {
            return;
        }

        let loc = self.loc(r);
        self.set(r, IsDead(true));
        self.set(r, Life(0));
        self.set(r, Brain::default());

        if let Some(loc) = loc {
            let items: Vec<Entity> = self.contents(r).collect();
            for item in items {
                item.set(r, EquippedAt::None);
                item.place(r, loc);
            }

            let corpse = r.spawn((
                Name(format!("remains of {}", self.name(r))),
                Icon('%'),
                Kind::Corpse,
            ));
            corpse.place(r, loc);
            r.push_event(Event::Death(loc));
        }

        // Dead characters stay in the ECS so their state can still be
        // inspected, but leave the map.
        r.placement.remove(self);

        if self.is_player(r) {
            log::info!(
                "{} died on floor {}",
                self.name(r),
                loc.map_or(0, |l| l.depth)
            );
            r.status = ScenarioStatus::Lost;
        }
    }

    /// Add experience and level up when the threshold is reached.
    pub(crate) fn gain_xp(&self, r: &mut impl AsMut<Runtime>, amount: i32) {
        let r = r.as_mut();
        let mut xp = self.xp(r) + amount;
        let mut level = self.level(r);
        while xp >= 10 * level.max(1) {
            xp -= 10 * level.max(1);
            level += 1;
            msg!(r, "{} reached level {}", self.name(r), level);
        }
        self.set(r, Xp(xp));
        self.set(r, Level(level));
    }
}
