//! Mobs figuring out what to do on their own.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// How a character acts once the player has spotted it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Stumble around, attacking whatever gets bumped into.
    Brainless,
    /// Walk up to the player and fight in melee.
    Basic,
    /// Shoot the player from a distance.
    Ranger,
    /// Fight while the shield holds, run away when it's down.
    Fencer,
}

/// AI state of a character.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    pub behavior: Option<Behavior>,
    /// Who the character is fighting, looked up when first needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<Entity>,
}

impl Brain {
    pub fn new(behavior: Behavior) -> Self {
        Brain {
            behavior: Some(behavior),
            opponent: None,
        }
    }
}

impl Entity {
    pub fn behavior(&self, r: &impl AsRef<Runtime>) -> Option<Behavior> {
        self.get::<Brain>(r).behavior
    }

    /// Act for one turn. Performs at most one move or one attack.
    pub(crate) fn take_turn(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        let Some(behavior) = self.behavior(r) else {
            return;
        };
        if self.is_dead(r) || !self.is_alive(r) {
            return;
        }

        // Characters the player hasn't seen yet just mill about.
        if !self.is_discovered(r) {
            self.wander(r, true);
            return;
        }

        match behavior {
            Behavior::Brainless => self.wander(r, false),
            Behavior::Basic => self.pursue(r),
            Behavior::Ranger => self.snipe(r),
            Behavior::Fencer => {
                if self.energy(r) > 0.0 {
                    self.pursue(r);
                } else {
                    self.flee(r);
                }
            }
        }
    }

    /// Opponent if it's on the same floor, looked up and cached on first
    /// use.
    fn opponent(
        &self,
        r: &mut Runtime,
    ) -> Option<(Location, Entity, Location)> {
        let loc = self.loc(r)?;
        let cached = self.get::<Brain>(r).opponent;

        let opponent = match cached {
            Some(e) => e,
            None => {
                let rr = &*r;
                let found = rr
                    .placement
                    .entities_on(loc.depth)
                    .find(|e| e.is_player(rr))?;
                self.with_mut(r, |b: &mut Brain| b.opponent = Some(found));
                found
            }
        };

        let dest = opponent.loc(r)?;
        (dest.depth == loc.depth).then_some((loc, opponent, dest))
    }

    fn wander(&self, r: &mut Runtime, peaceful: bool) {
        let dir = r.rng.random_step();
        self.step(r, dir, peaceful);
    }

    /// Take the first step along the path to `dest`.
    fn approach(&self, r: &mut Runtime, loc: Location, dest: Location) {
        let path = r.path(loc, dest);
        if let Some(&next) = path.first() {
            self.step(r, next - loc.pos, true);
        }
    }

    fn pursue(&self, r: &mut Runtime) {
        let Some((loc, target, dest)) = self.opponent(r) else {
            self.wander(r, true);
            return;
        };

        if loc.distance(&dest).is_some_and(|d| d <= 1) {
            self.attack(r, &target, false);
        } else {
            self.approach(r, loc, dest);
        }
    }

    fn snipe(&self, r: &mut Runtime) {
        let Some((loc, target, dest)) = self.opponent(r) else {
            self.wander(r, true);
            return;
        };
        let dist = loc.distance(&dest).unwrap_or(i32::MAX);

        if dist <= 1 {
            self.attack(r, &target, false);
            return;
        }

        let in_sight = r
            .floor(loc.depth)
            .is_some_and(|f| f.has_clear_line(loc.pos, dest.pos));
        if dist > self.max_range(r) || !in_sight || !self.can_shoot(r) {
            self.approach(r, loc, dest);
        } else {
            self.attack(r, &target, true);
        }
    }

    fn flee(&self, r: &mut Runtime) {
        let Some((loc, target, dest)) = self.opponent(r) else {
            self.wander(r, true);
            return;
        };

        for dir in retreat_steps(loc.pos - dest.pos) {
            if self.step(r, dir, true) {
                return;
            }
        }

        // Cornered.
        if loc.distance(&dest).is_some_and(|d| d <= 1) {
            self.attack(r, &target, false);
        }
    }
}

/// Steps that move away along `away`, best first.
///
/// Straight away first, then sideways variants that keep moving away on
/// one axis, then single-axis moves.
fn retreat_steps(away: IVec2) -> Vec<IVec2> {
    let (sx, sy) = (away.x.signum(), away.y.signum());
    match (sx, sy) {
        (0, 0) => Vec::new(),
        (0, sy) => vec![
            ivec2(0, sy),
            ivec2(1, sy),
            ivec2(-1, sy),
            ivec2(1, 0),
            ivec2(-1, 0),
        ],
        (sx, 0) => vec![
            ivec2(sx, 0),
            ivec2(sx, 1),
            ivec2(sx, -1),
            ivec2(0, 1),
            ivec2(0, -1),
        ],
        (sx, sy) => vec![
            ivec2(sx, sy),
            ivec2(sx, -sy),
            ivec2(-sx, sy),
            ivec2(sx, 0),
            ivec2(0, sy),
        ],
    }
}
