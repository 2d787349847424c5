//! Player actions and turn resolution.
//!
//! Every action returns whether it took a turn. Actions that fail
//! validation change nothing.

use util::find_nearest;

use crate::{ecs::Kind, msg, prelude::*};

impl Runtime {
    /// The player, if the game is still on.
    ///
    /// Starting an action clears the presentation events of the previous
    /// one.
    fn begin(&mut self) -> Option<Entity> {
        if self.status != ScenarioStatus::Ongoing {
            return None;
        }
        let player = self.player?;
        if !player.is_alive(self) {
            return None;
        }
        self.log.clear_events();
        Some(player)
    }

    /// Step one cell or attack whoever is there. A zero vector waits a
    /// turn.
    pub fn move_player(&mut self, dir: IVec2) -> bool {
        if dir.chess_len() > 1 {
            return false;
        }
        let Some(player) = self.begin() else {
            return false;
        };

        if dir == IVec2::ZERO || player.step(self, dir, false) {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Fire the player's ranged attack at the character on `target`.
    pub fn ranged_attack(&mut self, target: IVec2) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        let Some(loc) = player.loc(self) else {
            return false;
        };
        let dest = Location::new(loc.depth, target);

        let Some(enemy) = dest.mob_at(self).filter(|e| *e != player) else {
            return false;
        };
        if !self.fov.contains(dest) {
            return false;
        }
        if !self
            .floor(loc.depth)
            .is_some_and(|f| f.has_clear_line(loc.pos, dest.pos))
        {
            return false;
        }
        if !player.can_shoot(self) {
            return false;
        }

        player.attack(self, &enemy, true);
        self.commit();
        true
    }

    /// Use a consumable from the player's inventory.
    pub fn use_item(&mut self, item: Entity) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        if player.use_item(self, &item) {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Equip an item from the player's inventory.
    ///
    /// Quick-draw weapons are equipped without spending the turn, so this
    /// returns false for them even when the equip happened.
    pub fn equip_item(&mut self, item: Entity) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        let quick = item.is_quick_draw(self);
        if !player.equip(self, &item) {
            return false;
        }
        if quick {
            return false;
        }
        self.commit();
        true
    }

    pub fn unequip_item(&mut self, item: Entity) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        if player.unequip(self, &item) {
            self.commit();
            true
        } else {
            false
        }
    }

    pub fn drop_item(&mut self, item: Entity) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        if player.drop_item(self, &item) {
            self.commit();
            true
        } else {
            false
        }
    }

    pub fn pick_up_item(&mut self) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        if player.pick_up(self) {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Take the portal the player is standing on.
    ///
    /// Going up from the first floor leaves the dungeon and ends the game.
    pub fn change_floor(&mut self, dir: Direction) -> bool {
        let Some(player) = self.begin() else {
            return false;
        };
        let Some(loc) = player.loc(self) else {
            return false;
        };
        if !loc
            .entities_at(self)
            .any(|e| e.kind(self) == Kind::Portal(dir))
        {
            return false;
        }

        let depth = match dir {
            Direction::Up if loc.depth == 0 => {
                msg!(self, "{} escaped the dungeon", player.name(self));
                log::info!("player escaped on turn {}", self.turn);
                self.status = ScenarioStatus::Escaped;
                self.log.flush();
                self.turn += 1;
                return true;
            }
            Direction::Up => loc.depth - 1,
            Direction::Down if loc.depth + 1 >= self.floors.len() => {
                log::debug!("change_floor: no floor below {}", loc.depth);
                return false;
            }
            Direction::Down => loc.depth + 1,
        };

        let arrival = match dir {
            Direction::Up => self.floors[depth].down,
            Direction::Down => self.floors[depth].up,
        };
        let this = &*self;
        let Some(dest) = find_nearest(
            |l: &Location| l.walk_neighbors(this).collect::<Vec<_>>(),
            Location::new(depth, arrival),
            |l| l.is_open(this),
        ) else {
            return false;
        };

        player.place(self, dest);
        msg!(self, "{} entered floor {}", player.name(self), depth + 1);
        log::info!("player moved to floor {depth}");
        self.commit();
        true
    }

    /// Resolve the rest of the turn after the player has acted.
    fn commit(&mut self) {
        let depth = self.depth();

        let actors: Vec<Entity> = self
            .placement
            .entities_on(depth)
            .filter(|e| e.behavior(self).is_some())
            .collect();
        for e in actors {
            if self.status != ScenarioStatus::Ongoing {
                break;
            }
            // Might have died or moved during the loop.
            if e.is_dead(self) || e.loc(self).map(|l| l.depth) != Some(depth)
            {
                continue;
            }
            e.take_turn(self);
        }

        let shielded: Vec<Entity> = self
            .ecs
            .iter()
            .filter(|e| e.reactor(self).is_some())
            .collect();
        for e in shielded {
            e.recharge(self);
        }

        self.refresh_fov();
        self.log.flush();
        self.turn += 1;
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use util::srng;

    use super::*;
    use crate::{
        ecs::Discovered, formula, msg::Event, runtime::tests::arena,
        terrain::Terrain, Background, TURN_MARKER,
    };

    /// Spawn `id` at `pos` on the first floor and update the view.
    fn add_mob(r: &mut Runtime, id: &str, pos: IVec2) -> Entity {
        let e = r.spawn_character(id).unwrap();
        e.place(r, Location::new(0, pos));
        r.refresh_fov();
        e
    }

    fn discovered(r: &Runtime) -> HashSet<(usize, IVec2)> {
        r.floors()
            .iter()
            .flat_map(|f| {
                f.iter()
                    .filter(|(_, t)| t.discovered)
                    .map(move |(p, _)| (f.depth, p))
            })
            .collect()
    }

    /// Play random moves until the game ends or `turns` have passed.
    fn random_walk(
        r: &mut Runtime,
        turns: usize,
        mut check: impl FnMut(&Runtime),
    ) {
        let mut rng = srng("walk");
        for _ in 0..turns {
            if r.status() != ScenarioStatus::Ongoing {
                break;
            }
            let dir = DIR_8[rng.gen_range(0..8)];
            r.move_player(dir);
            check(r);
        }
    }

    #[test]
    fn discovery_is_monotonic() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        let mut known = discovered(&r);
        random_walk(&mut r, 300, |r| {
            let now = discovered(r);
            assert!(known.is_subset(&now));
            known = now;
        });
    }

    #[test]
    fn energy_stays_in_bounds() {
        let mut r = Runtime::new(Settings {
            background: Background::Agent,
            ..Default::default()
        })
        .unwrap();
        random_walk(&mut r, 300, |r| {
            for e in r.ecs.iter() {
                if let Some(a) = e.reactor(r) {
                    assert!(a.charge >= 0.0, "{}", e.name(r));
                    assert!(a.charge <= a.max_charge, "{}", e.name(r));
                }
            }
        });
    }

    #[test]
    fn waiting_takes_a_turn() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        assert!(r.move_player(IVec2::ZERO));
        assert_eq!(r.turn(), 1);
        assert!(r.log().history().last().unwrap().ends_with(TURN_MARKER));
        assert!(!r.move_player(ivec2(2, 0)));
        assert_eq!(r.turn(), 1);
    }

    #[test]
    fn bumping_a_wall_changes_nothing() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        let player = r.player().unwrap();

        // Find a spot next to a wall.
        let (spot, dir) = r.floors[0]
            .walkable_cells()
            .map(|p| Location::new(0, p))
            .filter(|l| l.mob_at(&r).is_none())
            .find_map(|l| {
                let d = DIR_8.iter().find(|&&d| !(l + d).is_walkable(&r))?;
                Some((l, *d))
            })
            .unwrap();
        player.place(&mut r, spot);
        r.log.push("pending message");

        let snapshot = |r: &Runtime| {
            let locs: Vec<(Entity, Option<Location>)> =
                r.entities_on(0).map(|e| (e, e.loc(r))).collect();
            let energy: Vec<f32> =
                r.ecs.iter().map(|e| e.energy(r)).collect();
            (
                locs,
                energy,
                r.log().pending().to_vec(),
                r.log().history().to_vec(),
                r.turn(),
            )
        };

        let before = snapshot(&r);
        assert!(!r.move_player(dir));
        assert_eq!(snapshot(&r), before);
    }

    #[test]
    fn leaving_through_the_top() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        // Player starts on the up portal.
        assert!(!r.change_floor(Direction::Down));
        assert!(r.change_floor(Direction::Up));
        assert_eq!(r.status(), ScenarioStatus::Escaped);
        assert!(r
            .log()
            .history()
            .last()
            .unwrap()
            .starts_with("Player escaped"));

        // Nothing works after the game is over.
        assert!(!r.move_player(IVec2::ZERO));
        assert!(!r.change_floor(Direction::Up));
    }

    #[test]
    fn descending_and_climbing() {
        let mut r = Runtime::new(Settings {
            floors: 2,
            ..Default::default()
        })
        .unwrap();
        let player = r.player().unwrap();

        let down = Location::new(0, r.floors[0].down);
        player.place(&mut r, down);
        assert!(r.change_floor(Direction::Down));
        let loc = player.loc(&r).unwrap();
        assert_eq!(loc.depth, 1);
        let arrival = Location::new(1, r.floors[1].up);
        assert!(loc.distance(&arrival).unwrap() <= 1);
        assert_eq!(r.visibility().depth(), 1);
        assert!(loc.is_discovered(&r));

        // No floor below the last one.
        let bottom = Location::new(1, r.floors[1].down);
        player.place(&mut r, bottom);
        let turn = r.turn();
        assert!(!r.change_floor(Direction::Down));
        assert_eq!(r.turn(), turn);

        let up = Location::new(1, r.floors[1].up);
        if up.mob_at(&r).is_none() {
            player.place(&mut r, up);
            assert!(r.change_floor(Direction::Up));
            assert_eq!(player.loc(&r).unwrap().depth, 0);
        }
    }

    #[test]
    fn quick_draw_is_free() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        let player = r.player().unwrap();
        // Officers carry a spare knife.
        let knife = player
            .contents(&r)
            .find(|e| e.is_quick_draw(&r) && !e.is_equipped(&r))
            .unwrap();
        assert!(!r.equip_item(knife));
        assert!(knife.is_equipped(&r));
        assert_eq!(r.turn(), 0);

        // Unequipping does take time.
        assert!(r.unequip_item(knife));
        assert_eq!(r.turn(), 1);
    }

    #[test]
    fn ranged_attack_needs_a_target() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        let player = r.player().unwrap();
        let pos = player.loc(&r).unwrap().pos;
        // Own cell and empty cells aren't targets.
        assert!(!r.ranged_attack(pos));
        assert!(!r.ranged_attack(pos + ivec2(100, 0)));
        assert_eq!(r.turn(), 0);
    }

    #[test]
    fn save_and_continue() {
        let mut r = Runtime::new(Settings::default()).unwrap();
        random_walk(&mut r, 30, |_| {});
        let mut r2 = Runtime::load(&r.save().unwrap()).unwrap();

        let mut rng = srng("continue");
        for _ in 0..30 {
            let dir = DIR_8[rng.gen_range(0..8)];
            assert_eq!(r.move_player(dir), r2.move_player(dir));
        }

        assert_eq!(r.turn(), r2.turn());
        assert_eq!(r.status(), r2.status());
        assert_eq!(r.floors(), r2.floors());
        assert_eq!(r.log().history(), r2.log().history());
        for depth in 0..r.floors().len() {
            let a: Vec<(String, Option<Location>)> = r
                .entities_on(depth)
                .map(|e| (e.name(&r), e.loc(&r)))
                .collect();
            let b: Vec<(String, Option<Location>)> = r2
                .entities_on(depth)
                .map(|e| (e.name(&r2), e.loc(&r2)))
                .collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn ranged_attack_hits_visible_target() {
        let (mut r, player) = arena(Background::Marksman);
        let blob = add_mob(&mut r, "BLOB_1", ivec2(9, 10));
        let (from, to) = (player.loc(&r).unwrap(), blob.loc(&r).unwrap());
        assert_eq!(player.energy(&r), 10.0);

        assert!(r.ranged_attack(to.pos));
        assert_eq!(r.turn(), 1);
        assert!(r.log().events().contains(&Event::Shot { from, to }));
        // Shot costs 2 with 0.5 recoil, then the turn recharges 0.5.
        assert_eq!(player.energy(&r), 9.0);
    }

    #[test]
    fn ranged_attack_rejects_out_of_sight() {
        let (mut r, player) = arena(Background::Marksman);
        let blob = add_mob(&mut r, "BLOB_1", ivec2(16, 10));
        let loc = blob.loc(&r).unwrap();
        assert!(!r.visibility().contains(loc));

        assert!(!r.ranged_attack(loc.pos));
        assert_eq!(r.turn(), 0);
        assert_eq!(player.energy(&r), 10.0);
        assert!(r.log().events().is_empty());
    }

    #[test]
    fn ranged_attack_rejects_blocked_line() {
        let (mut r, player) = arena(Background::Marksman);
        r.floors[0].set_terrain(ivec2(7, 10), Terrain::Wall);
        let blob = add_mob(&mut r, "BLOB_1", ivec2(9, 10));
        let (from, to) = (player.loc(&r).unwrap(), blob.loc(&r).unwrap());
        assert!(!r.floors[0].has_clear_line(from.pos, to.pos));

        assert!(!r.ranged_attack(to.pos));
        assert_eq!(r.turn(), 0);
        assert_eq!(player.energy(&r), 10.0);
    }

    #[test]
    fn ranged_attack_needs_energy() {
        let (mut r, player) = arena(Background::Marksman);
        let blob = add_mob(&mut r, "BLOB_1", ivec2(9, 10));
        let to = blob.loc(&r).unwrap();

        // Below the cost of one shot.
        player.with_reactor_mut(&mut r, |a| a.charge = 1.0);
        assert!(!player.can_shoot(&r));
        assert!(!r.ranged_attack(to.pos));
        assert_eq!(r.turn(), 0);
        assert_eq!(player.energy(&r), 1.0);

        player.with_reactor_mut(&mut r, |a| a.charge = 2.0);
        assert!(r.ranged_attack(to.pos));
    }

    #[test]
    fn hit_during_enemy_turns_skips_recharge() {
        // Waiting alone recharges.
        let (mut r, player) = arena(Background::Marksman);
        player.with_reactor_mut(&mut r, |a| a.charge = 8.0);
        assert!(r.move_player(IVec2::ZERO));
        assert_eq!(player.energy(&r), 8.5);

        let (mut r, player) = arena(Background::Marksman);
        let grunt = add_mob(&mut r, "GRUNT_1", ivec2(6, 10));
        grunt.set(&mut r, Discovered(true));
        player.with_reactor_mut(&mut r, |a| a.charge = 8.0);

        assert!(r.move_player(IVec2::ZERO));
        let hits = r
            .log()
            .events()
            .iter()
            .filter(|e| **e == Event::Hurt(player))
            .count();
        // Unencumbered knife against an encumbered target always hits.
        assert_eq!(hits, 2);

        let damage =
            formula::damage(grunt.melee_damage(&r), player.defense(&r));
        let expected = 8.0 - hits as f32 * damage;
        assert!((player.energy(&r) - expected).abs() < 1e-4);
        assert!(!player.reactor(&r).unwrap().hit_this_turn);
        assert!(!player.is_dead(&r));
    }
}
