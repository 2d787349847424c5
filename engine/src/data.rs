//! Static game content.

use std::{collections::BTreeMap, sync::LazyLock};

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use strum::IntoEnumIterator;
use util::IndexMap;

use crate::{
    ai::Behavior,
    config::Background,
    item::{Armor, Battery, EquippedAt, ItemKind, Ranged, Reactor, Weapon},
};

/// Depth-indexed weighted spawn tables.
pub type LeveledList = BTreeMap<usize, IndexMap<String, u32>>;

#[derive(Clone, Debug, Deserialize)]
pub struct Data {
    pub characters: IndexMap<String, CharacterData>,
    pub items: Items,
    pub inventories: IndexMap<String, Kit>,
    pub leveled_lists: LeveledLists,
}

// The data.json.z file is constructed from project data files by engine
// crate's build.rs script.
static DATA: LazyLock<Result<Data, String>> = LazyLock::new(|| {
    let bytes = fdeflate::decompress_to_vec(include_bytes!(concat!(
        env!("OUT_DIR"),
        "/data.json.z"
    )))
    .map_err(|e| format!("corrupt data blob: {e:?}"))?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
});

impl Data {
    /// Baked game data.
    ///
    /// Panics if the baked data doesn't parse, the build is broken then.
    pub fn get() -> &'static Data {
        match &*DATA {
            Ok(data) => data,
            Err(e) => panic!("Data::get: {e}"),
        }
    }

    /// Load and validate the baked data.
    pub fn load() -> Result<&'static Data> {
        let data = match &*DATA {
            Ok(data) => data,
            Err(e) => bail!("failed to parse game data: {e}"),
        };
        data.validate()?;
        Ok(data)
    }

    /// Check that every identifier the data refers to exists.
    pub fn validate(&self) -> Result<()> {
        let player = self
            .characters
            .get(PLAYER)
            .context("missing player character template")?;
        ensure!(player.ai.is_none(), "player template must not have ai");

        for (id, c) in &self.characters {
            ensure!(c.life > 0, "character {id} has no life");
            if let Some(kit) = &c.inventory {
                ensure!(
                    self.inventories.contains_key(kit),
                    "character {id} has unknown inventory {kit}"
                );
            }
        }

        for background in Background::iter() {
            ensure!(
                self.inventories.contains_key(background.as_ref()),
                "no kit for background {}",
                background.as_ref()
            );
        }

        for (id, kit) in &self.inventories {
            for (slot, item) in [
                (EquippedAt::Weapon, &kit.weapon),
                (EquippedAt::Armor, &kit.armor),
                (EquippedAt::Reactor, &kit.reactor),
            ] {
                let Some(item) = item else { continue };
                let (_, _, kind) = self
                    .item(item)
                    .with_context(|| format!("kit {id}: no item {item}"))?;
                ensure!(
                    kind.slot() == slot,
                    "kit {id}: {item} doesn't go in {slot:?} slot"
                );
            }
            for item in &kit.other {
                ensure!(
                    self.item(item).is_some(),
                    "kit {id}: no item {item}"
                );
            }
        }

        for (name, list, is_item) in [
            ("enemies", &self.leveled_lists.enemies, false),
            ("items", &self.leveled_lists.items, true),
        ] {
            ensure!(
                list.contains_key(&0),
                "leveled list {name} has no table for depth 0"
            );
            for (depth, table) in list {
                ensure!(!table.is_empty(), "{name}/{depth} is empty");
                for (id, &weight) in table {
                    ensure!(weight > 0, "{name}/{depth}/{id}: zero weight");
                    let found = if is_item {
                        self.item(id).is_some()
                    } else {
                        self.characters.contains_key(id)
                    };
                    ensure!(found, "{name}/{depth}: unknown entry {id}");
                }
            }
        }

        Ok(())
    }

    /// Look up an item of any category, returns name, icon and stats.
    pub fn item(&self, id: &str) -> Option<(&str, char, ItemKind)> {
        let items = &self.items;
        if let Some(e) = items.weapons.get(id) {
            Some((&e.name, e.icon, ItemKind::Weapon(e.stats.clone())))
        } else if let Some(e) = items.armor.get(id) {
            Some((&e.name, e.icon, ItemKind::Armor(e.stats.clone())))
        } else if let Some(e) = items.reactors.get(id) {
            Some((&e.name, e.icon, ItemKind::Reactor(e.stats.clone())))
        } else {
            items
                .batteries
                .get(id)
                .map(|e| (&*e.name, e.icon, ItemKind::Battery(e.stats.clone())))
        }
    }
}

/// Character template identifier for the player.
pub const PLAYER: &str = "PLAYER";

#[derive(Clone, Debug, Deserialize)]
pub struct CharacterData {
    pub name: String,
    pub icon: char,
    pub verb: String,
    pub level: i32,
    pub xp: i32,
    pub life: i32,
    pub damage: f32,
    pub defense: i32,
    pub attack_rate: i32,
    #[serde(default)]
    pub innate_ranged: Option<Ranged>,
    #[serde(default)]
    pub ai: Option<Behavior>,
    #[serde(default)]
    pub inventory: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Items {
    pub weapons: IndexMap<String, Entry<Weapon>>,
    pub armor: IndexMap<String, Entry<Armor>>,
    pub reactors: IndexMap<String, Entry<Reactor>>,
    pub batteries: IndexMap<String, Entry<Battery>>,
}

/// Item data common to every category.
#[derive(Clone, Debug, Deserialize)]
pub struct Entry<T> {
    pub name: String,
    pub icon: char,
    #[serde(flatten)]
    pub stats: T,
}

/// Starting equipment.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Kit {
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub armor: Option<String>,
    #[serde(default)]
    pub reactor: Option<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LeveledLists {
    pub enemies: LeveledList,
    pub items: LeveledList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_data() {
        let data = Data::load().unwrap();
        assert!(data.characters.contains_key(PLAYER));
        for background in Background::iter() {
            assert!(data.inventories.contains_key(background.as_ref()));
        }
    }

    #[test]
    fn flattened_items() {
        let data = Data::get();
        let (name, icon, kind) = data.item("PISTOL_1").unwrap();
        assert_eq!(name, "pistol");
        assert_eq!(icon, '{');
        let ItemKind::Weapon(w) = kind else {
            panic!("pistol is not a weapon");
        };
        assert!(w.quick_draw);
        assert_eq!(w.ranged.unwrap().rate, 1);

        let (_, _, kind) = data.item("RANGER_1").unwrap();
        let ItemKind::Reactor(r) = kind else {
            panic!("not a reactor");
        };
        assert_eq!(r.charge, 0.0);
        assert_eq!(r.max_charge, 10.0);
        assert!(data.item("NOPE").is_none());
    }

    #[test]
    fn bad_references_fail() {
        let mut data = Data::get().clone();
        data.inventories
            .get_mut("GRUNT")
            .unwrap()
            .other
            .push("NOPE".into());
        assert!(data.validate().is_err());

        let mut data = Data::get().clone();
        data.inventories.get_mut("GRUNT").unwrap().weapon =
            Some("ARMOR_1".into());
        assert!(data.validate().is_err());

        let mut data = Data::get().clone();
        data.leveled_lists.enemies.remove(&0);
        assert!(data.validate().is_err());

        let mut data = Data::get().clone();
        data.characters.shift_remove(PLAYER);
        assert!(data.validate().is_err());
    }
}
