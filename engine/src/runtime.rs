use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use util::{srng, GameRng};

use crate::{
    ai::Brain,
    data::{Data, Kit, PLAYER},
    ecs::*,
    fov::Visibility,
    mapgen::{self, Layout, Spawn},
    msg::Log,
    placement::Placement,
    prelude::*,
    terrain::Floor,
};

/// Main data container for game engine runtime.
#[derive(Serialize, Deserialize)]
pub struct Runtime {
    /// Number of turns committed so far.
    pub(crate) turn: u64,
    pub(crate) settings: Settings,
    pub(crate) player: Option<Entity>,
    pub(crate) floors: Vec<Floor>,
    pub(crate) ecs: Ecs,
    pub(crate) placement: Placement,
    pub(crate) rng: GameRng,
    pub(crate) log: Log,
    pub(crate) status: ScenarioStatus,
    #[serde(skip)]
    pub(crate) fov: Visibility,
}

impl AsRef<Runtime> for Runtime {
    fn as_ref(&self) -> &Runtime {
        self
    }
}

impl AsMut<Runtime> for Runtime {
    fn as_mut(&mut self) -> &mut Runtime {
        self
    }
}

impl Runtime {
    /// Generate a new dungeon and put the player at its entrance.
    pub fn new(settings: Settings) -> Result<Self> {
        let data = Data::load()?;
        if settings.floors == 0 {
            bail!("dungeon must have at least one floor");
        }

        let mut ret = Runtime {
            turn: 0,
            rng: srng(&settings.seed),
            settings,
            player: None,
            floors: Vec::new(),
            ecs: Default::default(),
            placement: Default::default(),
            log: Default::default(),
            status: Default::default(),
            fov: Default::default(),
        };

        for depth in 0..ret.settings.floors {
            let layout = mapgen::Level::new(depth, &ret.settings)
                .generate(&mut ret.rng)?;
            ret.populate(layout)?;
        }

        let background = ret.settings.background;
        let kit = data.inventories.get(background.as_ref()).with_context(
            || format!("no kit for background {}", background.as_ref()),
        )?;
        let player = ret.spawn_character(PLAYER)?;
        let name = ret.settings.player_name.clone();
        player.set(&mut ret, Name(name));
        player.outfit(&mut ret, kit)?;
        let entrance = Location::new(0, ret.floors[0].up);
        player.place(&mut ret, entrance);
        ret.player = Some(player);

        // Setup chatter isn't part of the game.
        ret.log = Log::new(&ret.settings.player_name);
        ret.refresh_fov();

        log::info!(
            "{} the {} enters a dungeon of {} floors (seed {})",
            ret.settings.player_name,
            background.as_ref(),
            ret.floors.len(),
            ret.settings.seed
        );
        Ok(ret)
    }

    /// Add a generated floor and its inhabitants.
    fn populate(&mut self, layout: Layout) -> Result<()> {
        let depth = layout.floor.depth;
        debug_assert_eq!(depth, self.floors.len());
        self.floors.push(layout.floor);

        for (pos, spawn) in layout.spawns {
            let e = match spawn {
                Spawn::Enemy(id) => self.spawn_character(&id)?,
                Spawn::Item(id) => self.spawn_item(&id)?,
                Spawn::Portal(dir) => {
                    let (name, icon) = match dir {
                        Direction::Up => ("stairs up", '<'),
                        Direction::Down => ("stairs down", '>'),
                    };
                    self.spawn((
                        Name(name.into()),
                        Icon(icon),
                        Kind::Portal(dir),
                    ))
                }
            };
            e.place(self, Location::new(depth, pos));
        }
        Ok(())
    }

    pub fn spawn(&mut self, bundle: impl hecs::DynamicBundle) -> Entity {
        Entity(self.ecs.spawn(bundle))
    }

    /// Create an unplaced item from its data identifier.
    pub fn spawn_item(&mut self, id: &str) -> Result<Entity> {
        let (name, icon, kind) = Data::get()
            .item(id)
            .with_context(|| format!("unknown item {id:?}"))?;
        Ok(self.spawn((Name(name.into()), Icon(icon), Kind::Item, kind)))
    }

    /// Create an unplaced character from its data identifier, carrying its
    /// equipment.
    pub fn spawn_character(&mut self, id: &str) -> Result<Entity> {
        let data = Data::get();
        let c = data
            .characters
            .get(id)
            .with_context(|| format!("unknown character {id:?}"))?;

        let kind = if id == PLAYER {
            ActorKind::Player
        } else {
            ActorKind::Enemy
        };
        let e = self.spawn((
            Name(c.name.clone()),
            Icon(c.icon),
            Kind::Actor(kind),
            Stats {
                verb: c.verb.clone(),
                damage: c.damage,
                defense: c.defense,
                attack_rate: c.attack_rate,
            },
            Level(c.level),
            Xp(c.xp),
            Life(c.life),
        ));
        e.set(self, InnateRanged(c.innate_ranged.clone()));
        if let Some(behavior) = c.ai {
            e.set(self, Brain::new(behavior));
        }

        if let Some(kit) = &c.inventory {
            let kit = data
                .inventories
                .get(kit)
                .with_context(|| format!("unknown kit {kit:?}"))?;
            e.outfit(self, kit)?;
        }
        Ok(e)
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    pub fn status(&self) -> ScenarioStatus {
        self.status
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn floor(&self, depth: usize) -> Option<&Floor> {
        self.floors.get(depth)
    }

    /// Floor the player is on.
    pub fn depth(&self) -> usize {
        self.player
            .and_then(|p| p.loc(self))
            .map_or(self.fov.depth(), |loc| loc.depth)
    }

    /// Entities on a floor in turn order.
    pub fn entities_on(
        &self,
        depth: usize,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.placement.entities_on(depth)
    }

    /// Serialize the game into a compressed blob.
    ///
    /// Visibility and presentation events are derived state and are left
    /// out.
    pub fn save(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self).context("serializing game")?;
        snap::raw::Encoder::new()
            .compress_vec(&json)
            .context("compressing save")
    }

    /// Restore a game from a blob made by [`Runtime::save`].
    pub fn load(blob: &[u8]) -> Result<Self> {
        Data::load()?;
        let json = snap::raw::Decoder::new()
            .decompress_vec(blob)
            .context("decompressing save")?;
        let mut ret: Runtime =
            serde_json::from_slice(&json).context("parsing save")?;
        if ret.floors.is_empty() {
            bail!("save has no floors");
        }
        ret.update_visibility();
        Ok(ret)
    }
}

impl Entity {
    /// Give a character the items of a kit, wearing everything that fits
    /// in a slot and with the reactor charged up.
    pub(crate) fn outfit(
        &self,
        r: &mut impl AsMut<Runtime>,
        kit: &Kit,
    ) -> Result<()> {
        let r = r.as_mut();
        for id in kit.weapon.iter().chain(&kit.armor).chain(&kit.reactor) {
            let item = r.spawn_item(id)?;
            item.place(r, *self);
            if let Some(kind) = item.item_kind(r) {
                item.set(r, kind.slot());
            }
        }
        for id in &kit.other {
            let item = r.spawn_item(id)?;
            item.place(r, *self);
        }
        self.with_reactor_mut(r, |a| a.fill());
        Ok(())
    }
}
