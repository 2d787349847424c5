use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use engine::{prelude::*, Background, ItemKind};
use util::{srng, GameRng, Logos};

pub const GAME_NAME: &str = "spiral";

/// Run a dungeon on autopilot and print what happened.
#[derive(Parser, Debug)]
#[command(name = GAME_NAME)]
struct Args {
    #[arg(long, value_parser = |e: &str| Ok::<Logos, &str>(Logos::new(e)), help = "Dungeon seed")]
    seed: Option<Logos>,

    #[arg(long, help = "Number of floors")]
    floors: Option<usize>,

    #[arg(long, help = "Player background")]
    background: Option<Background>,

    #[arg(long, help = "Player name")]
    name: Option<String>,

    #[arg(long, default_value_t = 200, help = "Maximum turns to play")]
    turns: u64,

    #[arg(long, help = "JSON settings file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Write the game to this file when done")]
    save: Option<PathBuf>,

    #[arg(long, help = "Continue a saved game instead of starting anew")]
    load: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut ret = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Default::default(),
        };

        ret.seed = match &self.seed {
            Some(seed) => seed.clone(),
            // A config file may have picked one already.
            None if self.config.is_some() => ret.seed,
            None => Logos::sample(&mut rand::thread_rng(), 10),
        };
        if let Some(floors) = self.floors {
            ret.floors = floors;
        }
        if let Some(background) = self.background {
            ret.background = background;
        }
        if let Some(name) = &self.name {
            ret.player_name = name.clone();
        }
        Ok(ret)
    }
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut r = match &args.load {
        Some(path) => {
            let blob = fs::read(path)
                .with_context(|| format!("can't read {}", path.display()))?;
            Runtime::load(&blob)?
        }
        None => Runtime::new(args.settings()?)?,
    };
    log::info!("seed: {}", r.settings().seed);

    let mut rng = srng(&(r.settings().seed.clone(), r.turn()));
    let start = r.turn();
    while r.status() == ScenarioStatus::Ongoing && r.turn() - start < args.turns
    {
        if !autoplay(&mut r, &mut rng) {
            log::warn!("player can't act, stopping");
            break;
        }
    }

    for line in r.log().history() {
        println!("{line}");
    }
    println!("{}", summary(&r));

    if let Some(path) = &args.save {
        fs::write(path, r.save()?)
            .with_context(|| format!("can't write {}", path.display()))?;
        log::info!("saved game to {}", path.display());
    }

    Ok(())
}

/// Take one player turn, return false if the player can't act.
fn autoplay(r: &mut Runtime, rng: &mut GameRng) -> bool {
    let Some(player) = r.player() else {
        return false;
    };
    let Some(loc) = player.loc(r) else {
        return false;
    };

    let enemy = nearest_enemy(r, loc);

    // Shoot first.
    if let Some(e) = enemy {
        if let Some(target) = e.loc(r) {
            if r.ranged_attack(target.pos) {
                return true;
            }
        }
    }

    // Top up when running low.
    if player.energy(r) < player.max_energy(r) / 2.0 {
        let rr = &*r;
        let battery = player
            .contents(rr)
            .find(|e| matches!(e.item_kind(rr), Some(ItemKind::Battery(_))));
        if let Some(battery) = battery {
            if r.use_item(battery) {
                return true;
            }
        }
    }

    if let Some(target) = enemy.and_then(|e| e.loc(r)) {
        if let Some(&next) = r.path(loc, target).first() {
            if r.move_player(next - loc.pos) {
                return true;
            }
        }
    }

    if loc.item_at(r).is_some() && r.pick_up_item() {
        return true;
    }

    if let Some(down) = r.floor(loc.depth).map(|f| f.down) {
        if loc.pos == down {
            if r.change_floor(Direction::Down) {
                return true;
            }
        } else if let Some(&next) =
            r.path(loc, Location::new(loc.depth, down)).first()
        {
            if r.move_player(next - loc.pos) {
                return true;
            }
        }
    }

    for _ in 0..8 {
        if r.move_player(rng.random_step()) {
            return true;
        }
    }
    r.move_player(IVec2::ZERO)
}

/// Closest live enemy the player can see right now.
fn nearest_enemy(r: &Runtime, loc: Location) -> Option<Entity> {
    r.entities_on(loc.depth)
        .filter(|e| e.is_character(r) && !e.is_player(r) && !e.is_dead(r))
        .filter_map(|e| Some((e, e.loc(r)?)))
        .filter(|(_, l)| l.is_visible(r))
        .min_by_key(|(_, l)| loc.distance(l).unwrap_or(i32::MAX))
        .map(|(e, _)| e)
}

fn summary(r: &Runtime) -> String {
    let Some(player) = r.player() else {
        return format!("No player after {} turns", r.turn());
    };
    let name = player.name(r);
    let floor = r.depth() + 1;
    match r.status() {
        ScenarioStatus::Ongoing => format!(
            "{name} is on floor {floor} after {} turns (level {}, life {})",
            r.turn(),
            player.level(r),
            player.life(r)
        ),
        ScenarioStatus::Escaped => format!(
            "{name} escaped the dungeon after {} turns at level {}",
            r.turn(),
            player.level(r)
        ),
        ScenarioStatus::Lost => {
            format!("{name} died on floor {floor} after {} turns", r.turn())
        }
    }
}
