//! Game logic layer machinery.

use serde::{Deserialize, Serialize};

/// How far can the player see.
pub const FOV_RADIUS: i32 = 8;

/// Width of every generated floor in cells.
pub const FLOOR_WIDTH: i32 = 40;

/// Height of every generated floor in cells.
pub const FLOOR_HEIGHT: i32 = 40;

/// How many floors a dungeon has unless configured otherwise.
pub const NUM_FLOORS: usize = 5;

mod ai;
pub use ai::{Behavior, Brain};

mod combat;

mod config;
pub use config::{Background, Settings, ShieldPolicy};

pub mod data;
pub use data::Data;

pub mod ecs;

mod entity;
pub use entity::Entity;

mod fov;
pub use crate::fov::Visibility;

pub mod formula;

mod item;
pub use item::{Armor, Battery, EquippedAt, ItemKind, Ranged, Reactor, Weapon};

mod location;
pub use location::{Direction, Location};

mod mapgen;
pub use mapgen::{Layout, Level, Room, Spawn};

mod mob;

mod msg;
pub use msg::{Event, Log, TURN_MARKER};

mod pathing;

mod placement;
pub use placement::{Place, Placement};

pub mod prelude;

mod runtime;
pub use runtime::Runtime;

mod terrain;
pub use terrain::{Floor, Terrain, Tile};

mod turn;

/// Whether the run is still going on.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStatus {
    #[default]
    Ongoing,
    /// The player left the dungeon through the top floor.
    Escaped,
    /// The player died.
    Lost,
}
