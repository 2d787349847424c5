pub use crate::{
    Direction, Entity, Location, Runtime, ScenarioStatus, Settings,
};
pub use glam::{ivec2, IVec2};
pub use util::{
    HashMap, HashSet, IndexMap, IndexSet, RngExt, VecExt, DIR_4, DIR_8,
};
