//! Unopinionated standalone utilities.

mod distribution;
pub use distribution::{PlottedDistribution, Triangular};

mod geom;
pub use geom::{bresenham_line, VecExt, DIR_4, DIR_8};

mod path;
pub use path::{dijkstra_map, find_nearest};

mod rng;
pub use rng::{srng, Logos, RngExt};

pub mod text;
pub use text::StrExt;

pub type FastHasher = rustc_hash::FxHasher;

/// Map with an efficient hash function.
pub use rustc_hash::FxHashMap as HashMap;

/// Set with an efficient hash function.
pub use rustc_hash::FxHashSet as HashSet;

type DefaultHashBuilder = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion order preserving map with an efficient hash function.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, DefaultHashBuilder>;

/// Insertion order preserving set with an efficient hash function.
pub type IndexSet<V> = indexmap::IndexSet<V, DefaultHashBuilder>;

/// Good default concrete rng.
pub type GameRng = rand_xorshift::XorShiftRng;
