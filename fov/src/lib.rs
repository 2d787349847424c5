//! Generic recursive shadowcasting field of view.

mod fov;
pub use crate::fov::{Fov, Geometry, State};

mod square;
pub use square::SquareGeometry;

/// Field of view over a square grid with 8-connected rings.
pub type Square<T, V> = Fov<SquareGeometry<V>, T>;
