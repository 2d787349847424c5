use crate::fov::Geometry;

/// Points on a square ring expressed in polar coordinates.
///
/// A ring at radius `r` (Chebyshev distance from origin) has `8r` cells.
/// The cells are indexed starting from the bottom right (r, r) corner and
/// going counterclockwise, cell `i` spanning positions `[i - 0.5, i + 0.5)`.
///
/// ```notrust
/// |-----+-----+-----|
/// |     |     |     |
/// |     |     |     |
/// |     |     |     |
/// |-----+-----+-----|
/// |     |     |  ^  |
/// |     | 0,0 |  :  -  a = 1.0
/// |     |     |  :  |
/// |-----+-----+-----|
/// |     |     | \:  |
/// |     | >...|..\  -  a = 0.0
/// |     |     |   \ |
/// |-----+--|--+-----|
///
///        a = 7.0
/// ```
#[derive(Copy, Clone, PartialEq)]
pub struct SquareGeometry<V> {
    /// From -0.5 to 8r - 0.5 to encompass the ring.
    pos: f32,
    /// How many cells away from origin we are.
    ///
    /// Perimeter is 8 * radius.
    radius: u32,

    phantom: std::marker::PhantomData<V>,
}

impl<V> SquareGeometry<V> {
    /// Index of the cell along the ring that contains this point.
    fn winding_index(self) -> i32 {
        (self.pos + 0.5).floor() as i32
    }

    fn end_index(self) -> i32 {
        (self.pos + 0.5).ceil() as i32
    }
}

impl<V: From<[i32; 2]> + Copy + Clone> Geometry for SquareGeometry<V> {
    type Vector = V;

    fn unit_circle_endpoints() -> (Self, Self) {
        (
            SquareGeometry {
                pos: -0.5,
                radius: 1,
                phantom: Default::default(),
            },
            SquareGeometry {
                pos: 7.5,
                radius: 1,
                phantom: Default::default(),
            },
        )
    }

    fn is_below(&self, other: &Self) -> bool {
        self.winding_index() < other.end_index()
    }

    fn to_v2(&self) -> Self::Vector {
        let index = self.winding_index();

        let r = self.radius as i32;
        let quadrant = index.rem_euclid(8 * r) / (2 * r);
        let a = index.rem_euclid(2 * r);

        match quadrant {
            0 => Self::Vector::from([r, r - a]),
            1 => Self::Vector::from([r - a, -r]),
            2 => Self::Vector::from([-r, a - r]),
            3 => Self::Vector::from([a - r, r]),
            _ => unreachable!(),
        }
    }

    fn expand(&self) -> Self {
        let r = self.radius as f32;
        SquareGeometry {
            pos: self.pos * (r + 1.0) / r,
            radius: self.radius + 1,
            phantom: Default::default(),
        }
    }

    fn advance(&mut self) {
        self.pos = (self.pos + 0.5).floor() + 0.5;
    }
}
