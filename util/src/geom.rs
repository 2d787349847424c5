use glam::{ivec2, IVec2};

/// 8 directions, clock face order.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

/// 4 directions, clock face order.
pub const DIR_4: [IVec2; 4] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 0]),
];

pub trait VecExt: Sized + Default {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Absolute size of vector in chessboard metric, the number of king
    /// moves needed to cover it.
    fn chess_len(&self) -> i32;

    /// Vec points to one of the 8 cells surrounding origin.
    fn is_adjacent(&self) -> bool {
        self.chess_len() == 1
    }

    /// Whether the vector is a pure diagonal step.
    fn is_diagonal_step(&self) -> bool;
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self[0].abs() + self[1].abs()
    }

    fn chess_len(&self) -> i32 {
        self[0].abs().max(self[1].abs())
    }

    fn is_diagonal_step(&self) -> bool {
        self[0].abs() == 1 && self[1].abs() == 1
    }
}

/// Points on a line from `a` up to but not including `b`.
pub fn bresenham_line(
    a: impl Into<IVec2>,
    b: impl Into<IVec2>,
) -> impl Iterator<Item = IVec2> {
    let (a, b): (IVec2, IVec2) = (a.into(), b.into());

    let d = b - a;
    let step = d.signum();
    let d = d.abs() * ivec2(1, -1);
    let mut p = a;
    let mut err = d.x + d.y;

    std::iter::from_fn(move || {
        if p == b {
            None
        } else {
            let ret = p;

            let e2 = 2 * err;
            if e2 >= d.y {
                err += d.y;
                p.x += step.x;
            }
            if e2 <= d.x {
                err += d.x;
                p.y += step.y;
            }
            Some(ret)
        }
    })
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn metrics() {
        assert_eq!(ivec2(3, -5).taxi_len(), 8);
        assert_eq!(ivec2(3, -5).chess_len(), 5);
        assert!(ivec2(-1, 1).is_adjacent());
        assert!(ivec2(-1, 1).is_diagonal_step());
        assert!(!ivec2(0, 1).is_diagonal_step());
        assert!(!ivec2(2, 0).is_adjacent());
    }

    #[test]
    fn line_excludes_endpoint() {
        let line: Vec<IVec2> = bresenham_line([0, 0], [3, 0]).collect();
        assert_eq!(line, vec![ivec2(0, 0), ivec2(1, 0), ivec2(2, 0)]);
        assert_eq!(bresenham_line([2, 2], [2, 2]).count(), 0);
    }

    #[quickcheck]
    fn line_is_king_connected(a: (i8, i8), b: (i8, i8)) -> bool {
        let (a, b) = (ivec2(a.0 as i32, a.1 as i32), ivec2(b.0 as i32, b.1 as i32));
        let mut points: Vec<IVec2> = bresenham_line(a, b).collect();
        points.push(b);
        points.len() as i32 == (b - a).chess_len() + 1
            && points.windows(2).all(|w| (w[1] - w[0]).is_adjacent())
    }
}
