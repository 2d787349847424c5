use rand::Rng;
use serde::{Deserialize, Serialize};

/// Distributions defined by a domain of [0.0, 1.0]. A lot like general random
/// distributions, but you can plot the contents on a graph.
pub trait PlottedDistribution {
    type Item;

    /// Sample the distribution using a value between 0 and 1.
    ///
    /// This maps to the whole probability space of the distribution.
    fn plot(&self, x: f32) -> Self::Item;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Item {
        self.plot(rng.gen::<f32>())
    }
}

/// Triangular distribution that peaks at `mode` and tapers off to zero at
/// `min` and `max`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangular {
    pub min: f32,
    pub mode: f32,
    pub max: f32,
}

impl Triangular {
    pub fn new(min: f32, mode: f32, max: f32) -> Self {
        assert!(min <= mode && mode <= max, "Triangular: bad parameters");
        Triangular { min, mode, max }
    }
}

impl PlottedDistribution for Triangular {
    type Item = f32;

    fn plot(&self, x: f32) -> f32 {
        let Triangular { min, mode, max } = *self;
        let span = max - min;
        if span <= 0.0 {
            return min;
        }

        // Inverse of the cumulative distribution function.
        let pivot = (mode - min) / span;
        if x < pivot {
            min + (x * span * (mode - min)).sqrt()
        } else {
            max - ((1.0 - x) * span * (max - mode)).sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn triangular_plot() {
        let t = Triangular::new(2.0, 5.0, 8.0);
        assert_eq!(t.plot(0.0), 2.0);
        assert!((t.plot(0.5) - 5.0).abs() < 1e-4);
        assert!((t.plot(1.0) - 8.0).abs() < 1e-4);

        let degenerate = Triangular::new(3.0, 3.0, 3.0);
        assert_eq!(degenerate.plot(0.7), 3.0);
    }

    #[quickcheck]
    fn triangular_in_bounds(x: u16) -> bool {
        let t = Triangular::new(2.0, 5.0, 8.0);
        let y = t.plot(x as f32 / u16::MAX as f32);
        (2.0..=8.0).contains(&y)
    }
}
