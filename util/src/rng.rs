use std::{fmt, hash::Hash};
use std::{hash::Hasher, str::FromStr};

use anyhow::bail;
use derive_more::Deref;
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Construct a throwaway random number generator seeded by a noise value.
///
/// Good for short-term use in immutable contexts given a varying source of
/// noise like map position coordinates.
pub fn srng(seed: &(impl Hash + ?Sized)) -> XorShiftRng {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    XorShiftRng::seed_from_u64(h.finish())
}

/// Strings that are normalized to be case, whitespace and punctuation
/// insensitive. Use as RNG seeds so that trivial transcription errors like an
/// added space can't mess up the seed.
///
/// ```
/// # use util::{Logos, srng};
/// use rand::prelude::*;
///
/// assert_ne!(
///   srng("pAss Word").gen_range(0..1000),
///   srng("password").gen_range(0..1000));
///
/// assert_eq!(
///   srng(&Logos::new("pAss Word")).gen_range(0..1000),
///   srng(&Logos::new("password")).gen_range(0..1000));
///
/// assert_ne!(
///   srng(&Logos::new("pAss Word 123")).gen_range(0..1000),
///   srng(&Logos::new("password")).gen_range(0..1000));
///
/// assert_eq!(
///   srng(&Logos::new("!@#'")).gen_range(0..1000),
///   srng(&Logos::new(" ")).gen_range(0..1000));
/// ```
#[derive(
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    Deref,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Logos(String);

impl fmt::Display for Logos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromIterator<char> for Logos {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        const MAX_LEN: usize = 64;

        Logos(
            iter.into_iter()
                .map(|c| c.to_ascii_uppercase())
                .filter(char::is_ascii_alphanumeric)
                .take(MAX_LEN)
                .collect(),
        )
    }
}

impl Logos {
    /// Construct a new logos, stripping out punctuation, whitespace,
    /// character case and non-ASCII characters from the input.
    pub fn new(s: impl AsRef<str>) -> Self {
        s.as_ref().chars().collect()
    }

    /// Generate a random logos of `len` characters.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Logos {
        (0..len)
            .map(|_| {
                *b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ".choose(rng).unwrap()
                    as char
            })
            .collect()
    }
}

impl FromStr for Logos {
    type Err = anyhow::Error;

    /// Parse with the same normalization as [`Logos::new`]. Fails only
    /// when nothing of a non-empty input survives.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ret = Logos::new(s);
        if ret.0.is_empty() && !s.is_empty() {
            bail!("not a valid logos: {s:?}")
        }
        Ok(ret)
    }
}

pub trait RngExt {
    /// Roll a uniform `[0, 1)` value against `p`.
    ///
    /// Unlike `Rng::gen_bool`, `p` may lie outside the unit interval. Values
    /// at or below zero never succeed and values above one always do.
    fn roll(&mut self, p: f32) -> bool;

    /// Random step offset with both axes in `-1..=1`.
    fn random_step(&mut self) -> glam::IVec2;
}

impl<T: Rng + ?Sized> RngExt for T {
    fn roll(&mut self, p: f32) -> bool {
        self.gen::<f32>() < p
    }

    fn random_step(&mut self) -> glam::IVec2 {
        glam::ivec2(self.gen_range(-1..=1), self.gen_range(-1..=1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_outside_unit_interval() {
        let mut rng = srng("roll");
        for _ in 0..1000 {
            assert!(rng.roll(1.5));
            assert!(!rng.roll(0.0));
            assert!(!rng.roll(-0.3));
        }
    }

    #[test]
    fn parsing_normalizes() {
        assert_eq!("my seed".parse::<Logos>().unwrap(), Logos::new("MYSEED"));
        assert_eq!("Abc-123".parse::<Logos>().unwrap().to_string(), "ABC123");
        assert!("!?".parse::<Logos>().is_err());
        assert_eq!("".parse::<Logos>().unwrap(), Logos::default());
    }

    #[test]
    fn random_step_range() {
        let mut rng = srng("step");
        for _ in 0..1000 {
            let v = rng.random_step();
            assert!((-1..=1).contains(&v.x) && (-1..=1).contains(&v.y));
        }
    }
}
