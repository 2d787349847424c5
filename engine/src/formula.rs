//! Combat arithmetic.
//!
//! Hit chances are returned unclamped, values above 1 always hit and values
//! at or below 0 never do.

use rand::Rng;
use util::RngExt;

/// Ranged hit chance penalty per point of attacker encumbrance.
const RANGED_ENCUMBRANCE_PENALTY: f32 = 0.25;

/// Ranged hit chance penalty per cell beyond the rated range.
const RANGE_EXCEEDED_PENALTY: f32 = 0.3;

/// Melee hit chance penalty per point of attacker encumbrance.
const MELEE_ENCUMBRANCE_PENALTY: f32 = 0.1;

/// Hit chance bonus per point of defender encumbrance.
const DEFENDER_ENCUMBRANCE_BONUS: f32 = 0.1;

pub fn melee_hit_chance(attacker_enc: i32, defender_enc: i32) -> f32 {
    1.0 - MELEE_ENCUMBRANCE_PENALTY * attacker_enc as f32
        + DEFENDER_ENCUMBRANCE_BONUS * defender_enc as f32
}

pub fn ranged_hit_chance(
    attacker_enc: i32,
    defender_enc: i32,
    distance: i32,
    range: i32,
) -> f32 {
    let exceeded = (distance - range).max(0);
    1.0 - RANGED_ENCUMBRANCE_PENALTY * attacker_enc as f32
        - RANGE_EXCEEDED_PENALTY * exceeded as f32
        + DEFENDER_ENCUMBRANCE_BONUS * defender_enc as f32
}

/// Distance beyond which an unencumbered target can't be hit at all.
pub fn max_range(encumbrance: i32, peak_range: i32) -> i32 {
    let penalty = RANGED_ENCUMBRANCE_PENALTY * encumbrance as f32;
    ((penalty - 1.0) / -RANGE_EXCEEDED_PENALTY + peak_range as f32).floor()
        as i32
}

/// Damage left after defense, rounded to one decimal.
///
/// Defense reduces damage logarithmically and the reduction shrinks as the
/// attack grows.
pub fn damage(attack: f32, defense: i32) -> f32 {
    if attack <= 0.0 {
        return 0.0;
    }
    let reduction = 3.0 * (defense as f32 / 20.0 + 1.0).ln() / (attack + 1.0).ln();
    let ret = (attack * (1.0 - reduction)).max(0.0);
    (ret * 10.0).round() / 10.0
}

/// Roll whether flesh damage kills outright.
pub fn is_lethal(damage: f32, life: i32, rng: &mut impl Rng) -> bool {
    if life <= 0 {
        return true;
    }
    rng.roll(damage / life as f32)
}

/// Roll whether flesh damage that didn't kill causes an injury.
pub fn is_injury(damage: f32, life: i32, rng: &mut impl Rng) -> bool {
    if life <= 0 {
        return true;
    }
    rng.roll(damage * 3.0 / life as f32)
}
