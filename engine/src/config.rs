//! Run configuration.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};
use util::{Logos, Triangular};

use crate::NUM_FLOORS;

/// Starting kit for the player.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Background {
    #[default]
    Officer,
    Marksman,
    Agent,
    Pointman,
    Gladiator,
}

/// What happens to damage that exceeds the remaining shield charge.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ShieldPolicy {
    /// A depleting hit is absorbed completely.
    #[default]
    DiscardExcess,
    /// Damage left over after the shield breaks hits flesh.
    CarryExcess,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub seed: Logos,
    pub floors: usize,
    pub player_name: String,
    pub background: Background,
    pub fov_radius: i32,
    pub shield_policy: ShieldPolicy,
    /// Clamp hit chances to the unit interval before rolling.
    pub clamp_hit_chance: bool,
    /// Path cost of a diagonal step relative to an orthogonal one.
    pub diagonal_cost: f32,
    /// Chance for each room outside the landing room to get an enemy.
    pub enemy_chance: f32,
    /// Number of items scattered on each floor.
    pub item_count: Triangular,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            seed: Logos::new("spiral"),
            floors: NUM_FLOORS,
            player_name: "Player".into(),
            background: Default::default(),
            fov_radius: crate::FOV_RADIUS,
            shield_policy: Default::default(),
            clamp_hit_chance: false,
            diagonal_cost: 1.01,
            enemy_chance: 0.3,
            item_count: Triangular::new(2.0, 5.0, 8.0),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("can't read {}", path.display()))?;
        let ret = serde_json::from_str(&text)
            .with_context(|| format!("bad settings in {}", path.display()))?;
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings() {
        let s: Settings = serde_json::from_str(
            r#"{ "floors": 3, "background": "Gladiator",
                 "shield_policy": "carry-excess" }"#,
        )
        .unwrap();
        assert_eq!(s.floors, 3);
        assert_eq!(s.background, Background::Gladiator);
        assert_eq!(s.shield_policy, ShieldPolicy::CarryExcess);
        assert_eq!(s.fov_radius, Settings::default().fov_radius);
        assert_eq!(s.diagonal_cost, 1.01);
    }

    #[test]
    fn seed_is_normalized_on_load() {
        let s: Settings =
            serde_json::from_str(r#"{ "seed": "my seed" }"#).unwrap();
        assert_eq!(s.seed, util::Logos::new("MYSEED"));
    }

    #[test]
    fn background_names() {
        assert_eq!(Background::Marksman.as_ref(), "Marksman");
        assert_eq!("pointman".parse::<Background>(), Ok(Background::Pointman));
    }
}
