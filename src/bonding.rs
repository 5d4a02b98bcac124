//! Bond progression as seen by the combat engine.
//!
//! Bonding lives outside combat; the engine only consumes its result as a
//! multiplier on base stats (applied before stat derivation) and a small
//! bonus to the critical-hit chance.

use schema::BaseStats;
use serde::{Deserialize, Serialize};

pub const MAX_BOND_POINTS: u16 = 255;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BondLevel {
    #[default]
    Stranger,
    Acquaintance,
    Friend,
    CloseFriend,
    BestFriend,
    Soulbound,
    KindredSpirit,
}

impl BondLevel {
    pub fn from_points(points: u16) -> Self {
        match points.min(MAX_BOND_POINTS) {
            0..=19 => BondLevel::Stranger,
            20..=39 => BondLevel::Acquaintance,
            40..=79 => BondLevel::Friend,
            80..=119 => BondLevel::CloseFriend,
            120..=159 => BondLevel::BestFriend,
            160..=199 => BondLevel::Soulbound,
            _ => BondLevel::KindredSpirit,
        }
    }

    pub fn stat_multiplier(self) -> f64 {
        match self {
            BondLevel::Stranger => 1.0,
            BondLevel::Acquaintance => 1.02,
            BondLevel::Friend => 1.05,
            BondLevel::CloseFriend => 1.08,
            BondLevel::BestFriend => 1.10,
            BondLevel::Soulbound => 1.13,
            BondLevel::KindredSpirit => 1.15,
        }
    }

    /// Added to the engine's base critical-hit probability.
    pub fn critical_bonus(self) -> f64 {
        match self {
            BondLevel::Stranger => 0.0,
            BondLevel::Acquaintance => 0.01,
            BondLevel::Friend => 0.03,
            BondLevel::CloseFriend => 0.05,
            BondLevel::BestFriend => 0.08,
            BondLevel::Soulbound => 0.10,
            BondLevel::KindredSpirit => 0.15,
        }
    }

    /// Scale every base stat, flooring and saturating at `u8::MAX`.
    /// A base HP of 1 is left alone so fixed-HP combatants stay fixed.
    /// The epsilon keeps `100 * 1.15` from flooring to 114.
    pub fn apply_to_base(self, base: &BaseStats) -> BaseStats {
        let multiplier = self.stat_multiplier();
        let mut values = base.to_array();
        for (i, value) in values.iter_mut().enumerate() {
            if i == 0 && *value == 1 {
                continue;
            }
            *value = ((*value as f64) * multiplier + 1e-9).floor().min(u8::MAX as f64) as u8;
        }
        BaseStats::from_array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_map_to_levels() {
        assert_eq!(BondLevel::from_points(0), BondLevel::Stranger);
        assert_eq!(BondLevel::from_points(20), BondLevel::Acquaintance);
        assert_eq!(BondLevel::from_points(79), BondLevel::Friend);
        assert_eq!(BondLevel::from_points(80), BondLevel::CloseFriend);
        assert_eq!(BondLevel::from_points(199), BondLevel::Soulbound);
        assert_eq!(BondLevel::from_points(200), BondLevel::KindredSpirit);
        assert_eq!(BondLevel::from_points(u16::MAX), BondLevel::KindredSpirit);
    }

    #[test]
    fn bond_scales_base_stats_but_not_fixed_hp() {
        let base = BaseStats {
            hp: 1,
            attack: 100,
            defense: 50,
            sp_attack: 250,
            sp_defense: 10,
            speed: 40,
        };
        let scaled = BondLevel::KindredSpirit.apply_to_base(&base);
        assert_eq!(scaled.hp, 1);
        assert_eq!(scaled.attack, 115);
        assert_eq!(scaled.defense, 57);
        assert_eq!(scaled.sp_attack, 255);
        assert_eq!(scaled.speed, 46);
    }
}
