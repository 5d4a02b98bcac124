use crate::combatant::Combatant;
use schema::{BaseStats, MoveCategory, StatBlock, StatKind, StatusKind};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IV: u8 = 31;
pub const MAX_IV: u8 = 31;
pub const DEFAULT_IVS: [u8; 6] = [DEFAULT_IV; 6];
pub const DEFAULT_EVS: [u8; 6] = [0; 6];
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 100;
pub const MAX_STAGE: i8 = 6;

/// Personality modifier: +10% to one stat, -10% to another.
/// A nature that boosts and hinders the same stat is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nature {
    pub boosted: StatKind,
    pub hindered: StatKind,
}

impl Nature {
    pub fn multiplier(&self, stat: StatKind) -> f64 {
        if self.boosted == self.hindered {
            1.0
        } else if stat == self.boosted {
            1.1
        } else if stat == self.hindered {
            0.9
        } else {
            1.0
        }
    }
}

/// Derive the combat stat block from base stats, level, IVs and EVs.
///
/// HP = floor((2*base + iv + floor(ev/4)) * level / 100) + level + 5, except
/// a base HP of exactly 1 always yields 1.
/// Other = floor((floor((2*base + iv + floor(ev/4)) * level / 100) + 5) * nature)
///
/// Pure and deterministic: identical inputs always give identical output.
pub fn derive_stats(
    base: &BaseStats,
    level: u8,
    ivs: &[u8; 6],
    evs: &[u8; 6],
    nature: Option<Nature>,
) -> StatBlock {
    let base = base.to_array();
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL) as u32;
    let stat_order = [
        StatKind::Hp,
        StatKind::Attack,
        StatKind::Defense,
        StatKind::SpAttack,
        StatKind::SpDefense,
        StatKind::Speed,
    ];

    let mut stats = [0u16; 6];
    for (i, stat) in stat_order.into_iter().enumerate() {
        let core = 2 * base[i] as u32 + ivs[i].min(MAX_IV) as u32 + evs[i] as u32 / 4;
        let scaled = core * level / 100;

        let value = if stat == StatKind::Hp {
            if base[i] == 1 {
                1
            } else {
                scaled + level + 5
            }
        } else {
            let multiplier = nature.map_or(1.0, |n| n.multiplier(stat));
            (((scaled + 5) as f64) * multiplier + 1e-9).floor() as u32
        };

        stats[i] = value.min(u16::MAX as u32) as u16;
    }

    StatBlock::from_array(stats)
}

/// Stage multiplier: (2 + s) / 2 for positive stages, 2 / (2 - s) for negative.
pub fn stage_multiplier(stage: i8) -> f64 {
    let stage = stage.clamp(-MAX_STAGE, MAX_STAGE);
    if stage >= 0 {
        (2.0 + stage as f64) / 2.0
    } else {
        2.0 / (2.0 - stage as f64)
    }
}

fn apply_stat_stage_multiplier(base_stat: u16, stage: i8) -> u16 {
    if stage == 0 {
        return base_stat;
    }
    ((base_stat as f64) * stage_multiplier(stage)).round() as u16
}

/// Attack stat used for a move of the given category, including stages and
/// the burn penalty on physical attacks. Status moves use no attack stat.
pub fn effective_attack(combatant: &Combatant, category: MoveCategory) -> u16 {
    let (stat, burn_applies) = match category {
        MoveCategory::Physical => (StatKind::Attack, true),
        MoveCategory::Special => (StatKind::SpAttack, false),
        MoveCategory::Status => return 0,
    };

    let mut value = apply_stat_stage_multiplier(combatant.stats.get(stat), combatant.stat_stage(stat));
    if burn_applies && combatant.has_status(StatusKind::Burn) {
        value /= 2;
    }
    value.max(1)
}

/// Defense stat matching the move category, including stages.
pub fn effective_defense(combatant: &Combatant, category: MoveCategory) -> u16 {
    let stat = match category {
        MoveCategory::Physical => StatKind::Defense,
        MoveCategory::Special => StatKind::SpDefense,
        MoveCategory::Status => return 0,
    };
    apply_stat_stage_multiplier(combatant.stats.get(stat), combatant.stat_stage(stat)).max(1)
}

/// Speed used for turn ordering: stages applied, halved under paralysis.
pub fn effective_speed(combatant: &Combatant) -> u16 {
    let mut speed = apply_stat_stage_multiplier(
        combatant.stats.speed,
        combatant.stat_stage(StatKind::Speed),
    );
    if combatant.has_status(StatusKind::Paralysis) {
        speed /= 2;
    }
    speed
}
