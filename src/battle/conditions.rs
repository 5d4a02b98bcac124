use crate::battle::state::BattleRng;
use crate::battle::stats::MAX_STAGE;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use schema::{StatKind, StatusKind};
use serde::{Deserialize, Serialize};

/// Duration value for effects that last until explicitly cured.
pub const PERSISTENT: i32 = -1;

/// A status effect attached to a combatant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Rounds left, or `PERSISTENT`.
    pub remaining: i32,
}

impl StatusEffect {
    /// An instance with the registry's default duration.
    pub fn new(kind: StatusKind) -> Self {
        Self {
            kind,
            remaining: default_duration(kind),
        }
    }

    /// Persistent kinds ignore the requested duration.
    pub fn with_duration(kind: StatusKind, remaining: i32) -> Self {
        let remaining = if is_persistent(kind) {
            PERSISTENT
        } else {
            remaining.max(1)
        };
        Self { kind, remaining }
    }

    pub fn is_persistent(&self) -> bool {
        self.remaining == PERSISTENT
    }
}

/// Whether a status stops its holder from acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRule {
    Never,
    /// Always blocks; submissions for the holder are rejected.
    Always,
    /// Blocks with the given percent chance, rolled when the action resolves.
    Chance(u8),
}

/// How a new application interacts with effects already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackingRule {
    /// At most one major ailment at a time.
    ExclusiveMajor,
    /// At most one instance of the kind.
    Unique,
    /// Stages add up per stat; reapplying refreshes the duration.
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Resisted,
}

pub fn is_major(kind: StatusKind) -> bool {
    matches!(
        kind,
        StatusKind::Burn
            | StatusKind::Poison
            | StatusKind::Paralysis
            | StatusKind::Freeze
            | StatusKind::Sleep
    )
}

pub fn is_blocking(kind: StatusKind) -> bool {
    matches!(
        kind,
        StatusKind::Sleep | StatusKind::Freeze | StatusKind::Paralysis | StatusKind::Stun
    )
}

pub fn block_rule(kind: StatusKind, config: &BattleConfig) -> BlockRule {
    match kind {
        StatusKind::Sleep | StatusKind::Freeze | StatusKind::Stun => BlockRule::Always,
        StatusKind::Paralysis => BlockRule::Chance(config.paralysis_block_chance),
        _ => BlockRule::Never,
    }
}

/// Persistent effects carry duration -1 and only clear through a cure.
pub fn is_persistent(kind: StatusKind) -> bool {
    matches!(
        kind,
        StatusKind::Burn | StatusKind::Freeze | StatusKind::Paralysis | StatusKind::Poison
    )
}

pub fn default_duration(kind: StatusKind) -> i32 {
    match kind {
        StatusKind::Burn | StatusKind::Freeze | StatusKind::Paralysis | StatusKind::Poison => {
            PERSISTENT
        }
        StatusKind::Sleep | StatusKind::Confusion => 3,
        StatusKind::Stun | StatusKind::Protect => 1,
        StatusKind::StatModifier { .. } => 5,
    }
}

pub fn stacking_rule(kind: StatusKind) -> StackingRule {
    match kind {
        StatusKind::StatModifier { .. } => StackingRule::Cumulative,
        k if is_major(k) => StackingRule::ExclusiveMajor,
        _ => StackingRule::Unique,
    }
}

/// Statuses whose arrival or removal changes effective speed.
pub fn affects_speed(kind: StatusKind) -> bool {
    matches!(
        kind,
        StatusKind::Paralysis
            | StatusKind::StatModifier {
                stat: StatKind::Speed,
                ..
            }
    )
}

/// Advance an effect by one round. Persistent effects come back unchanged;
/// `None` means the effect expired on this tick.
pub fn tick_duration(effect: StatusEffect) -> Option<StatusEffect> {
    if effect.is_persistent() {
        return Some(effect);
    }
    let remaining = effect.remaining - 1;
    if remaining <= 0 {
        None
    } else {
        Some(StatusEffect { remaining, ..effect })
    }
}

/// End-of-round damage for burn and poison: max HP / divisor, at least 1.
pub fn residual_damage(kind: StatusKind, max_hp: u16, config: &BattleConfig) -> Option<u32> {
    match kind {
        StatusKind::Burn | StatusKind::Poison => {
            Some((max_hp / config.residual_damage_divisor.max(1)).max(1) as u32)
        }
        _ => None,
    }
}

/// The first always-blocking status on the combatant. Such an actor cannot
/// have an action submitted for it.
pub fn hard_block(combatant: &Combatant, config: &BattleConfig) -> Option<StatusKind> {
    combatant
        .statuses()
        .iter()
        .map(|effect| effect.kind)
        .find(|kind| block_rule(*kind, config) == BlockRule::Always)
}

/// Decide at resolution time whether the actor loses this turn. Hard blocks
/// win without a draw; each chance-based block rolls once.
pub fn check_block(
    combatant: &Combatant,
    config: &BattleConfig,
    rng: &mut dyn BattleRng,
) -> Option<StatusKind> {
    if let Some(kind) = hard_block(combatant, config) {
        return Some(kind);
    }
    for effect in combatant.statuses() {
        if let BlockRule::Chance(percent) = block_rule(effect.kind, config) {
            if rng.percent_check(percent, "status block") {
                return Some(effect.kind);
            }
        }
    }
    None
}

/// Attach a status following its stacking rule.
pub fn apply_status(
    combatant: &mut Combatant,
    kind: StatusKind,
    duration: Option<i32>,
) -> ApplyOutcome {
    let effect = match duration {
        Some(d) => StatusEffect::with_duration(kind, d),
        None => StatusEffect::new(kind),
    };

    match stacking_rule(kind) {
        StackingRule::ExclusiveMajor => {
            if combatant.statuses().iter().any(|e| is_major(e.kind)) {
                return ApplyOutcome::Resisted;
            }
            combatant.push_status(effect);
            ApplyOutcome::Applied
        }
        StackingRule::Unique => {
            if combatant.has_status(kind) {
                return ApplyOutcome::Resisted;
            }
            combatant.push_status(effect);
            ApplyOutcome::Applied
        }
        StackingRule::Cumulative => stack_modifier(combatant, effect),
    }
}

fn stack_modifier(combatant: &mut Combatant, effect: StatusEffect) -> ApplyOutcome {
    let StatusKind::StatModifier { stat, stages } = effect.kind else {
        return ApplyOutcome::Resisted;
    };

    let current = combatant.stat_stage(stat);
    let combined = current.saturating_add(stages).clamp(-MAX_STAGE, MAX_STAGE);
    if combined == current {
        return ApplyOutcome::Resisted;
    }

    combatant.remove_status(effect.kind);
    if combined != 0 {
        combatant.push_status(StatusEffect {
            kind: StatusKind::StatModifier {
                stat,
                stages: combined,
            },
            remaining: effect.remaining,
        });
    }
    ApplyOutcome::Applied
}
