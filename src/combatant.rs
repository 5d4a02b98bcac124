use crate::battle::conditions::StatusEffect;
use crate::battle::stats::{
    derive_stats, Nature, DEFAULT_EVS, DEFAULT_IVS, MAX_IV, MAX_LEVEL, MAX_STAGE, MIN_LEVEL,
};
use crate::bonding::BondLevel;
use crate::errors::{ConfigResult, ConfigurationError};
use schema::{BaseStats, ElementType, StatBlock, StatKind, StatusKind};
use serde::{Deserialize, Serialize};

/// A combatant as it exists inside a battle: identity, cached stats, HP,
/// active statuses and known moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub elements: Vec<ElementType>,
    /// Base stats before the bond multiplier.
    pub base_stats: BaseStats,
    pub level: u8,
    pub ivs: [u8; 6],
    pub evs: [u8; 6],
    pub nature: Option<Nature>,
    pub bond: BondLevel,
    /// Derived stats, recomputed on level-up.
    pub stats: StatBlock,
    current_hp: u16,
    statuses: Vec<StatusEffect>,
    moves: Vec<String>,
}

impl Combatant {
    /// Create a combatant at full HP with default IVs (31) and EVs (0).
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        elements: Vec<ElementType>,
        base_stats: BaseStats,
        level: u8,
        moves: Vec<String>,
    ) -> Self {
        let mut combatant = Combatant {
            id: id.into(),
            name: name.into(),
            elements,
            base_stats,
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            ivs: DEFAULT_IVS,
            evs: DEFAULT_EVS,
            nature: None,
            bond: BondLevel::default(),
            stats: StatBlock::default(),
            current_hp: 0,
            statuses: Vec::new(),
            moves,
        };
        combatant.recalculate_stats();
        combatant.current_hp = combatant.stats.hp;
        combatant
    }

    pub fn with_ivs(mut self, ivs: [u8; 6]) -> Self {
        self.ivs = ivs.map(|iv| iv.min(MAX_IV));
        self.reset_stats();
        self
    }

    pub fn with_evs(mut self, evs: [u8; 6]) -> Self {
        self.evs = evs;
        self.reset_stats();
        self
    }

    pub fn with_nature(mut self, nature: Nature) -> Self {
        self.nature = Some(nature);
        self.reset_stats();
        self
    }

    pub fn with_bond(mut self, bond: BondLevel) -> Self {
        self.bond = bond;
        self.reset_stats();
        self
    }

    fn reset_stats(&mut self) {
        self.recalculate_stats();
        self.current_hp = self.stats.hp;
    }

    fn recalculate_stats(&mut self) {
        let base = self.bond.apply_to_base(&self.base_stats);
        self.stats = derive_stats(&base, self.level, &self.ivs, &self.evs, self.nature);
    }

    /// Check the static shape of this combatant against the engine limits.
    pub fn validate(&self, max_moves: usize) -> ConfigResult<()> {
        let invalid = |reason: &str| ConfigurationError::InvalidCombatant {
            combatant: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.elements.is_empty() || self.elements.len() > 2 {
            return Err(invalid("must have one or two element types"));
        }
        if self.elements.len() == 2 && self.elements[0] == self.elements[1] {
            return Err(invalid("element types must be distinct"));
        }
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(invalid("level must be between 1 and 100"));
        }
        if self.moves.is_empty() {
            return Err(invalid("must know at least one move"));
        }
        if self.moves.len() > max_moves {
            return Err(invalid(&format!("cannot know more than {} moves", max_moves)));
        }
        Ok(())
    }

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.stats.hp == 0 {
            return 0.0;
        }
        self.current_hp as f64 / self.stats.hp as f64
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Subtract damage, clamping at zero. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current_hp as u32);
        self.current_hp -= lost as u16;
        lost
    }

    /// Full HP and no statuses, as at the start of a battle.
    pub fn reset_battle_state(&mut self) {
        self.current_hp = self.stats.hp;
        self.statuses.clear();
    }

    pub fn statuses(&self) -> &[StatusEffect] {
        &self.statuses
    }

    /// True if a status occupying the same slot is active. Stat modifiers
    /// match on the stat alone.
    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|effect| effect.kind.same_slot(kind))
    }

    pub(crate) fn push_status(&mut self, effect: StatusEffect) {
        self.statuses.push(effect);
    }

    /// Remove the status occupying `kind`'s slot, if any.
    pub fn remove_status(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let position = self
            .statuses
            .iter()
            .position(|effect| effect.kind.same_slot(kind))?;
        Some(self.statuses.remove(position))
    }

    /// Replace the status list wholesale. Used by end-of-round ticking.
    pub(crate) fn set_statuses(&mut self, statuses: Vec<StatusEffect>) {
        self.statuses = statuses;
    }

    /// Current stage for a stat, from any active stat modifier.
    pub fn stat_stage(&self, stat: StatKind) -> i8 {
        self.statuses
            .iter()
            .filter_map(|effect| match effect.kind {
                StatusKind::StatModifier { stat: s, stages } if s == stat => Some(stages),
                _ => None,
            })
            .sum::<i8>()
            .clamp(-MAX_STAGE, MAX_STAGE)
    }

    pub fn known_moves(&self) -> &[String] {
        &self.moves
    }

    pub fn knows_move(&self, move_id: &str) -> bool {
        self.moves.iter().any(|m| m == move_id)
    }

    pub fn has_element(&self, element: ElementType) -> bool {
        self.elements.contains(&element)
    }

    /// Change level and recompute cached stats. Damage already taken is
    /// preserved; a living combatant never drops to 0 HP from this.
    pub fn set_level(&mut self, level: u8) {
        let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        if level == self.level {
            return;
        }
        let damage_taken = self.stats.hp - self.current_hp;
        let was_fainted = self.is_fainted();

        self.level = level;
        self.recalculate_stats();

        self.current_hp = if was_fainted {
            0
        } else {
            self.stats.hp.saturating_sub(damage_taken).max(1)
        };
    }
}
