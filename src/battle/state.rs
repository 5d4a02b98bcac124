use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::StatusKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Lifecycle of a battle session. Everything after `Active` is terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    Setup,
    Active,
    Victory,
    Defeat,
    Escape,
    Draw,
    Aborted,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BattlePhase::Setup | BattlePhase::Active)
    }
}

/// Side addressing - provides type safety over raw roster indices
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideId {
    Player,
    Opponent,
}

impl SideId {
    pub fn to_index(self) -> usize {
        match self {
            SideId::Player => 0,
            SideId::Opponent => 1,
        }
    }

    pub fn opponent(self) -> SideId {
        match self {
            SideId::Player => SideId::Opponent,
            SideId::Opponent => SideId::Player,
        }
    }
}

/// A roster slot: which side, and the position within that side's roster.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombatantRef {
    pub side: SideId,
    pub index: usize,
}

impl CombatantRef {
    pub fn new(side: SideId, index: usize) -> Self {
        Self { side, index }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Round management
    RoundStarted {
        round: u32,
    },
    TurnOrderRecomputed {
        order: Vec<String>,
    },

    // Actions
    MoveUsed {
        actor: String,
        move_name: String,
    },
    MoveMissed {
        actor: String,
        target: String,
    },
    MoveProtected {
        target: String,
    },
    CriticalHit {
        target: String,
    },
    AttackTypeEffectiveness {
        multiplier: f64,
    },
    DamageDealt {
        target: String,
        damage: u32,
        remaining_hp: u16,
    },
    RecoilDamage {
        actor: String,
        damage: u32,
        remaining_hp: u16,
    },
    ConfusionSelfHit {
        actor: String,
        damage: u32,
        remaining_hp: u16,
    },
    ActionBlocked {
        actor: String,
        status: StatusKind,
    },

    // Status effects
    StatusApplied {
        target: String,
        status: StatusKind,
    },
    StatusResisted {
        target: String,
        status: StatusKind,
    },
    StatusRemoved {
        target: String,
        status: StatusKind,
    },
    StatusExpired {
        target: String,
        status: StatusKind,
    },
    StatusDamage {
        target: String,
        status: StatusKind,
        damage: u32,
        remaining_hp: u16,
    },

    CombatantFainted {
        side: SideId,
        combatant: String,
    },

    // Battle end
    EscapeFailed {
        side: SideId,
    },
    Escaped {
        side: SideId,
    },
    BattleAborted,
    BattleEnded {
        phase: BattlePhase,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable log line.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::RoundStarted { round } => Some(format!("=== Round {} ===", round)),
            BattleEvent::TurnOrderRecomputed { .. } => None,

            BattleEvent::MoveUsed { actor, move_name } => {
                Some(format!("{} used {}!", actor, move_name))
            }
            BattleEvent::MoveMissed { actor, target } => {
                Some(format!("{}'s attack missed {}!", actor, target))
            }
            BattleEvent::MoveProtected { target } => {
                Some(format!("{} protected itself!", target))
            }
            BattleEvent::CriticalHit { .. } => Some("A critical hit!".to_string()),
            BattleEvent::AttackTypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m < 1.0 => Some("It's not very effective...".to_string()),
                _ => None, // Normal effectiveness, no message
            },
            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", target, damage))
            }
            BattleEvent::RecoilDamage { actor, damage, .. } => {
                Some(format!("{} is hit with recoil! ({} damage)", actor, damage))
            }
            BattleEvent::ConfusionSelfHit { actor, damage, .. } => Some(format!(
                "{} hurt itself in its confusion! ({} damage)",
                actor, damage
            )),
            BattleEvent::ActionBlocked { actor, status } => {
                Some(format!("{} {}", actor, Self::format_block_reason(status)))
            }

            BattleEvent::StatusApplied { target, status } => Some(match status {
                StatusKind::StatModifier { stat, stages } if *stages > 0 => {
                    format!("{}'s {} rose!", target, stat)
                }
                StatusKind::StatModifier { stat, .. } => format!("{}'s {} fell!", target, stat),
                other => format!("{} {}", target, Self::format_status_applied(other)),
            }),
            BattleEvent::StatusResisted { target, status } => Some(format!(
                "{} is unaffected by {}. But it failed!",
                target, status
            )),
            BattleEvent::StatusRemoved { target, status } => {
                Some(format!("{} was cured of its {}!", target, status))
            }
            BattleEvent::StatusExpired { target, status } => {
                Some(format!("{}'s {} wore off.", target, status))
            }
            BattleEvent::StatusDamage {
                target,
                status,
                damage,
                ..
            } => Some(format!(
                "{} is hurt by its {}! ({} damage)",
                target, status, damage
            )),

            BattleEvent::CombatantFainted { combatant, .. } => {
                Some(format!("{} fainted!", combatant))
            }

            BattleEvent::EscapeFailed { .. } => Some("Couldn't get away!".to_string()),
            BattleEvent::Escaped { .. } => Some("Got away safely!".to_string()),
            BattleEvent::BattleAborted => Some("The battle was called off.".to_string()),
            BattleEvent::BattleEnded { phase } => match phase {
                BattlePhase::Victory => Some("You won the battle!".to_string()),
                BattlePhase::Defeat => Some("You lost the battle...".to_string()),
                BattlePhase::Draw => Some("The battle ended in a draw!".to_string()),
                _ => None,
            },
        }
    }

    // --- Private Helper Functions ---

    fn format_status_applied(status: &StatusKind) -> String {
        match status {
            StatusKind::Burn => "was burned!".to_string(),
            StatusKind::Freeze => "was frozen solid!".to_string(),
            StatusKind::Paralysis => "is paralyzed! It may be unable to move!".to_string(),
            StatusKind::Poison => "was poisoned!".to_string(),
            StatusKind::Confusion => "became confused!".to_string(),
            StatusKind::Sleep => "fell asleep!".to_string(),
            StatusKind::Stun => "is stunned!".to_string(),
            StatusKind::Protect => "is protecting itself!".to_string(),
            StatusKind::StatModifier { .. } => format!("was affected by {}!", status),
        }
    }

    fn format_block_reason(status: &StatusKind) -> String {
        match status {
            StatusKind::Sleep => "is fast asleep.".to_string(),
            StatusKind::Freeze => "is frozen solid!".to_string(),
            StatusKind::Paralysis => "is fully paralyzed!".to_string(),
            StatusKind::Stun => "is stunned and couldn't move!".to_string(),
            other => format!("couldn't move because of {}!", other),
        }
    }
}

/// Event bus for collecting the events of a single step.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub round: u32,
    pub message: String,
}

/// Append-only battle log with a fixed capacity; the oldest entries are
/// evicted first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BattleLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, round: u32, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            round,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of every random draw the engine makes. Injected so tests can
/// script outcomes and replays can reuse a seed.
pub trait BattleRng {
    /// Uniform draw in `low..=high`.
    fn roll(&mut self, low: u32, high: u32, reason: &str) -> u32;

    /// True with `percent`% probability. Always draws, even at 0 or 100.
    fn percent_check(&mut self, percent: u8, reason: &str) -> bool {
        self.roll(1, 100, reason) <= percent as u32
    }

    /// True with the given probability, resolved to 1/10000.
    fn probability_check(&mut self, probability: f64, reason: &str) -> bool {
        let threshold = (probability.clamp(0.0, 1.0) * 10_000.0).round() as u32;
        self.roll(1, 10_000, reason) <= threshold
    }
}

/// Pre-scripted outcomes, consumed in order. Values outside the requested
/// range are clamped into it.
#[derive(Debug, Clone)]
pub struct TurnRng {
    outcomes: Vec<u32>,
    index: usize,
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u32>) -> Self {
        Self { outcomes, index: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.len().saturating_sub(self.index)
    }
}

impl BattleRng for TurnRng {
    fn roll(&mut self, low: u32, high: u32, reason: &str) -> u32 {
        if self.index >= self.outcomes.len() {
            panic!(
                "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            );
        }
        let outcome = self.outcomes[self.index].clamp(low, high.max(low));
        tracing::trace!(outcome, reason, "scripted rng draw");
        self.index += 1;
        outcome
    }
}

/// Seedable generator for live battles and reproducible replays.
#[derive(Debug, Clone)]
pub struct SeededRng {
    inner: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl BattleRng for SeededRng {
    fn roll(&mut self, low: u32, high: u32, reason: &str) -> u32 {
        let outcome = self.inner.random_range(low..=high.max(low));
        tracing::trace!(outcome, reason, "rng draw");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_evicts_oldest_entries() {
        let mut log = BattleLog::new(3);
        for i in 0..5 {
            log.push(1, format!("line {}", i));
        }
        let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["line 2", "line 3", "line 4"]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_silent_events_return_none() {
        let silent_events = vec![
            BattleEvent::TurnOrderRecomputed { order: vec![] },
            BattleEvent::AttackTypeEffectiveness { multiplier: 1.0 },
        ];
        for event in silent_events {
            assert!(
                event.format().is_none(),
                "Event {:?} should be silent but returned text",
                event
            );
        }
    }

    #[test]
    fn test_event_text_samples() {
        let used = BattleEvent::MoveUsed {
            actor: "Emberfox".to_string(),
            move_name: "Flame Lash".to_string(),
        };
        assert_eq!(used.format(), Some("Emberfox used Flame Lash!".to_string()));

        let weak = BattleEvent::AttackTypeEffectiveness { multiplier: 0.5 };
        assert_eq!(weak.format(), Some("It's not very effective...".to_string()));

        let strong = BattleEvent::AttackTypeEffectiveness { multiplier: 4.0 };
        assert_eq!(strong.format(), Some("It's super effective!".to_string()));

        let asleep = BattleEvent::ActionBlocked {
            actor: "Tidekit".to_string(),
            status: StatusKind::Sleep,
        };
        assert_eq!(asleep.format(), Some("Tidekit is fast asleep.".to_string()));
    }

    #[test]
    fn test_scripted_rng_clamps_into_range() {
        let mut rng = TurnRng::new_for_test(vec![1, 10_000, 100]);
        assert!(rng.percent_check(90, "accuracy"));
        assert!(!rng.probability_check(0.125, "critical"));
        assert_eq!(rng.roll(85, 100, "variance"), 100);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        let left: Vec<u32> = (0..16).map(|_| a.roll(1, 100, "test")).collect();
        let right: Vec<u32> = (0..16).map(|_| b.roll(1, 100, "test")).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|v| (1..=100).contains(v)));
    }
}
