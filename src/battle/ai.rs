//! Automated move choice for computer-controlled combatants.

use crate::battle::conditions::is_major;
use crate::battle::effectiveness::effectiveness_multiplier;
use crate::battle::engine::BattleSession;
use crate::battle::state::CombatantRef;
use crate::combatant::Combatant;
use crate::move_data::MoveData;
use ordered_float::OrderedFloat;
use schema::{StatusKind, TargetType};

/// HP-ratio penalty weight: healthier targets score lower, so the AI
/// prefers finishing off weakened combatants.
const HP_RATIO_PENALTY: f64 = 20.0;

/// A move and target picked for the pending actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenAction {
    pub move_id: String,
    pub target_id: Option<String>,
    pub score: f64,
}

/// A trait for any system that can decide on a battle action.
pub trait Behavior {
    /// Pick a move and target for `actor`. `None` if nothing is usable.
    fn decide_action(&self, session: &BattleSession, actor: CombatantRef) -> Option<ChosenAction>;
}

/// Greedy scorer: rates every (move, target) pair and takes the best.
/// The first candidate wins ties, so choices are fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringAI;

impl ScoringAI {
    pub fn new() -> Self {
        Self
    }

    /// Candidate targets for a move. Group and self moves carry no target id.
    fn candidates(
        &self,
        session: &BattleSession,
        actor: CombatantRef,
        move_data: &MoveData,
    ) -> Vec<(Option<CombatantRef>, Vec<CombatantRef>)> {
        match move_data.target {
            TargetType::Enemy => session
                .living(actor.side.opponent())
                .into_iter()
                .map(|slot| (Some(slot), vec![slot]))
                .collect(),
            TargetType::Ally => session
                .living(actor.side)
                .into_iter()
                .map(|slot| (Some(slot), vec![slot]))
                .collect(),
            TargetType::User => vec![(None, vec![actor])],
            TargetType::AllEnemies => vec![(None, session.living(actor.side.opponent()))],
            TargetType::AllAllies => vec![(None, session.living(actor.side))],
        }
    }

    /// `power × effectiveness × STAB × accuracy − 20 × target HP ratio`,
    /// plus the value of any status the move inflicts.
    fn score_against(
        &self,
        session: &BattleSession,
        attacker: &Combatant,
        target: &Combatant,
        move_data: &MoveData,
    ) -> f64 {
        let config = session.config();
        let accuracy = move_data.accuracy as f64 / 100.0;

        let mut damage_score = 0.0;
        if move_data.is_damaging() {
            let effectiveness =
                effectiveness_multiplier(move_data.element, &target.elements, config);
            let stab = if attacker.has_element(move_data.element) {
                config.stab_multiplier
            } else {
                1.0
            };
            damage_score = move_data.power as f64 * effectiveness * stab * accuracy
                - HP_RATIO_PENALTY * target.hp_ratio();
        }

        let utility_score = self.utility(target, move_data) * accuracy;
        damage_score + utility_score
    }

    /// Value of the move's status effect on this target. Zero when it would
    /// be resisted or wasted.
    fn utility(&self, target: &Combatant, move_data: &MoveData) -> f64 {
        let Some(effect) = move_data.effect else {
            return 0.0;
        };
        let chance = effect.chance as f64 / 100.0;
        let hostile = move_data.target.is_offensive();

        match effect.status {
            kind if is_major(kind) && hostile => {
                if target.statuses().iter().any(|e| is_major(e.kind)) {
                    0.0
                } else {
                    45.0 * chance
                }
            }
            StatusKind::Confusion | StatusKind::Stun if hostile => {
                if target.has_status(effect.status) {
                    0.0
                } else {
                    30.0 * chance
                }
            }
            StatusKind::StatModifier { stat, stages } if stages > 0 && !hostile => {
                let current = target.stat_stage(stat);
                if current >= 6 {
                    0.0
                } else {
                    let potential_gain = 1.0 - current as f64 / 6.0;
                    20.0 * stages as f64 * potential_gain * chance
                }
            }
            StatusKind::StatModifier { stat, stages } if stages < 0 && hostile => {
                if target.stat_stage(stat) <= -6 {
                    0.0
                } else {
                    15.0 * stages.unsigned_abs() as f64 * chance
                }
            }
            StatusKind::Protect if !hostile => {
                if target.has_status(StatusKind::Protect) {
                    0.0
                } else {
                    10.0
                }
            }
            _ => 0.0,
        }
    }
}

impl Behavior for ScoringAI {
    fn decide_action(&self, session: &BattleSession, actor: CombatantRef) -> Option<ChosenAction> {
        let attacker = session.combatant(actor)?;

        let mut best: Option<ChosenAction> = None;
        for move_id in attacker.known_moves() {
            let Some(move_data) = session.move_data(move_id) else {
                continue;
            };
            for (target, affected) in self.candidates(session, actor, move_data) {
                if affected.is_empty() {
                    continue;
                }
                let mut score: f64 = affected
                    .iter()
                    .filter_map(|slot| session.combatant(*slot))
                    .map(|defender| self.score_against(session, attacker, defender, move_data))
                    .sum();

                // A status move with nothing to gain is worse than any attack.
                if !move_data.is_damaging() && score < 1.0 {
                    score = -1.0;
                }

                let replace = match &best {
                    Some(current) => OrderedFloat(score) > OrderedFloat(current.score),
                    None => true,
                };
                if replace {
                    best = Some(ChosenAction {
                        move_id: move_id.clone(),
                        target_id: target
                            .and_then(|slot| session.combatant(slot))
                            .map(|c| c.id.clone()),
                        score,
                    });
                }
            }
        }

        if let Some(choice) = &best {
            tracing::debug!(
                actor = %attacker.id,
                move_id = %choice.move_id,
                target = ?choice.target_id,
                score = choice.score,
                "AI chose action"
            );
        }
        best
    }
}
