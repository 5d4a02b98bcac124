use crate::battle::calculators::{compute_damage, confusion_damage, move_hits, recoil_damage};
use crate::battle::conditions::{
    affects_speed, apply_status, check_block, hard_block, residual_damage, tick_duration,
    ApplyOutcome,
};
use crate::battle::state::{
    BattleEvent, BattleLog, BattlePhase, BattleRng, CombatantRef, EventBus, SideId,
};
use crate::battle::stats::effective_speed;
use crate::battle::turn_order::TurnScheduler;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::errors::{
    BattleEngineError, BattleResult, ConfigResult, ConfigurationError, IllegalStateError,
    ValidationError,
};
use crate::move_data::{MoveCatalog, MoveData};
use schema::{StatusKind, TargetType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What happened to one target of a move.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TargetOutcome {
    pub target: String,
    pub hit: bool,
    /// HP actually lost by the target.
    pub damage: u32,
    pub critical: bool,
    pub effectiveness: f64,
    pub status_applied: Option<StatusKind>,
    pub fainted: bool,
}

impl TargetOutcome {
    fn missed(target: String) -> Self {
        Self {
            target,
            hit: false,
            damage: 0,
            critical: false,
            effectiveness: 1.0,
            status_applied: None,
            fainted: false,
        }
    }
}

/// Emitted after every resolved turn, including blocked ones.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TurnResolved {
    pub round: u32,
    pub actor: String,
    pub move_id: Option<String>,
    /// First target, if the move had any.
    pub target: Option<String>,
    pub hit: bool,
    /// Total HP lost across all targets.
    pub damage: u32,
    pub status_applied: Option<StatusKind>,
    pub blocked_by: Option<StatusKind>,
    pub outcomes: Vec<TargetOutcome>,
    pub events: Vec<BattleEvent>,
    pub log: String,
}

impl TurnResolved {
    fn new(round: u32, actor: String, move_id: Option<String>) -> Self {
        Self {
            round,
            actor,
            move_id,
            target: None,
            hit: false,
            damage: 0,
            status_applied: None,
            blocked_by: None,
            outcomes: Vec::new(),
            events: Vec::new(),
            log: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Survivor {
    pub side: SideId,
    pub id: String,
    pub name: String,
    pub current_hp: u16,
    pub max_hp: u16,
}

/// Final summary, produced exactly once per battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BattleEnded {
    pub outcome: BattlePhase,
    pub rounds: u32,
    pub surviving_roster: Vec<Survivor>,
    pub total_actions: u32,
    pub total_damage: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EscapeAttempt {
    pub side: SideId,
    pub chance: f64,
    pub escaped: bool,
    pub log: String,
}

/// One battle between a player roster and an opponent roster.
///
/// Every mutating call either fully resolves or returns an error without
/// touching state. The session holds no I/O and draws randomness only from
/// the injected `BattleRng`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleSession {
    session_id: String,
    config: BattleConfig,
    /// Move data for every move known by a registered combatant.
    moves: HashMap<String, MoveData>,
    rosters: [Vec<Combatant>; 2],
    phase: BattlePhase,
    round: u32,
    scheduler: TurnScheduler,
    log: BattleLog,
    total_actions: u32,
    total_damage: u64,
    result: Option<BattleEnded>,
}

impl BattleSession {
    pub fn new(session_id: impl Into<String>, config: BattleConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            session_id: session_id.into(),
            log: BattleLog::new(config.log_capacity),
            config,
            moves: HashMap::new(),
            rosters: [Vec::new(), Vec::new()],
            phase: BattlePhase::Setup,
            round: 0,
            scheduler: TurnScheduler::new(&[]),
            total_actions: 0,
            total_damage: 0,
            result: None,
        })
    }

    /// Create a session with both rosters registered. Any move or combatant
    /// fault is reported here, before the battle can start.
    pub fn with_rosters(
        session_id: impl Into<String>,
        player: Vec<Combatant>,
        opponent: Vec<Combatant>,
        catalog: &MoveCatalog,
        config: BattleConfig,
    ) -> ConfigResult<Self> {
        let mut session = Self::new(session_id, config)?;
        for combatant in player {
            session.register(SideId::Player, combatant, catalog)?;
        }
        for combatant in opponent {
            session.register(SideId::Opponent, combatant, catalog)?;
        }
        Ok(session)
    }

    /// Add a combatant while the session is still in `Setup`.
    pub fn add_combatant(
        &mut self,
        side: SideId,
        combatant: Combatant,
        catalog: &MoveCatalog,
    ) -> BattleResult<()> {
        match self.phase {
            BattlePhase::Setup => {}
            BattlePhase::Active => return Err(IllegalStateError::AlreadyStarted.into()),
            phase => return Err(IllegalStateError::BattleFinished(phase).into()),
        }
        self.register(side, combatant, catalog)?;
        Ok(())
    }

    fn register(
        &mut self,
        side: SideId,
        combatant: Combatant,
        catalog: &MoveCatalog,
    ) -> ConfigResult<()> {
        combatant.validate(self.config.max_moves)?;
        if self.find(&combatant.id).is_some() {
            return Err(ConfigurationError::DuplicateCombatant(combatant.id));
        }

        let mut resolved = Vec::with_capacity(combatant.known_moves().len());
        for move_id in combatant.known_moves() {
            let data = catalog
                .get(move_id)
                .ok_or_else(|| ConfigurationError::UnknownMove {
                    combatant: combatant.id.clone(),
                    move_id: move_id.clone(),
                })?;
            resolved.push(data.clone());
        }
        for data in resolved {
            self.moves.entry(data.id.clone()).or_insert(data);
        }

        tracing::debug!(session = %self.session_id, combatant = %combatant.id, ?side, "Registered combatant");
        self.rosters[side.to_index()].push(combatant);
        Ok(())
    }

    /// Move from `Setup` to `Active`: everyone at full HP with no statuses,
    /// initial order by speed, round 1.
    pub fn start(&mut self) -> BattleResult<()> {
        match self.phase {
            BattlePhase::Setup => {}
            BattlePhase::Active => return Err(IllegalStateError::AlreadyStarted.into()),
            phase => return Err(IllegalStateError::BattleFinished(phase).into()),
        }
        for side in [SideId::Player, SideId::Opponent] {
            if self.rosters[side.to_index()].is_empty() {
                return Err(ConfigurationError::EmptyRoster(side_name(side).to_string()).into());
            }
        }

        for combatant in self.rosters.iter_mut().flat_map(|roster| roster.iter_mut()) {
            combatant.reset_battle_state();
        }
        self.scheduler = TurnScheduler::new(&self.speed_entries());
        self.phase = BattlePhase::Active;
        self.round = 1;

        let mut bus = EventBus::new();
        bus.push(BattleEvent::RoundStarted { round: 1 });
        self.record(&bus, 1);

        tracing::info!(
            session = %self.session_id,
            players = self.rosters[0].len(),
            opponents = self.rosters[1].len(),
            "Battle started"
        );
        Ok(())
    }

    // --- Queries ---

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == BattlePhase::Active
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn roster(&self, side: SideId) -> &[Combatant] {
        &self.rosters[side.to_index()]
    }

    pub fn combatant(&self, slot: CombatantRef) -> Option<&Combatant> {
        self.rosters[slot.side.to_index()].get(slot.index)
    }

    pub fn find(&self, combatant_id: &str) -> Option<CombatantRef> {
        [SideId::Player, SideId::Opponent]
            .into_iter()
            .find_map(|side| {
                self.rosters[side.to_index()]
                    .iter()
                    .position(|c| c.id == combatant_id)
                    .map(|index| CombatantRef::new(side, index))
            })
    }

    pub fn move_data(&self, move_id: &str) -> Option<&MoveData> {
        self.moves.get(move_id)
    }

    pub fn turn_order(&self) -> Vec<CombatantRef> {
        self.scheduler.order()
    }

    /// The combatant whose turn it is.
    pub fn pending_actor(&self) -> Option<CombatantRef> {
        if !self.is_active() {
            return None;
        }
        self.scheduler.next_actor(|slot| !self.at(slot).is_fainted())
    }

    /// The always-blocking status keeping the pending actor from acting.
    pub fn pending_actor_block(&self) -> Option<StatusKind> {
        self.pending_actor()
            .and_then(|slot| hard_block(self.at(slot), &self.config))
    }

    pub fn result(&self) -> Option<&BattleEnded> {
        self.result.as_ref()
    }

    /// Living combatants on one side, in roster order.
    pub fn living(&self, side: SideId) -> Vec<CombatantRef> {
        self.rosters[side.to_index()]
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_fainted())
            .map(|(index, _)| CombatantRef::new(side, index))
            .collect()
    }

    // --- Turn input ---

    /// Validate and resolve the pending actor's move. A rejected submission
    /// leaves the session untouched.
    pub fn submit_action(
        &mut self,
        actor_id: &str,
        move_id: &str,
        target_id: Option<&str>,
        rng: &mut dyn BattleRng,
    ) -> BattleResult<TurnResolved> {
        let (actor, move_data, targets) =
            match self.validate_submission(actor_id, move_id, target_id) {
                Ok(valid) => valid,
                Err(error) => {
                    tracing::warn!(
                        session = %self.session_id,
                        actor_id,
                        move_id,
                        %error,
                        "Rejected action"
                    );
                    return Err(error);
                }
            };
        Ok(self.resolve_move(actor, &move_data, targets, rng))
    }

    /// Consume the turn of a pending actor held by an always-blocking status.
    pub fn pass_blocked_turn(&mut self) -> BattleResult<TurnResolved> {
        self.ensure_active()?;
        let actor = self
            .pending_actor()
            .ok_or(IllegalStateError::NoActorAvailable)?;
        let combatant = self.at(actor);
        let Some(status) = hard_block(combatant, &self.config) else {
            return Err(IllegalStateError::ActorNotBlocked(combatant.id.clone()).into());
        };

        let mut resolved = TurnResolved::new(self.round, combatant.id.clone(), None);
        resolved.blocked_by = Some(status);
        let mut bus = EventBus::new();
        bus.push(BattleEvent::ActionBlocked {
            actor: combatant.name.clone(),
            status,
        });
        Ok(self.finish_turn(actor, resolved, bus, false))
    }

    fn ensure_active(&self) -> BattleResult<()> {
        match self.phase {
            BattlePhase::Active => Ok(()),
            BattlePhase::Setup => Err(IllegalStateError::NotStarted.into()),
            phase => Err(IllegalStateError::BattleFinished(phase).into()),
        }
    }

    fn validate_submission(
        &self,
        actor_id: &str,
        move_id: &str,
        target_id: Option<&str>,
    ) -> BattleResult<(CombatantRef, MoveData, Vec<CombatantRef>)> {
        self.ensure_active()?;

        let actor = self
            .find(actor_id)
            .ok_or_else(|| ValidationError::UnknownCombatant(actor_id.to_string()))?;
        let expected = self
            .pending_actor()
            .ok_or(IllegalStateError::NoActorAvailable)?;
        if actor != expected {
            return Err(ValidationError::NotYourTurn {
                actor: actor_id.to_string(),
                expected: self.at(expected).id.clone(),
            }
            .into());
        }

        let combatant = self.at(actor);
        let unknown_move = || ValidationError::UnknownMove {
            actor: actor_id.to_string(),
            move_id: move_id.to_string(),
        };
        if !combatant.knows_move(move_id) {
            return Err(unknown_move().into());
        }
        let move_data = self.moves.get(move_id).cloned().ok_or_else(unknown_move)?;

        if let Some(status) = hard_block(combatant, &self.config) {
            return Err(ValidationError::ActorBlocked {
                actor: actor_id.to_string(),
                status,
            }
            .into());
        }

        let targets = self.resolve_targets(actor, &move_data, target_id)?;
        Ok((actor, move_data, targets))
    }

    fn resolve_targets(
        &self,
        actor: CombatantRef,
        move_data: &MoveData,
        target_id: Option<&str>,
    ) -> BattleResult<Vec<CombatantRef>> {
        let invalid = |target: &str, reason: &str| ValidationError::InvalidTarget {
            move_id: move_data.id.clone(),
            target: target.to_string(),
            reason: reason.to_string(),
        };

        match move_data.target {
            TargetType::User => {
                if let Some(id) = target_id {
                    if id != self.at(actor).id {
                        return Err(invalid(id, "this move only affects its user").into());
                    }
                }
                Ok(vec![actor])
            }
            TargetType::Enemy | TargetType::Ally => {
                let id = target_id.ok_or_else(|| ValidationError::MissingTarget {
                    move_id: move_data.id.clone(),
                })?;
                let target = self
                    .find(id)
                    .ok_or_else(|| ValidationError::UnknownCombatant(id.to_string()))?;

                let (wanted_side, reason) = if move_data.target == TargetType::Enemy {
                    (actor.side.opponent(), "target must be on the opposing side")
                } else {
                    (actor.side, "target must be on the user's side")
                };
                if target.side != wanted_side {
                    return Err(invalid(id, reason).into());
                }
                if self.at(target).is_fainted() {
                    return Err(ValidationError::TargetFainted(id.to_string()).into());
                }
                Ok(vec![target])
            }
            TargetType::AllEnemies => Ok(self.living(actor.side.opponent())),
            TargetType::AllAllies => Ok(self.living(actor.side)),
        }
    }

    // --- Turn resolution ---

    fn resolve_move(
        &mut self,
        actor: CombatantRef,
        move_data: &MoveData,
        targets: Vec<CombatantRef>,
        rng: &mut dyn BattleRng,
    ) -> TurnResolved {
        let actor_id = self.at(actor).id.clone();
        let actor_name = self.at(actor).name.clone();
        let mut resolved = TurnResolved::new(self.round, actor_id, Some(move_data.id.clone()));
        let mut bus = EventBus::new();
        let mut speed_changed = false;

        tracing::debug!(
            session = %self.session_id,
            round = self.round,
            actor = %actor_name,
            move_id = %move_data.id,
            "Resolving turn"
        );

        if let Some(status) = check_block(self.at(actor), &self.config, rng) {
            bus.push(BattleEvent::ActionBlocked {
                actor: actor_name,
                status,
            });
            resolved.blocked_by = Some(status);
            return self.finish_turn(actor, resolved, bus, false);
        }

        if self.at(actor).has_status(StatusKind::Confusion)
            && rng.percent_check(self.config.confusion_self_hit_chance, "confusion self-hit")
        {
            let damage = confusion_damage(self.at(actor), &self.config, rng);
            let combatant = self.at_mut(actor);
            let lost = combatant.take_damage(damage);
            let remaining_hp = combatant.current_hp();
            self.total_damage += lost as u64;
            bus.push(BattleEvent::ConfusionSelfHit {
                actor: actor_name,
                damage: lost,
                remaining_hp,
            });
            self.check_faint(actor, &mut bus);
            return self.finish_turn(actor, resolved, bus, false);
        }

        bus.push(BattleEvent::MoveUsed {
            actor: actor_name.clone(),
            move_name: move_data.name.clone(),
        });

        for target in targets {
            if self.at(target).is_fainted() {
                continue;
            }
            let outcome =
                self.strike(actor, target, move_data, rng, &mut bus, &mut speed_changed);
            resolved.outcomes.push(outcome);
        }

        let dealt: u32 = resolved.outcomes.iter().map(|o| o.damage).sum();
        let recoil = recoil_damage(move_data, dealt);
        if recoil > 0 && !self.at(actor).is_fainted() {
            let combatant = self.at_mut(actor);
            let lost = combatant.take_damage(recoil);
            let remaining_hp = combatant.current_hp();
            self.total_damage += lost as u64;
            bus.push(BattleEvent::RecoilDamage {
                actor: actor_name,
                damage: lost,
                remaining_hp,
            });
            self.check_faint(actor, &mut bus);
        }

        resolved.target = resolved.outcomes.first().map(|o| o.target.clone());
        resolved.hit = resolved.outcomes.iter().any(|o| o.hit);
        resolved.damage = dealt;
        resolved.status_applied = resolved.outcomes.iter().find_map(|o| o.status_applied);

        self.finish_turn(actor, resolved, bus, speed_changed)
    }

    /// Resolve a move against a single target: protect, accuracy, damage,
    /// then the status roll.
    fn strike(
        &mut self,
        actor: CombatantRef,
        target: CombatantRef,
        move_data: &MoveData,
        rng: &mut dyn BattleRng,
        bus: &mut EventBus,
        speed_changed: &mut bool,
    ) -> TargetOutcome {
        let target_name = self.at(target).name.clone();
        let mut outcome = TargetOutcome::missed(self.at(target).id.clone());

        if move_data.target.is_offensive() && self.at(target).has_status(StatusKind::Protect) {
            bus.push(BattleEvent::MoveProtected {
                target: target_name,
            });
            return outcome;
        }

        if !move_hits(move_data, rng) {
            bus.push(BattleEvent::MoveMissed {
                actor: self.at(actor).name.clone(),
                target: target_name,
            });
            return outcome;
        }
        outcome.hit = true;

        if move_data.is_damaging() {
            let damage = compute_damage(
                self.at(actor),
                self.at(target),
                move_data,
                &self.config,
                rng,
            );
            if damage.critical {
                bus.push(BattleEvent::CriticalHit {
                    target: target_name.clone(),
                });
            }
            bus.push(BattleEvent::AttackTypeEffectiveness {
                multiplier: damage.effectiveness,
            });

            let defender = self.at_mut(target);
            let lost = defender.take_damage(damage.damage);
            let remaining_hp = defender.current_hp();
            self.total_damage += lost as u64;
            bus.push(BattleEvent::DamageDealt {
                target: target_name.clone(),
                damage: lost,
                remaining_hp,
            });

            outcome.damage = lost;
            outcome.critical = damage.critical;
            outcome.effectiveness = damage.effectiveness;
            outcome.fainted = self.check_faint(target, bus);
        }

        if let Some(effect) = move_data.effect {
            if !self.at(target).is_fainted()
                && rng.percent_check(effect.chance, "status chance")
            {
                match apply_status(self.at_mut(target), effect.status, effect.duration) {
                    ApplyOutcome::Applied => {
                        bus.push(BattleEvent::StatusApplied {
                            target: target_name,
                            status: effect.status,
                        });
                        outcome.status_applied = Some(effect.status);
                        if affects_speed(effect.status) {
                            *speed_changed = true;
                        }
                    }
                    ApplyOutcome::Resisted => {
                        bus.push(BattleEvent::StatusResisted {
                            target: target_name,
                            status: effect.status,
                        });
                    }
                }
            }
        }

        outcome
    }

    /// Emit a faint event if `slot` is at 0 HP. Callers only invoke this
    /// right after damaging a living combatant.
    fn check_faint(&mut self, slot: CombatantRef, bus: &mut EventBus) -> bool {
        let combatant = self.at(slot);
        if !combatant.is_fainted() {
            return false;
        }
        tracing::debug!(session = %self.session_id, combatant = %combatant.id, "Combatant fainted");
        bus.push(BattleEvent::CombatantFainted {
            side: slot.side,
            combatant: combatant.name.clone(),
        });
        true
    }

    /// Rotate the actor, reorder if speeds moved, then check for the end of
    /// the battle or the round.
    fn finish_turn(
        &mut self,
        actor: CombatantRef,
        mut resolved: TurnResolved,
        mut bus: EventBus,
        speed_changed: bool,
    ) -> TurnResolved {
        self.scheduler.complete_turn(actor);
        self.total_actions += 1;
        if speed_changed {
            self.scheduler.mark_speed_changed();
        }

        if let Some(outcome) = self.terminal_outcome() {
            self.end_battle(outcome, &mut bus);
        } else if self
            .scheduler
            .round_complete(|slot| !self.at(slot).is_fainted())
        {
            self.end_round(&mut bus);
        } else if self.scheduler.speed_dirty() {
            self.reorder_mid_round(&mut bus);
        }

        resolved.log = self.record(&bus, resolved.round);
        resolved.events = bus.into_events();
        resolved
    }

    fn reorder_mid_round(&mut self, bus: &mut EventBus) {
        let entries = self.speed_entries();
        self.scheduler.reorder_mid_round(&entries);
        bus.push(BattleEvent::TurnOrderRecomputed {
            order: self.order_ids(),
        });
    }

    /// Residual damage, duration ticks, terminal check, then the next round.
    fn end_round(&mut self, bus: &mut EventBus) {
        for slot in self.all_slots() {
            let statuses: Vec<StatusKind> =
                self.at(slot).statuses().iter().map(|e| e.kind).collect();
            for kind in statuses {
                if self.at(slot).is_fainted() {
                    break;
                }
                let Some(damage) = residual_damage(kind, self.at(slot).max_hp(), &self.config)
                else {
                    continue;
                };
                let combatant = self.at_mut(slot);
                let lost = combatant.take_damage(damage);
                let remaining_hp = combatant.current_hp();
                let target = combatant.name.clone();
                self.total_damage += lost as u64;
                bus.push(BattleEvent::StatusDamage {
                    target,
                    status: kind,
                    damage: lost,
                    remaining_hp,
                });
                self.check_faint(slot, bus);
            }
        }

        for slot in self.all_slots() {
            if self.at(slot).is_fainted() {
                continue;
            }
            let mut kept = Vec::new();
            let mut expired = Vec::new();
            for effect in self.at(slot).statuses() {
                match tick_duration(*effect) {
                    Some(effect) => kept.push(effect),
                    None => expired.push(effect.kind),
                }
            }
            let combatant = self.at_mut(slot);
            combatant.set_statuses(kept);
            let target = combatant.name.clone();
            for status in expired {
                if affects_speed(status) {
                    self.scheduler.mark_speed_changed();
                }
                bus.push(BattleEvent::StatusExpired {
                    target: target.clone(),
                    status,
                });
            }
        }

        if let Some(outcome) = self.terminal_outcome() {
            self.end_battle(outcome, bus);
            return;
        }

        self.round += 1;
        let entries = self.speed_entries();
        if self.scheduler.start_round(&entries) {
            bus.push(BattleEvent::TurnOrderRecomputed {
                order: self.order_ids(),
            });
        }
        bus.push(BattleEvent::RoundStarted { round: self.round });
        tracing::debug!(session = %self.session_id, round = self.round, "Round started");
    }

    /// Outcome if either side is fully fainted. Both sides out is a draw.
    fn terminal_outcome(&self) -> Option<BattlePhase> {
        let side_out = |side: SideId| self.rosters[side.to_index()].iter().all(|c| c.is_fainted());
        match (side_out(SideId::Player), side_out(SideId::Opponent)) {
            (true, true) => Some(BattlePhase::Draw),
            (false, true) => Some(BattlePhase::Victory),
            (true, false) => Some(BattlePhase::Defeat),
            (false, false) => None,
        }
    }

    fn end_battle(&mut self, outcome: BattlePhase, bus: &mut EventBus) -> BattleEnded {
        self.phase = outcome;
        bus.push(BattleEvent::BattleEnded { phase: outcome });

        let surviving_roster = self
            .all_slots()
            .into_iter()
            .filter(|slot| !self.at(*slot).is_fainted())
            .map(|slot| {
                let c = self.at(slot);
                Survivor {
                    side: slot.side,
                    id: c.id.clone(),
                    name: c.name.clone(),
                    current_hp: c.current_hp(),
                    max_hp: c.max_hp(),
                }
            })
            .collect();

        let summary = BattleEnded {
            outcome,
            rounds: self.round,
            surviving_roster,
            total_actions: self.total_actions,
            total_damage: self.total_damage,
        };
        tracing::info!(
            session = %self.session_id,
            ?outcome,
            rounds = summary.rounds,
            total_actions = summary.total_actions,
            total_damage = summary.total_damage,
            "Battle ended"
        );
        self.result = Some(summary.clone());
        summary
    }

    // --- Between-turn requests ---

    /// Escape chance for a side: `base + fastest_speed / 100 * factor`,
    /// capped at the configured maximum.
    pub fn escape_chance(&self, side: SideId) -> f64 {
        let fastest = self
            .living(side)
            .into_iter()
            .map(|slot| effective_speed(self.at(slot)))
            .max()
            .unwrap_or(0);
        let chance = self.config.escape_base_chance
            + fastest as f64 / 100.0 * self.config.escape_speed_factor;
        chance.min(self.config.escape_max_chance)
    }

    /// Try to flee. Success ends the battle with `Escape`; failure costs
    /// nothing but the attempt.
    pub fn attempt_escape(
        &mut self,
        side: SideId,
        rng: &mut dyn BattleRng,
    ) -> BattleResult<EscapeAttempt> {
        self.ensure_active()?;
        let chance = self.escape_chance(side);
        let escaped = rng.probability_check(chance, "escape");

        let mut bus = EventBus::new();
        if escaped {
            bus.push(BattleEvent::Escaped { side });
            self.end_battle(BattlePhase::Escape, &mut bus);
        } else {
            bus.push(BattleEvent::EscapeFailed { side });
        }
        let log = self.record(&bus, self.round);
        tracing::info!(session = %self.session_id, ?side, chance, escaped, "Escape attempted");

        Ok(EscapeAttempt {
            side,
            chance,
            escaped,
            log,
        })
    }

    /// Remove a status through an outside cure (item, ability). Returns false
    /// if the combatant did not have it.
    pub fn cure_status(&mut self, combatant_id: &str, status: StatusKind) -> BattleResult<bool> {
        self.ensure_active()?;
        let slot = self
            .find(combatant_id)
            .ok_or_else(|| ValidationError::UnknownCombatant(combatant_id.to_string()))?;

        let Some(removed) = self.at_mut(slot).remove_status(status) else {
            return Ok(false);
        };

        let mut bus = EventBus::new();
        bus.push(BattleEvent::StatusRemoved {
            target: self.at(slot).name.clone(),
            status: removed.kind,
        });
        if affects_speed(removed.kind) {
            self.scheduler.mark_speed_changed();
            self.reorder_mid_round(&mut bus);
        }
        self.record(&bus, self.round);
        tracing::info!(session = %self.session_id, combatant = combatant_id, status = %removed.kind, "Status cured");
        Ok(true)
    }

    /// Cancel the battle between turns.
    pub fn abort(&mut self) -> BattleResult<BattleEnded> {
        if self.phase.is_terminal() {
            return Err(IllegalStateError::BattleFinished(self.phase).into());
        }
        let mut bus = EventBus::new();
        bus.push(BattleEvent::BattleAborted);
        let summary = self.end_battle(BattlePhase::Aborted, &mut bus);
        self.record(&bus, self.round);
        Ok(summary)
    }

    // --- Snapshots ---

    pub fn to_snapshot(&self) -> BattleResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| BattleEngineError::Snapshot(e.to_string()))
    }

    pub fn from_snapshot(bytes: &[u8]) -> BattleResult<Self> {
        postcard::from_bytes(bytes).map_err(|e| BattleEngineError::Snapshot(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn combatant_mut(&mut self, combatant_id: &str) -> &mut Combatant {
        let slot = self
            .find(combatant_id)
            .unwrap_or_else(|| panic!("no combatant {combatant_id} in session"));
        self.at_mut(slot)
    }

    // --- Helpers ---

    fn at(&self, slot: CombatantRef) -> &Combatant {
        &self.rosters[slot.side.to_index()][slot.index]
    }

    fn at_mut(&mut self, slot: CombatantRef) -> &mut Combatant {
        &mut self.rosters[slot.side.to_index()][slot.index]
    }

    fn all_slots(&self) -> Vec<CombatantRef> {
        [SideId::Player, SideId::Opponent]
            .into_iter()
            .flat_map(|side| {
                (0..self.rosters[side.to_index()].len()).map(move |index| CombatantRef::new(side, index))
            })
            .collect()
    }

    /// Effective speeds in roster order, player side first.
    fn speed_entries(&self) -> Vec<(CombatantRef, u16)> {
        self.all_slots()
            .into_iter()
            .map(|slot| (slot, effective_speed(self.at(slot))))
            .collect()
    }

    fn order_ids(&self) -> Vec<String> {
        self.scheduler
            .order()
            .into_iter()
            .map(|slot| self.at(slot).id.clone())
            .collect()
    }

    /// Append the text of `bus` to the battle log and return it joined.
    fn record(&mut self, bus: &EventBus, round: u32) -> String {
        let mut round = round;
        let mut lines = Vec::new();
        for event in bus.events() {
            if let BattleEvent::RoundStarted { round: next } = event {
                round = *next;
            }
            if let Some(line) = event.format() {
                self.log.push(round, line.clone());
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

fn side_name(side: SideId) -> &'static str {
    match side {
        SideId::Player => "player",
        SideId::Opponent => "opponent",
    }
}
