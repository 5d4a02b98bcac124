use crate::battle::ai::{Behavior, ScoringAI};
use crate::battle::engine::{BattleEnded, BattleSession, EscapeAttempt, TurnResolved};
use crate::battle::state::{BattlePhase, BattleRng, CombatantRef, SideId};
use crate::errors::{BattleResult, IllegalStateError};
use schema::StatusKind;

/// Receives the session's outputs as they happen.
pub trait BattleObserver {
    fn on_turn_resolved(&mut self, turn: &TurnResolved);
    fn on_battle_ended(&mut self, result: &BattleEnded);
}

/// Who picks actions for a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideController {
    /// Actions arrive through `submit_action`.
    External,
    /// Actions are picked by the runner's `Behavior`.
    Automated,
}

/// Information about the current battle state for API queries
#[derive(Debug, Clone, PartialEq)]
pub struct BattleInfo {
    pub session_id: String,
    pub round: u32,
    pub phase: BattlePhase,
    pub pending_actor: Option<String>,
    pub turn_order: Vec<String>,
    pub combatants: Vec<CombatantInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombatantInfo {
    pub side: SideId,
    pub id: String,
    pub name: String,
    pub current_hp: u16,
    pub max_hp: u16,
    pub is_fainted: bool,
    pub statuses: Vec<StatusKind>,
}

/// An outside cure and the automated turns it unblocked.
#[derive(Debug, Clone, PartialEq)]
pub struct CureOutcome {
    pub cured: bool,
    pub turns: Vec<TurnResolved>,
}

/// Drives a `BattleSession`: resolves automated and blocked turns, keeps a
/// turn history and notifies observers.
pub struct BattleRunner {
    session: BattleSession,
    controllers: [SideController; 2],
    behavior: Box<dyn Behavior + Send + Sync>,
    observers: Vec<Box<dyn BattleObserver + Send>>,
    history: Vec<TurnResolved>,
    end_reported: bool,
}

impl std::fmt::Debug for BattleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleRunner")
            .field("session", &self.session.session_id())
            .field("phase", &self.session.phase())
            .field("controllers", &self.controllers)
            .field("observers", &self.observers.len())
            .field("history", &self.history.len())
            .finish()
    }
}

impl BattleRunner {
    pub fn new(session: BattleSession, player: SideController, opponent: SideController) -> Self {
        Self {
            session,
            controllers: [player, opponent],
            behavior: Box::new(ScoringAI::new()),
            observers: Vec::new(),
            history: Vec::new(),
            end_reported: false,
        }
    }

    pub fn with_behavior(mut self, behavior: Box<dyn Behavior + Send + Sync>) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn BattleObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn into_session(self) -> BattleSession {
        self.session
    }

    pub fn controller(&self, side: SideId) -> SideController {
        self.controllers[side.to_index()]
    }

    /// Start the battle and play out any leading automated turns.
    pub fn start(&mut self, rng: &mut dyn BattleRng) -> BattleResult<Vec<TurnResolved>> {
        self.session.start()?;
        let mut resolved = Vec::new();
        self.follow_up(rng, &mut resolved);
        Ok(resolved)
    }

    /// Submit an externally chosen action, then play out automated turns
    /// until input is needed again or the battle ends.
    pub fn submit_action(
        &mut self,
        actor_id: &str,
        move_id: &str,
        target_id: Option<&str>,
        rng: &mut dyn BattleRng,
    ) -> BattleResult<Vec<TurnResolved>> {
        let turn = self
            .session
            .submit_action(actor_id, move_id, target_id, rng)?;
        let mut resolved = vec![turn.clone()];
        self.dispatch(turn);
        self.follow_up(rng, &mut resolved);
        Ok(resolved)
    }

    /// Resolve every turn that needs no outside input: blocked actors and
    /// automated sides.
    pub fn advance(&mut self, rng: &mut dyn BattleRng) -> BattleResult<Vec<TurnResolved>> {
        let mut resolved = Vec::new();
        self.advance_into(rng, &mut resolved)?;
        Ok(resolved)
    }

    fn advance_into(
        &mut self,
        rng: &mut dyn BattleRng,
        resolved: &mut Vec<TurnResolved>,
    ) -> BattleResult<()> {
        while let Some(turn) = self.step(rng)? {
            resolved.push(turn);
        }
        Ok(())
    }

    /// Advance after a request that already took effect. A failure stops the
    /// automated play and is logged; the request still succeeded, and a later
    /// `advance` reports the same error.
    fn follow_up(&mut self, rng: &mut dyn BattleRng, resolved: &mut Vec<TurnResolved>) {
        if let Err(err) = self.advance_into(rng, resolved) {
            tracing::warn!(
                session = %self.session.session_id(),
                error = %err,
                "Automated turns stopped"
            );
        }
    }

    /// Resolve the pending turn if it needs no outside input.
    fn step(&mut self, rng: &mut dyn BattleRng) -> BattleResult<Option<TurnResolved>> {
        let Some(actor) = self.session.pending_actor() else {
            return Ok(None);
        };
        let turn = if self.session.pending_actor_block().is_some() {
            self.session.pass_blocked_turn()?
        } else if self.controller(actor.side) == SideController::Automated {
            let actor_id = self.actor_id(actor);
            let choice = self
                .behavior
                .decide_action(&self.session, actor)
                .ok_or_else(|| IllegalStateError::NoAutomatedChoice(actor_id.clone()))?;
            self.session.submit_action(
                &actor_id,
                &choice.move_id,
                choice.target_id.as_deref(),
                rng,
            )?
        } else {
            return Ok(None);
        };
        self.dispatch(turn.clone());
        Ok(Some(turn))
    }

    /// Play an all-automated battle to the end. Battles still running after
    /// `max_turns` resolved turns are aborted.
    pub fn run_to_completion(
        &mut self,
        rng: &mut dyn BattleRng,
        max_turns: usize,
    ) -> BattleResult<BattleEnded> {
        if self.session.phase() == BattlePhase::Setup {
            self.session.start()?;
        }
        let mut turns = 0;
        while self.session.is_active() {
            if turns >= max_turns {
                tracing::warn!(
                    session = %self.session.session_id(),
                    max_turns,
                    "Turn limit reached, aborting battle"
                );
                return self.abort();
            }
            if self.step(rng)?.is_none() {
                // An external side is waiting for input.
                let waiting = self
                    .session
                    .pending_actor()
                    .map(|slot| self.actor_id(slot))
                    .unwrap_or_default();
                return Err(IllegalStateError::NoAutomatedChoice(waiting).into());
            }
            turns += 1;
        }
        self.session
            .result()
            .cloned()
            .ok_or_else(|| IllegalStateError::NotStarted.into())
    }

    /// Flee on behalf of a side between turns.
    pub fn attempt_escape(
        &mut self,
        side: SideId,
        rng: &mut dyn BattleRng,
    ) -> BattleResult<EscapeAttempt> {
        let attempt = self.session.attempt_escape(side, rng)?;
        self.report_end();
        Ok(attempt)
    }

    /// Cure between turns. A cure can reorder the round, so automated turns
    /// that become due are played out.
    pub fn cure_status(
        &mut self,
        combatant_id: &str,
        status: StatusKind,
        rng: &mut dyn BattleRng,
    ) -> BattleResult<CureOutcome> {
        let cured = self.session.cure_status(combatant_id, status)?;
        let mut turns = Vec::new();
        if cured {
            self.follow_up(rng, &mut turns);
        }
        Ok(CureOutcome { cured, turns })
    }

    pub fn abort(&mut self) -> BattleResult<BattleEnded> {
        let result = self.session.abort()?;
        self.report_end();
        Ok(result)
    }

    pub fn snapshot(&self) -> BattleResult<Vec<u8>> {
        self.session.to_snapshot()
    }

    /// The external actor whose action is awaited, if any.
    pub fn awaiting_input(&self) -> Option<CombatantRef> {
        let actor = self.session.pending_actor()?;
        if self.controller(actor.side) == SideController::External
            && self.session.pending_actor_block().is_none()
        {
            Some(actor)
        } else {
            None
        }
    }

    /// Get current battle information for API queries
    pub fn battle_info(&self) -> BattleInfo {
        let combatants = [SideId::Player, SideId::Opponent]
            .into_iter()
            .flat_map(|side| {
                self.session.roster(side).iter().map(move |c| CombatantInfo {
                    side,
                    id: c.id.clone(),
                    name: c.name.clone(),
                    current_hp: c.current_hp(),
                    max_hp: c.max_hp(),
                    is_fainted: c.is_fainted(),
                    statuses: c.statuses().iter().map(|e| e.kind).collect(),
                })
            })
            .collect();

        BattleInfo {
            session_id: self.session.session_id().to_string(),
            round: self.session.round(),
            phase: self.session.phase(),
            pending_actor: self.session.pending_actor().map(|slot| self.actor_id(slot)),
            turn_order: self
                .session
                .turn_order()
                .into_iter()
                .map(|slot| self.actor_id(slot))
                .collect(),
            combatants,
        }
    }

    /// Get all turns resolved so far
    pub fn history(&self) -> &[TurnResolved] {
        &self.history
    }

    /// Get turns since a certain index (for incremental updates)
    pub fn turns_since(&self, index: usize) -> &[TurnResolved] {
        if index < self.history.len() {
            &self.history[index..]
        } else {
            &[]
        }
    }

    fn actor_id(&self, slot: CombatantRef) -> String {
        self.session
            .combatant(slot)
            .map(|c| c.id.clone())
            .unwrap_or_default()
    }

    fn dispatch(&mut self, turn: TurnResolved) {
        for observer in &mut self.observers {
            observer.on_turn_resolved(&turn);
        }
        self.history.push(turn);
        self.report_end();
    }

    /// Report the battle result exactly once.
    fn report_end(&mut self) {
        if self.end_reported {
            return;
        }
        if let Some(result) = self.session.result() {
            for observer in &mut self.observers {
                observer.on_battle_ended(result);
            }
            self.end_reported = true;
        }
    }
}
