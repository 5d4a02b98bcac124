//! Single-writer session worker.
//!
//! Each battle is owned by one tokio task. Commands arrive on an mpsc
//! channel and are handled strictly one at a time, so turn resolution for a
//! session can never interleave. Resolved turns and results are published on
//! a broadcast channel for any number of subscribers.

use crate::battle::engine::{BattleEnded, EscapeAttempt, TurnResolved};
use crate::battle::runner::{BattleObserver, BattleRunner, CureOutcome};
use crate::battle::state::{SeededRng, SideId};
use crate::errors::{BattleEngineError, BattleResult, IllegalStateError, ValidationError};
use schema::StatusKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 128;

/// Commands that can be sent to a session worker
pub enum SessionCommand {
    Submit {
        actor_id: String,
        move_id: String,
        target_id: Option<String>,
        reply: oneshot::Sender<BattleResult<Vec<TurnResolved>>>,
    },
    Flee {
        side: SideId,
        reply: oneshot::Sender<BattleResult<EscapeAttempt>>,
    },
    Cure {
        combatant_id: String,
        status: StatusKind,
        reply: oneshot::Sender<BattleResult<CureOutcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<BattleResult<Vec<u8>>>,
    },
    Abort {
        reply: oneshot::Sender<BattleResult<BattleEnded>>,
    },
}

/// Published to subscribers of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    TurnResolved(Box<TurnResolved>),
    EscapeAttempted(EscapeAttempt),
    BattleEnded(BattleEnded),
}

impl SessionEvent {
    /// JSON form handed to the transport layer.
    pub fn to_json(&self) -> BattleResult<String> {
        serde_json::to_string(self).map_err(|e| BattleEngineError::Snapshot(e.to_string()))
    }
}

/// Forwards runner output onto the broadcast channel.
struct BroadcastObserver {
    event_tx: broadcast::Sender<SessionEvent>,
}

impl BattleObserver for BroadcastObserver {
    fn on_turn_resolved(&mut self, turn: &TurnResolved) {
        // No subscribers is not an error.
        let _ = self
            .event_tx
            .send(SessionEvent::TurnResolved(Box::new(turn.clone())));
    }

    fn on_battle_ended(&mut self, result: &BattleEnded) {
        let _ = self.event_tx.send(SessionEvent::BattleEnded(result.clone()));
    }
}

/// Background task that owns one battle.
pub struct SessionWorker {
    session_id: String,
    runner: BattleRunner,
    rng: SeededRng,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionWorker {
    pub fn new(
        mut runner: BattleRunner,
        rng: SeededRng,
        command_rx: mpsc::Receiver<SessionCommand>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        runner.add_observer(Box::new(BroadcastObserver {
            event_tx: event_tx.clone(),
        }));
        let session_id = runner.session().session_id().to_string();
        tracing::info!(session = %session_id, "SessionWorker initialized");
        Self {
            session_id,
            runner,
            rng,
            command_rx,
            event_tx,
        }
    }

    /// Main worker loop. Ends when every handle has been dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }
        debug!(session = %self.session_id, "SessionWorker stopped");
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Submit {
                actor_id,
                move_id,
                target_id,
                reply,
            } => {
                let result = self.runner.submit_action(
                    &actor_id,
                    &move_id,
                    target_id.as_deref(),
                    &mut self.rng,
                );
                if reply.send(result).is_err() {
                    debug!("Submit reply channel closed (caller dropped)");
                }
            }
            SessionCommand::Flee { side, reply } => {
                let result = self.runner.attempt_escape(side, &mut self.rng);
                if let Ok(attempt) = &result {
                    let _ = self
                        .event_tx
                        .send(SessionEvent::EscapeAttempted(attempt.clone()));
                }
                if reply.send(result).is_err() {
                    debug!("Flee reply channel closed (caller dropped)");
                }
            }
            SessionCommand::Cure {
                combatant_id,
                status,
                reply,
            } => {
                let result = self.runner.cure_status(&combatant_id, status, &mut self.rng);
                if reply.send(result).is_err() {
                    debug!("Cure reply channel closed (caller dropped)");
                }
            }
            SessionCommand::Snapshot { reply } => {
                if reply.send(self.runner.snapshot()).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
            SessionCommand::Abort { reply } => {
                if reply.send(self.runner.abort()).is_err() {
                    debug!("Abort reply channel closed (caller dropped)");
                }
            }
        }
    }
}

/// Client-facing handle to one session worker
#[derive(Clone, Debug)]
pub struct SessionHandle {
    session_id: String,
    command_tx: mpsc::Sender<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Spawn a worker for `runner` on the current tokio runtime. Automated
    /// opening turns are played before the first command is accepted.
    pub fn spawn(mut runner: BattleRunner, mut rng: SeededRng) -> BattleResult<Self> {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _event_rx) = broadcast::channel(EVENT_BUFFER);

        if !runner.session().is_active() {
            runner.start(&mut rng)?;
        }
        let session_id = runner.session().session_id().to_string();
        let worker = SessionWorker::new(runner, rng, command_rx, event_tx.clone());
        tokio::spawn(worker.run());

        Ok(Self {
            session_id,
            command_tx,
            event_tx,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub async fn submit_action(
        &self,
        actor_id: &str,
        move_id: &str,
        target_id: Option<&str>,
    ) -> BattleResult<Vec<TurnResolved>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Submit {
            actor_id: actor_id.to_string(),
            move_id: move_id.to_string(),
            target_id: target_id.map(str::to_string),
            reply,
        })
        .await?;
        self.receive(reply_rx).await?
    }

    pub async fn flee(&self, side: SideId) -> BattleResult<EscapeAttempt> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Flee { side, reply }).await?;
        self.receive(reply_rx).await?
    }

    pub async fn cure_status(
        &self,
        combatant_id: &str,
        status: StatusKind,
    ) -> BattleResult<CureOutcome> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Cure {
            combatant_id: combatant_id.to_string(),
            status,
            reply,
        })
        .await?;
        self.receive(reply_rx).await?
    }

    pub async fn snapshot(&self) -> BattleResult<Vec<u8>> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        self.receive(reply_rx).await?
    }

    pub async fn abort(&self) -> BattleResult<BattleEnded> {
        let (reply, reply_rx) = oneshot::channel();
        self.send(SessionCommand::Abort { reply }).await?;
        self.receive(reply_rx).await?
    }

    async fn send(&self, cmd: SessionCommand) -> BattleResult<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| IllegalStateError::SessionClosed(self.session_id.clone()).into())
    }

    async fn receive<T>(&self, reply_rx: oneshot::Receiver<T>) -> BattleResult<T> {
        reply_rx
            .await
            .map_err(|_| IllegalStateError::SessionClosed(self.session_id.clone()).into())
    }
}

/// Routes requests to session workers by session id.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, SessionHandle>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a worker for the runner's session and register its handle.
    pub fn open(&mut self, runner: BattleRunner, rng: SeededRng) -> BattleResult<SessionHandle> {
        let handle = SessionHandle::spawn(runner, rng)?;
        self.sessions
            .insert(handle.session_id().to_string(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, session_id: &str) -> BattleResult<&SessionHandle> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| ValidationError::UnknownSession(session_id.to_string()).into())
    }

    /// Drop the handle. The worker stops once every clone is gone.
    pub fn close(&mut self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.remove(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub async fn submit_action(
        &self,
        session_id: &str,
        actor_id: &str,
        move_id: &str,
        target_id: Option<&str>,
    ) -> BattleResult<Vec<TurnResolved>> {
        self.get(session_id)?
            .submit_action(actor_id, move_id, target_id)
            .await
    }

    pub async fn flee(&self, session_id: &str, side: SideId) -> BattleResult<EscapeAttempt> {
        self.get(session_id)?.flee(side).await
    }

    pub async fn abort(&self, session_id: &str) -> BattleResult<BattleEnded> {
        self.get(session_id)?.abort().await
    }
}
