use crate::battle::state::BattlePhase;
use schema::StatusKind;
use thiserror::Error;

/// Main error type for the Rift combat engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    /// Malformed or out-of-turn action submission
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// Operation attempted in a phase that does not allow it
    #[error("Illegal state: {0}")]
    IllegalState(#[from] IllegalStateError),
    /// Data-integrity fault in moves, rosters or engine configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// A session snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Rejected action submissions. Session state is never mutated when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown battle session: {0}")]
    UnknownSession(String),
    #[error("Unknown combatant: {0}")]
    UnknownCombatant(String),
    #[error("It is not {actor}'s turn (waiting on {expected})")]
    NotYourTurn { actor: String, expected: String },
    #[error("{actor} does not know the move {move_id}")]
    UnknownMove { actor: String, move_id: String },
    #[error("{move_id} cannot target {target}: {reason}")]
    InvalidTarget {
        move_id: String,
        target: String,
        reason: String,
    },
    #[error("{move_id} needs a target")]
    MissingTarget { move_id: String },
    #[error("{0} has fainted and cannot be targeted")]
    TargetFainted(String),
    #[error("{actor} cannot act while affected by {status}")]
    ActorBlocked { actor: String, status: StatusKind },
}

/// Operations that the current battle phase does not permit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalStateError {
    #[error("The battle has already ended ({0:?})")]
    BattleFinished(BattlePhase),
    #[error("The battle has not started yet")]
    NotStarted,
    #[error("The battle has already started")]
    AlreadyStarted,
    #[error("{0} is not blocked and must choose an action")]
    ActorNotBlocked(String),
    #[error("No combatant is able to act")]
    NoActorAvailable,
    #[error("Session {0} is no longer running")]
    SessionClosed(String),
    #[error("No automated choice available for {0}")]
    NoAutomatedChoice(String),
}

/// Load-time faults in static data. A session holding any of these never
/// leaves `Setup`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("Failed to parse {source_name}: {message}")]
    Parse { source_name: String, message: String },
    #[error("Move {move_id} referenced by {combatant} is not in the catalog")]
    UnknownMove { combatant: String, move_id: String },
    #[error("Move {0} is defined more than once")]
    DuplicateMove(String),
    #[error("Move {move_id}: {reason}")]
    InvalidMove { move_id: String, reason: String },
    #[error("Combatant id {0} is used more than once")]
    DuplicateCombatant(String),
    #[error("Combatant {combatant}: {reason}")]
    InvalidCombatant { combatant: String, reason: String },
    #[error("Roster {0} has no combatants")]
    EmptyRoster(String),
    #[error("Roster {0} is not defined")]
    UnknownRoster(String),
    #[error("Invalid engine setting {setting}: {reason}")]
    InvalidSetting { setting: String, reason: String },
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using ConfigurationError
pub type ConfigResult<T> = Result<T, ConfigurationError>;
