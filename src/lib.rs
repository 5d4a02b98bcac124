//! Rift Combat Engine
//!
//! Turn-based combat resolution for the Rift creature-collection game.
//! Sessions are plain data: every decision that involves chance draws from an
//! injected [`BattleRng`], so a seeded battle always replays the same way.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod bonding;
pub mod combatant;
pub mod config;
pub mod errors;
pub mod move_data;
pub mod roster;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    BaseStats, ElementType, MoveCategory, StatBlock, StatKind, StatusKind, TargetType,
};

// --- From this crate ---
pub use battle::ai::{Behavior, ChosenAction, ScoringAI};
pub use battle::engine::{
    BattleEnded, BattleSession, EscapeAttempt, Survivor, TargetOutcome, TurnResolved,
};
pub use battle::runner::{BattleObserver, BattleRunner, CureOutcome, SideController};
pub use battle::state::{
    BattleEvent, BattleLog, BattlePhase, BattleRng, CombatantRef, SeededRng, SideId, TurnRng,
};
pub use battle::worker::{SessionEvent, SessionHandle, SessionManager};
pub use bonding::BondLevel;
pub use combatant::Combatant;
pub use config::BattleConfig;
pub use errors::{
    BattleEngineError, BattleResult, ConfigResult, ConfigurationError, IllegalStateError,
    ValidationError,
};
pub use move_data::{MoveCatalog, MoveData, MoveEffect};
pub use roster::{CombatantTemplate, GameData};
