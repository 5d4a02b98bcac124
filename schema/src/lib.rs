// Rift Combat Schema - Shared type definitions
// This crate contains the core enums and stat blocks that are shared between
// the combat engine and any tooling that authors move or roster data.

// Re-export the main types
pub use combat_data::*;
pub use element_types::*;
pub use move_types::*;

pub mod combat_data;
pub mod element_types;
pub mod move_types;
