use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

/// Who a move may be aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    Enemy,
    Ally,
    User,
    AllEnemies,
    AllAllies,
}

impl TargetType {
    /// Moves aimed at the opposing side.
    pub fn is_offensive(self) -> bool {
        matches!(self, TargetType::Enemy | TargetType::AllEnemies)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Enemy => write!(f, "Enemy"),
            TargetType::Ally => write!(f, "Ally"),
            TargetType::User => write!(f, "User"),
            TargetType::AllEnemies => write!(f, "All Enemies"),
            TargetType::AllAllies => write!(f, "All Allies"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Hp,
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Hp => write!(f, "HP"),
            StatKind::Attack => write!(f, "Attack"),
            StatKind::Defense => write!(f, "Defense"),
            StatKind::SpAttack => write!(f, "Special Attack"),
            StatKind::SpDefense => write!(f, "Special Defense"),
            StatKind::Speed => write!(f, "Speed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Burn,
    Freeze,
    Paralysis,
    Poison,
    Confusion,
    Sleep,
    Stun,
    Protect,
    StatModifier { stat: StatKind, stages: i8 },
}

impl StatusKind {
    /// Identity used for duplicate detection: stat modifiers are keyed by
    /// stat, every other kind by its variant.
    pub fn same_slot(self, other: StatusKind) -> bool {
        match (self, other) {
            (
                StatusKind::StatModifier { stat: a, .. },
                StatusKind::StatModifier { stat: b, .. },
            ) => a == b,
            (a, b) => std::mem::discriminant(&a) == std::mem::discriminant(&b),
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Burn => write!(f, "burn"),
            StatusKind::Freeze => write!(f, "freeze"),
            StatusKind::Paralysis => write!(f, "paralysis"),
            StatusKind::Poison => write!(f, "poison"),
            StatusKind::Confusion => write!(f, "confusion"),
            StatusKind::Sleep => write!(f, "sleep"),
            StatusKind::Stun => write!(f, "stun"),
            StatusKind::Protect => write!(f, "protect"),
            StatusKind::StatModifier { stat, stages } if *stages >= 0 => {
                write!(f, "{} +{}", stat, stages)
            }
            StatusKind::StatModifier { stat, stages } => write!(f, "{} {}", stat, stages),
        }
    }
}
