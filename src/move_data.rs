use crate::errors::{ConfigResult, ConfigurationError};
use schema::{ElementType, MoveCategory, StatusKind, TargetType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const MAX_STAGE_DELTA: i8 = 6;

/// A status a move may inflict on each of its targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveEffect {
    pub status: StatusKind,
    /// Percent chance (1-100) per target.
    pub chance: u8,
    /// Overrides the registry's default duration when set.
    #[serde(default)]
    pub duration: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub id: String,
    pub name: String,
    pub element: ElementType,
    pub category: MoveCategory,
    /// 0 for pure status moves.
    #[serde(default)]
    pub power: u16,
    /// Percent chance to hit, 0-100.
    pub accuracy: u8,
    pub target: TargetType,
    #[serde(default)]
    pub effect: Option<MoveEffect>,
    /// Percent of damage dealt returned to the user.
    #[serde(default)]
    pub recoil_percent: u8,
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status && self.power > 0
    }

    /// Reject data the engine cannot resolve.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("id must not be empty"));
        }
        if self.accuracy > 100 {
            return Err(self.invalid("accuracy must be between 0 and 100"));
        }
        match self.category {
            MoveCategory::Status if self.power != 0 => {
                return Err(self.invalid("status moves must have zero power"));
            }
            MoveCategory::Physical | MoveCategory::Special if self.power == 0 => {
                return Err(self.invalid("damaging moves need positive power"));
            }
            _ => {}
        }
        if self.recoil_percent > 100 {
            return Err(self.invalid("recoil_percent must be between 0 and 100"));
        }
        if self.category == MoveCategory::Status && self.effect.is_none() {
            return Err(self.invalid("status moves must inflict a status"));
        }
        if let Some(effect) = &self.effect {
            if effect.chance == 0 || effect.chance > 100 {
                return Err(self.invalid("effect chance must be between 1 and 100"));
            }
            if let Some(duration) = effect.duration {
                if duration == 0 || duration < -1 {
                    return Err(self.invalid("effect duration must be positive or -1"));
                }
            }
            if let StatusKind::StatModifier { stat, stages } = effect.status {
                if stages == 0 || stages.abs() > MAX_STAGE_DELTA {
                    return Err(self.invalid("stat modifier stages must be within -6..=6 and non-zero"));
                }
                if stat == schema::StatKind::Hp {
                    return Err(self.invalid("HP cannot carry stat stages"));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> ConfigurationError {
        ConfigurationError::InvalidMove {
            move_id: self.id.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Immutable move table, loaded once and shared by every session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCatalog {
    moves: HashMap<String, MoveData>,
}

impl MoveCatalog {
    /// Build a catalog, validating each move and rejecting duplicate ids.
    pub fn from_moves(moves: Vec<MoveData>) -> ConfigResult<Self> {
        let mut map = HashMap::with_capacity(moves.len());
        for move_data in moves {
            move_data.validate()?;
            if map.contains_key(&move_data.id) {
                return Err(ConfigurationError::DuplicateMove(move_data.id));
            }
            map.insert(move_data.id.clone(), move_data);
        }
        Ok(Self { moves: map })
    }

    /// Parse a RON list of moves.
    pub fn from_ron_str(source_name: &str, content: &str) -> ConfigResult<Self> {
        let moves: Vec<MoveData> =
            ron::from_str(content).map_err(|e| ConfigurationError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        Self::from_moves(moves)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let catalog = Self::from_ron_str(&path.display().to_string(), &content)?;
        tracing::info!(moves = catalog.len(), "Loaded move catalog from {}", path.display());
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&MoveData> {
        self.moves.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.moves.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveData> {
        self.moves.values()
    }
}
