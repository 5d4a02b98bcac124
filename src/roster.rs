use crate::battle::engine::BattleSession;
use crate::battle::stats::{Nature, MAX_LEVEL, MIN_LEVEL};
use crate::bonding::BondLevel;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::errors::{ConfigResult, ConfigurationError};
use crate::move_data::MoveCatalog;
use schema::{BaseStats, ElementType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Authored description of a combatant, as stored in roster files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantTemplate {
    pub id: String,
    pub name: String,
    pub elements: Vec<ElementType>,
    pub base_stats: BaseStats,
    pub level: u8,
    #[serde(default)]
    pub ivs: Option<[u8; 6]>,
    #[serde(default)]
    pub evs: Option<[u8; 6]>,
    #[serde(default)]
    pub nature: Option<Nature>,
    #[serde(default)]
    pub bond_points: u16,
    pub moves: Vec<String>,
}

impl CombatantTemplate {
    pub fn instantiate(&self) -> Combatant {
        let mut combatant = Combatant::new(
            self.id.clone(),
            self.name.clone(),
            self.elements.clone(),
            self.base_stats,
            self.level,
            self.moves.clone(),
        )
        .with_bond(BondLevel::from_points(self.bond_points));
        if let Some(ivs) = self.ivs {
            combatant = combatant.with_ivs(ivs);
        }
        if let Some(evs) = self.evs {
            combatant = combatant.with_evs(evs);
        }
        if let Some(nature) = self.nature {
            combatant = combatant.with_nature(nature);
        }
        combatant
    }

    /// Check shape and move references against the catalog.
    pub fn validate(&self, catalog: &MoveCatalog, config: &BattleConfig) -> ConfigResult<()> {
        // Combatant::new clamps the level, so range errors are caught here.
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(ConfigurationError::InvalidCombatant {
                combatant: self.id.clone(),
                reason: format!("level must be between {MIN_LEVEL} and {MAX_LEVEL}"),
            });
        }
        if let Some(ivs) = self.ivs {
            if ivs.iter().any(|iv| *iv > 31) {
                return Err(ConfigurationError::InvalidCombatant {
                    combatant: self.id.clone(),
                    reason: "individual values must be between 0 and 31".to_string(),
                });
            }
        }
        self.instantiate().validate(config.max_moves)?;
        for move_id in &self.moves {
            if !catalog.contains(move_id) {
                return Err(ConfigurationError::UnknownMove {
                    combatant: self.id.clone(),
                    move_id: move_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Everything loaded from a data directory: engine settings, moves and
/// named rosters. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct GameData {
    pub config: BattleConfig,
    pub moves: MoveCatalog,
    pub rosters: BTreeMap<String, Vec<CombatantTemplate>>,
}

impl GameData {
    /// Validate every roster against the catalog.
    pub fn from_parts(
        config: BattleConfig,
        moves: MoveCatalog,
        rosters: BTreeMap<String, Vec<CombatantTemplate>>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        for (name, templates) in &rosters {
            if templates.is_empty() {
                return Err(ConfigurationError::EmptyRoster(name.clone()));
            }
            let mut seen = Vec::with_capacity(templates.len());
            for template in templates {
                template.validate(&moves, &config)?;
                if seen.contains(&&template.id) {
                    return Err(ConfigurationError::DuplicateCombatant(template.id.clone()));
                }
                seen.push(&template.id);
            }
        }
        Ok(Self {
            config,
            moves,
            rosters,
        })
    }

    /// Load `config.ron` (optional), `moves.ron` and `rosters.ron` from `dir`.
    pub fn load(dir: &Path) -> ConfigResult<Self> {
        let config = BattleConfig::load(&dir.join("config.ron"))?;
        let moves = MoveCatalog::load(&dir.join("moves.ron"))?;

        let rosters_path = dir.join("rosters.ron");
        let content = fs::read_to_string(&rosters_path).map_err(|e| ConfigurationError::Io {
            path: rosters_path.display().to_string(),
            message: e.to_string(),
        })?;
        let rosters = parse_rosters(&rosters_path.display().to_string(), &content)?;

        let data = Self::from_parts(config, moves, rosters)?;
        tracing::info!(
            moves = data.moves.len(),
            rosters = data.rosters.len(),
            "Loaded game data from {}",
            dir.display()
        );
        Ok(data)
    }

    pub fn roster(&self, name: &str) -> ConfigResult<Vec<Combatant>> {
        let templates = self
            .rosters
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownRoster(name.to_string()))?;
        Ok(templates.iter().map(CombatantTemplate::instantiate).collect())
    }

    /// Build a session in `Setup` from two named rosters.
    pub fn new_session(
        &self,
        session_id: impl Into<String>,
        player_roster: &str,
        opponent_roster: &str,
    ) -> ConfigResult<BattleSession> {
        BattleSession::with_rosters(
            session_id,
            self.roster(player_roster)?,
            self.roster(opponent_roster)?,
            &self.moves,
            self.config.clone(),
        )
    }
}

pub fn parse_rosters(
    source_name: &str,
    content: &str,
) -> ConfigResult<BTreeMap<String, Vec<CombatantTemplate>>> {
    ron::from_str(content).map_err(|e| ConfigurationError::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}
