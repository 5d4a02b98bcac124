//! Tunable engine constants.
//!
//! Every number the combat pipeline multiplies by lives here so a deployment
//! can rebalance without a rebuild. Values are read from a RON file and fall
//! back to the defaults below for anything omitted.

use crate::errors::{ConfigResult, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Same-type attack bonus.
    pub stab_multiplier: f64,
    pub critical_multiplier: f64,
    /// Probability in `0.0..=1.0` of a critical hit per move use.
    pub critical_chance: f64,
    pub super_effective: f64,
    pub not_very_effective: f64,
    /// Floor applied to every damaging hit.
    pub min_damage: u32,
    /// Damage variance bounds, in percent.
    pub variance_min: u8,
    pub variance_max: u8,
    /// Percent chance that paralysis blocks the holder's action.
    pub paralysis_block_chance: u8,
    /// Percent chance that a confused combatant strikes itself.
    pub confusion_self_hit_chance: u8,
    pub confusion_self_hit_power: u16,
    /// Burn and poison deal `max_hp / residual_damage_divisor` each round.
    pub residual_damage_divisor: u16,
    /// Battle log ring buffer size.
    pub log_capacity: usize,
    pub max_moves: usize,
    pub escape_base_chance: f64,
    pub escape_speed_factor: f64,
    pub escape_max_chance: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            stab_multiplier: 1.5,
            critical_multiplier: 1.5,
            critical_chance: 0.125,
            super_effective: 2.0,
            not_very_effective: 0.5,
            min_damage: 1,
            variance_min: 85,
            variance_max: 100,
            paralysis_block_chance: 25,
            confusion_self_hit_chance: 33,
            confusion_self_hit_power: 40,
            residual_damage_divisor: 8,
            log_capacity: 64,
            max_moves: 4,
            escape_base_chance: 0.25,
            escape_speed_factor: 0.25,
            escape_max_chance: 0.9,
        }
    }
}

impl BattleConfig {
    /// Parse a config from RON text and validate it.
    pub fn from_ron_str(source_name: &str, content: &str) -> ConfigResult<Self> {
        let config: BattleConfig =
            ron::from_str(content).map_err(|e| ConfigurationError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_ron_str(&path.display().to_string(), &content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let probabilities = [
            ("critical_chance", self.critical_chance),
            ("escape_base_chance", self.escape_base_chance),
            ("escape_max_chance", self.escape_max_chance),
        ];
        for (setting, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(setting, "must be between 0.0 and 1.0"));
            }
        }

        let percents = [
            ("paralysis_block_chance", self.paralysis_block_chance),
            ("confusion_self_hit_chance", self.confusion_self_hit_chance),
            ("variance_max", self.variance_max),
        ];
        for (setting, value) in percents {
            if value > 100 {
                return Err(invalid(setting, "must be a percentage (0-100)"));
            }
        }

        if self.variance_min == 0 || self.variance_min > self.variance_max {
            return Err(invalid(
                "variance_min",
                "must be positive and not exceed variance_max",
            ));
        }
        if self.stab_multiplier <= 0.0
            || self.critical_multiplier <= 0.0
            || self.super_effective <= 0.0
            || self.not_very_effective <= 0.0
        {
            return Err(invalid("multipliers", "must be positive"));
        }
        if self.escape_speed_factor < 0.0 {
            return Err(invalid("escape_speed_factor", "must not be negative"));
        }
        if self.residual_damage_divisor == 0 {
            return Err(invalid("residual_damage_divisor", "must be non-zero"));
        }
        if self.log_capacity == 0 {
            return Err(invalid("log_capacity", "must be non-zero"));
        }
        if self.max_moves == 0 {
            return Err(invalid("max_moves", "must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(setting: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        setting: setting.to_string(),
        reason: reason.to_string(),
    }
}
