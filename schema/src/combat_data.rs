use crate::StatKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub speed: u8,
}

impl BaseStats {
    /// HP, ATK, DEF, SP.ATK, SP.DEF, SPD
    pub fn to_array(&self) -> [u8; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
    }

    pub fn from_array(values: [u8; 6]) -> Self {
        Self {
            hp: values[0],
            attack: values[1],
            defense: values[2],
            sp_attack: values[3],
            sp_defense: values[4],
            speed: values[5],
        }
    }
}

/// Derived combat stats. Cached on a combatant and recomputed on level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl StatBlock {
    pub fn get(&self, stat: StatKind) -> u16 {
        match stat {
            StatKind::Hp => self.hp,
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::SpAttack => self.sp_attack,
            StatKind::SpDefense => self.sp_defense,
            StatKind::Speed => self.speed,
        }
    }

    pub fn from_array(values: [u16; 6]) -> Self {
        Self {
            hp: values[0],
            attack: values[1],
            defense: values[2],
            sp_attack: values[3],
            sp_defense: values[4],
            speed: values[5],
        }
    }
}
