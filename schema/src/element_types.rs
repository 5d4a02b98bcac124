use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ElementType {
    Fire,
    Water,
    Wind,
    Earth,
    Light,
    Dark,
    Neutral,
}

impl ElementType {
    /// Defender types this element deals super-effective damage to.
    pub fn strong_against(self) -> &'static [ElementType] {
        use ElementType::*;

        match self {
            Fire => &[Wind, Earth],
            Water => &[Fire, Earth],
            Wind => &[Water],
            Earth => &[Wind],
            Light => &[Dark],
            Dark => &[Light],
            Neutral => &[],
        }
    }

    /// Defender types that resist this element.
    pub fn weak_against(self) -> &'static [ElementType] {
        use ElementType::*;

        match self {
            Fire => &[Fire, Water],
            Water => &[Water, Wind],
            Wind => &[Fire, Wind, Earth],
            Earth => &[Fire, Water, Earth],
            Light => &[Light],
            Dark => &[Dark],
            Neutral => &[],
        }
    }

    /// Parse an element by name, ignoring case. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<ElementType> {
        name.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn no_type_is_both_strong_and_weak_against_the_same_defender() {
        for attacker in ElementType::iter() {
            for defender in attacker.strong_against() {
                assert!(
                    !attacker.weak_against().contains(defender),
                    "{} lists {} as both strong and weak",
                    attacker,
                    defender
                );
            }
        }
    }

    #[test]
    fn neutral_has_no_relationships() {
        assert!(ElementType::Neutral.strong_against().is_empty());
        assert!(ElementType::Neutral.weak_against().is_empty());
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(ElementType::from_name("fire"), Some(ElementType::Fire));
        assert_eq!(ElementType::from_name("DARK"), Some(ElementType::Dark));
        assert_eq!(ElementType::from_name("Chrono"), None);
    }
}
