use crate::config::BattleConfig;
use schema::ElementType;

/// Damage multiplier for `attack` against a defender with `defender_types`.
///
/// Each defender type contributes independently, so a dual-type defender
/// that is weak to the attack twice takes `super_effective²`.
pub fn effectiveness_multiplier(
    attack: ElementType,
    defender_types: &[ElementType],
    config: &BattleConfig,
) -> f64 {
    defender_types
        .iter()
        .fold(1.0, |multiplier, defender| {
            if attack.strong_against().contains(defender) {
                multiplier * config.super_effective
            } else if attack.weak_against().contains(defender) {
                multiplier * config.not_very_effective
            } else {
                multiplier
            }
        })
}

/// Name-keyed lookup for callers holding raw type strings. An attack type
/// missing from the table is neutral rather than an error.
pub fn effectiveness_for_name(
    attack: &str,
    defender_types: &[ElementType],
    config: &BattleConfig,
) -> f64 {
    match ElementType::from_name(attack) {
        Some(element) => effectiveness_multiplier(element, defender_types, config),
        None => {
            tracing::debug!(attack, "Unknown attack type, treating as neutral");
            1.0
        }
    }
}
