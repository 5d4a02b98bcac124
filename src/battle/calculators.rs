use crate::battle::effectiveness::effectiveness_multiplier;
use crate::battle::state::BattleRng;
use crate::battle::stats::{effective_attack, effective_defense};
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::move_data::MoveData;
use schema::MoveCategory;

/// Result of one damage roll against one defender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub damage: u32,
    pub critical: bool,
    pub effectiveness: f64,
    pub stab: bool,
}

/// Accuracy check. Always draws, so the random stream stays aligned
/// whether or not the move can miss.
pub fn move_hits(move_data: &MoveData, rng: &mut dyn BattleRng) -> bool {
    rng.percent_check(move_data.accuracy, "accuracy")
}

/// `floor((2*level/5 + 2) * power * atk / (def * 50) + 2)`, before multipliers.
pub fn base_damage(level: u8, power: u16, attack: u16, defense: u16) -> f64 {
    let level_factor = 2.0 * level as f64 / 5.0 + 2.0;
    let defense = defense.max(1) as f64;
    (level_factor * power as f64 * attack as f64 / (defense * 50.0) + 2.0).floor()
}

/// Full damage pipeline: base damage, type effectiveness, STAB, critical
/// hit, variance, then floor and clamp to the configured minimum.
///
/// Draws the critical roll and then the variance roll. Moves without power
/// deal no damage and make no draws.
pub fn compute_damage(
    attacker: &Combatant,
    defender: &Combatant,
    move_data: &MoveData,
    config: &BattleConfig,
    rng: &mut dyn BattleRng,
) -> DamageOutcome {
    if !move_data.is_damaging() {
        return DamageOutcome {
            damage: 0,
            critical: false,
            effectiveness: 1.0,
            stab: false,
        };
    }

    let attack = effective_attack(attacker, move_data.category);
    let defense = effective_defense(defender, move_data.category);
    let base = base_damage(attacker.level, move_data.power, attack, defense);

    let effectiveness = effectiveness_multiplier(move_data.element, &defender.elements, config);

    let stab = attacker.has_element(move_data.element);
    let stab_multiplier = if stab { config.stab_multiplier } else { 1.0 };

    let critical_chance = (config.critical_chance + attacker.bond.critical_bonus()).min(1.0);
    let critical = rng.probability_check(critical_chance, "critical hit");
    let critical_multiplier = if critical {
        config.critical_multiplier
    } else {
        1.0
    };

    let variance = rng.roll(
        config.variance_min as u32,
        config.variance_max as u32,
        "damage variance",
    ) as f64
        / 100.0;

    let raw = base * effectiveness * stab_multiplier * critical_multiplier * variance;
    let damage = (raw.floor() as u32).max(config.min_damage);

    tracing::debug!(
        attacker = %attacker.name,
        defender = %defender.name,
        base,
        effectiveness,
        stab,
        critical,
        variance,
        damage,
        "damage computed"
    );

    DamageOutcome {
        damage,
        critical,
        effectiveness,
        stab,
    }
}

/// A confused combatant striking itself: typeless physical hit with the
/// configured power against its own defense. No STAB, no critical hit.
pub fn confusion_damage(
    combatant: &Combatant,
    config: &BattleConfig,
    rng: &mut dyn BattleRng,
) -> u32 {
    let attack = effective_attack(combatant, MoveCategory::Physical);
    let defense = effective_defense(combatant, MoveCategory::Physical);
    let base = base_damage(
        combatant.level,
        config.confusion_self_hit_power,
        attack,
        defense,
    );
    let variance = rng.roll(
        config.variance_min as u32,
        config.variance_max as u32,
        "confusion variance",
    ) as f64
        / 100.0;
    ((base * variance).floor() as u32).max(config.min_damage)
}

/// Recoil owed to the user for dealing `damage`. Any recoil rounds up to 1.
pub fn recoil_damage(move_data: &MoveData, damage: u32) -> u32 {
    if move_data.recoil_percent == 0 || damage == 0 {
        return 0;
    }
    (damage * move_data.recoil_percent as u32 / 100).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::{SeededRng, TurnRng};
    use crate::bonding::BondLevel;
    use schema::{BaseStats, ElementType, StatusKind, TargetType};

    const NO_CRIT: u32 = 10_000;
    const CRIT: u32 = 1;
    const MAX_VARIANCE: u32 = 100;
    const MIN_VARIANCE: u32 = 85;

    fn combatant(id: &str, elements: Vec<ElementType>, base: u8, level: u8) -> Combatant {
        Combatant::new(
            id,
            id,
            elements,
            BaseStats::from_array([base; 6]),
            level,
            vec!["strike".to_string()],
        )
    }

    fn strike(element: ElementType, category: MoveCategory, power: u16) -> MoveData {
        MoveData {
            id: "strike".to_string(),
            name: "Strike".to_string(),
            element,
            category,
            power,
            accuracy: 100,
            target: TargetType::Enemy,
            effect: None,
            recoil_percent: 0,
        }
    }

    #[test]
    fn test_base_damage_formula() {
        // (2*50/5 + 2) = 22; 22 * 80 * 120 / (120 * 50) = 35.2; + 2 = 37.2
        assert_eq!(base_damage(50, 80, 120, 120), 37.0);
        // Zero defense is treated as 1.
        assert_eq!(base_damage(1, 10, 5, 0), (2.4f64 * 10.0 * 5.0 / 50.0 + 2.0).floor());
    }

    #[test]
    fn test_compute_damage_neutral_hit() {
        let config = BattleConfig::default();
        let attacker = combatant("a", vec![ElementType::Light], 100, 50);
        let defender = combatant("d", vec![ElementType::Neutral], 100, 50);
        let move_data = strike(ElementType::Neutral, MoveCategory::Physical, 80);

        let mut rng = TurnRng::new_for_test(vec![NO_CRIT, MAX_VARIANCE]);
        let outcome = compute_damage(&attacker, &defender, &move_data, &config, &mut rng);
        assert_eq!(outcome.damage, 37);
        assert!(!outcome.critical);
        assert!(!outcome.stab);
        assert_eq!(outcome.effectiveness, 1.0);
    }

    #[test]
    fn test_compute_damage_applies_every_multiplier() {
        let config = BattleConfig::default();
        let attacker = combatant("a", vec![ElementType::Fire], 100, 50);
        let defender = combatant("d", vec![ElementType::Wind, ElementType::Earth], 100, 50);
        let move_data = strike(ElementType::Fire, MoveCategory::Special, 80);

        let mut rng = TurnRng::new_for_test(vec![CRIT, MAX_VARIANCE]);
        let outcome = compute_damage(&attacker, &defender, &move_data, &config, &mut rng);
        // 37 * 4.0 * 1.5 * 1.5 * 1.0
        assert_eq!(outcome.damage, 333);
        assert!(outcome.critical);
        assert!(outcome.stab);
        assert_eq!(outcome.effectiveness, 4.0);

        let mut rng = TurnRng::new_for_test(vec![NO_CRIT, MIN_VARIANCE]);
        let outcome = compute_damage(&attacker, &defender, &move_data, &config, &mut rng);
        // 37 * 4.0 * 1.5 * 0.85 = 188.7
        assert_eq!(outcome.damage, 188);
    }

    #[test]
    fn test_damage_never_below_minimum() {
        let config = BattleConfig {
            min_damage: 3,
            ..BattleConfig::default()
        };
        let attacker = combatant("a", vec![ElementType::Wind], 1, 1);
        let defender = combatant("d", vec![ElementType::Fire, ElementType::Earth], 255, 100);
        let move_data = strike(ElementType::Wind, MoveCategory::Physical, 1);

        for seed in 0..200 {
            let mut rng = SeededRng::new(seed);
            let outcome = compute_damage(&attacker, &defender, &move_data, &config, &mut rng);
            assert!(outcome.damage >= 3, "seed {} produced {}", seed, outcome.damage);
        }
    }

    #[test]
    fn test_damage_never_below_default_minimum_across_inputs() {
        let config = BattleConfig::default();
        for seed in 0..50u64 {
            let mut rng = SeededRng::new(seed);
            let level = rng.roll(1, 100, "level") as u8;
            let atk_base = rng.roll(1, 255, "attack") as u8;
            let def_base = rng.roll(1, 255, "defense") as u8;
            let power = rng.roll(1, 250, "power") as u16;
            let attacker = combatant("a", vec![ElementType::Earth], atk_base, level);
            let defender = combatant("d", vec![ElementType::Fire, ElementType::Water], def_base, 100);
            let move_data = strike(ElementType::Earth, MoveCategory::Special, power);
            let outcome = compute_damage(&attacker, &defender, &move_data, &config, &mut rng);
            assert!(outcome.damage >= config.min_damage);
        }
    }

    #[test]
    fn test_burn_halves_physical_damage_only() {
        let config = BattleConfig::default();
        let mut attacker = combatant("a", vec![ElementType::Light], 100, 50);
        let defender = combatant("d", vec![ElementType::Neutral], 100, 50);
        crate::battle::conditions::apply_status(&mut attacker, StatusKind::Burn, None);

        let physical = strike(ElementType::Neutral, MoveCategory::Physical, 80);
        let mut rng = TurnRng::new_for_test(vec![NO_CRIT, MAX_VARIANCE]);
        let burned = compute_damage(&attacker, &defender, &physical, &config, &mut rng);
        // 22 * 80 * 60 / 6000 = 17.6 + 2 = 19.6
        assert_eq!(burned.damage, 19);

        let special = strike(ElementType::Neutral, MoveCategory::Special, 80);
        let mut rng = TurnRng::new_for_test(vec![NO_CRIT, MAX_VARIANCE]);
        let unaffected = compute_damage(&attacker, &defender, &special, &config, &mut rng);
        assert_eq!(unaffected.damage, 37);
    }

    #[test]
    fn test_bond_raises_critical_chance() {
        let config = BattleConfig::default();
        let attacker = combatant("a", vec![ElementType::Light], 100, 50).with_bond(BondLevel::KindredSpirit);
        let defender = combatant("d", vec![ElementType::Neutral], 100, 50);
        let move_data = strike(ElementType::Neutral, MoveCategory::Physical, 80);

        // 0.125 + 0.15 = 0.275 -> threshold 2750
        let mut rng = TurnRng::new_for_test(vec![2750, MAX_VARIANCE, 2751, MAX_VARIANCE]);
        assert!(compute_damage(&attacker, &defender, &move_data, &config, &mut rng).critical);
        assert!(!compute_damage(&attacker, &defender, &move_data, &config, &mut rng).critical);
    }

    #[test]
    fn test_status_moves_deal_no_damage_and_draw_nothing() {
        let config = BattleConfig::default();
        let attacker = combatant("a", vec![ElementType::Light], 100, 50);
        let defender = combatant("d", vec![ElementType::Neutral], 100, 50);
        let move_data = strike(ElementType::Neutral, MoveCategory::Status, 0);
        let mut rng = TurnRng::new_for_test(vec![]);
        let outcome = compute_damage(&attacker, &defender, &move_data, &config, &mut rng);
        assert_eq!(outcome.damage, 0);
    }

    #[test]
    fn test_accuracy_check() {
        let mut move_data = strike(ElementType::Neutral, MoveCategory::Physical, 40);
        move_data.accuracy = 70;
        let mut rng = TurnRng::new_for_test(vec![70, 71]);
        assert!(move_hits(&move_data, &mut rng));
        assert!(!move_hits(&move_data, &mut rng));

        move_data.accuracy = 0;
        let mut rng = TurnRng::new_for_test(vec![1]);
        assert!(!move_hits(&move_data, &mut rng));
    }

    #[test]
    fn test_recoil_damage() {
        let mut move_data = strike(ElementType::Neutral, MoveCategory::Physical, 40);
        assert_eq!(recoil_damage(&move_data, 100), 0);
        move_data.recoil_percent = 25;
        assert_eq!(recoil_damage(&move_data, 100), 25);
        assert_eq!(recoil_damage(&move_data, 2), 1);
        assert_eq!(recoil_damage(&move_data, 0), 0);
    }
}
