use crate::battle::engine::BattleSession;
use crate::battle::state::TurnRng;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::move_data::{MoveCatalog, MoveData, MoveEffect};
use schema::{BaseStats, ElementType, MoveCategory, StatKind, StatusKind, TargetType};

/// Scripted rolls. Accuracy and status-chance checks roll 1..=100, critical
/// checks roll 1..=10000, variance rolls 85..=100.
pub const HIT: u32 = 1;
pub const MISS: u32 = 100;
pub const NO_CRIT: u32 = 10_000;
pub const MAX_VARIANCE: u32 = 100;

/// Damage of `strike` between two default test combatants at max variance.
pub const STRIKE_DAMAGE: u16 = 37;

/// A builder for creating test combatants with common defaults: Light type,
/// level 50, every base stat 100 (170 HP, 120 in every other stat).
///
/// # Example
/// ```ignore
/// let slowpoke = TestCombatantBuilder::new("slowpoke")
///     .with_speed(50)
///     .with_moves(&["strike"])
///     .build();
/// ```
pub struct TestCombatantBuilder {
    id: String,
    elements: Vec<ElementType>,
    level: u8,
    base_speed: u8,
    moves: Vec<String>,
}

impl TestCombatantBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            elements: vec![ElementType::Light],
            level: 50,
            base_speed: 100,
            moves: vec!["strike".to_string()],
        }
    }

    pub fn with_elements(mut self, elements: Vec<ElementType>) -> Self {
        self.elements = elements;
        self
    }

    /// Base speed 100 gives 120 speed at level 50, base 50 gives 70.
    pub fn with_speed(mut self, base_speed: u8) -> Self {
        self.base_speed = base_speed;
        self
    }

    pub fn with_moves(mut self, moves: &[&str]) -> Self {
        self.moves = moves.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn build(self) -> Combatant {
        let base = BaseStats {
            hp: 100,
            attack: 100,
            defense: 100,
            sp_attack: 100,
            sp_defense: 100,
            speed: self.base_speed,
        };
        let name = capitalize(&self.id);
        Combatant::new(self.id, name, self.elements, base, self.level, self.moves)
    }
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn attack(id: &str, element: ElementType, category: MoveCategory, power: u16) -> MoveData {
    MoveData {
        id: id.to_string(),
        name: capitalize(id),
        element,
        category,
        power,
        accuracy: 100,
        target: TargetType::Enemy,
        effect: None,
        recoil_percent: 0,
    }
}

fn status_move(id: &str, target: TargetType, status: StatusKind) -> MoveData {
    MoveData {
        id: id.to_string(),
        name: capitalize(id),
        element: ElementType::Neutral,
        category: MoveCategory::Status,
        power: 0,
        accuracy: 100,
        target,
        effect: Some(MoveEffect {
            status,
            chance: 100,
            duration: None,
        }),
        recoil_percent: 0,
    }
}

pub fn test_catalog() -> MoveCatalog {
    let mut recoil = attack("recoil_strike", ElementType::Neutral, MoveCategory::Physical, 80);
    recoil.recoil_percent = 50;

    let mut wild_swing = attack("wild_swing", ElementType::Neutral, MoveCategory::Physical, 80);
    wild_swing.accuracy = 50;

    let mut blast = attack("blast", ElementType::Fire, MoveCategory::Special, 80);
    blast.target = TargetType::AllEnemies;

    MoveCatalog::from_moves(vec![
        attack("strike", ElementType::Neutral, MoveCategory::Physical, 80),
        recoil,
        wild_swing,
        blast,
        status_move("poison_powder", TargetType::Enemy, StatusKind::Poison),
        status_move("thunder_wave", TargetType::Enemy, StatusKind::Paralysis),
        status_move("sleep_song", TargetType::Enemy, StatusKind::Sleep),
        status_move("confuse_ray", TargetType::Enemy, StatusKind::Confusion),
        status_move("guard", TargetType::User, StatusKind::Protect),
        status_move(
            "quicken",
            TargetType::User,
            StatusKind::StatModifier {
                stat: StatKind::Speed,
                stages: 2,
            },
        ),
        status_move(
            "rally",
            TargetType::AllAllies,
            StatusKind::StatModifier {
                stat: StatKind::Attack,
                stages: 1,
            },
        ),
        status_move("mend_ally", TargetType::Ally, StatusKind::Protect),
    ])
    .expect("test catalog should be valid")
}

/// A session in `Setup` with both rosters registered.
pub fn setup_session(player: Vec<Combatant>, opponent: Vec<Combatant>) -> BattleSession {
    BattleSession::with_rosters(
        "test-session",
        player,
        opponent,
        &test_catalog(),
        BattleConfig::default(),
    )
    .expect("test rosters should be valid")
}

/// A started session.
pub fn active_session(player: Vec<Combatant>, opponent: Vec<Combatant>) -> BattleSession {
    let mut session = setup_session(player, opponent);
    session.start().expect("session should start");
    session
}

/// The standard 1v1 in `Setup`: a fast `hero` against a slower `foe`.
pub fn duel_setup() -> BattleSession {
    setup_session(
        vec![TestCombatantBuilder::new("hero")
            .with_moves(&["strike", "recoil_strike", "guard", "poison_powder"])
            .build()],
        vec![TestCombatantBuilder::new("foe")
            .with_speed(50)
            .with_moves(&["strike", "guard", "thunder_wave", "confuse_ray"])
            .build()],
    )
}

/// The standard 1v1, started. `hero` acts first.
pub fn duel() -> BattleSession {
    let mut session = duel_setup();
    session.start().expect("session should start");
    session
}

/// Leave the named combatant with exactly `hp` HP.
pub fn set_hp(session: &mut BattleSession, combatant_id: &str, hp: u16) {
    let combatant = session.combatant_mut(combatant_id);
    let excess = combatant.current_hp().saturating_sub(hp);
    combatant.take_damage(excess as u32);
}

pub fn hp(session: &BattleSession, combatant_id: &str) -> u16 {
    let slot = session.find(combatant_id).expect("combatant should exist");
    session.combatant(slot).unwrap().current_hp()
}

pub fn rng(outcomes: &[u32]) -> TurnRng {
    TurnRng::new_for_test(outcomes.to_vec())
}

/// Rolls for an undisputed `strike`: hit, no crit, max variance.
pub fn strike_rolls() -> Vec<u32> {
    vec![HIT, NO_CRIT, MAX_VARIANCE]
}
