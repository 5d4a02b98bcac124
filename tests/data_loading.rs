use rift_combat::{
    BattlePhase, BattleRunner, ConfigurationError, GameData, SeededRng, SideController, SideId,
};
use std::path::PathBuf;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

#[test]
fn bundled_data_loads() {
    let data = GameData::load(&data_dir()).expect("bundled data should load");

    assert!(data.moves.contains("flame_rush"));
    assert!(data.rosters.contains_key("embers"));
    assert!(data.rosters.contains_key("tides"));
    assert_eq!(data.config.log_capacity, 128);
    // Settings missing from config.ron keep their defaults.
    assert_eq!(data.config.confusion_self_hit_power, 40);

    let embers = data.roster("embers").unwrap();
    assert_eq!(embers.len(), 2);
    assert!(embers.iter().all(|c| c.current_hp() == c.max_hp()));
}

#[test]
fn unknown_roster_is_a_configuration_error() {
    let data = GameData::load(&data_dir()).unwrap();
    assert_eq!(
        data.new_session("s", "embers", "nobody").unwrap_err(),
        ConfigurationError::UnknownRoster("nobody".to_string())
    );
}

#[test]
fn missing_data_directory_fails_cleanly() {
    let err = GameData::load(&data_dir().join("does-not-exist")).unwrap_err();
    assert!(matches!(err, ConfigurationError::Io { .. }));
}

#[test]
fn exhibition_battle_runs_to_completion() {
    let data = GameData::load(&data_dir()).unwrap();
    let session = data.new_session("exhibition", "embers", "tides").unwrap();
    assert_eq!(session.roster(SideId::Player).len(), 2);

    let mut runner =
        BattleRunner::new(session, SideController::Automated, SideController::Automated);
    let result = runner.run_to_completion(&mut SeededRng::new(42), 500).unwrap();

    assert!(matches!(
        result.outcome,
        BattlePhase::Victory | BattlePhase::Defeat | BattlePhase::Draw | BattlePhase::Aborted
    ));
    assert!(result.total_actions > 0);
    assert!(!runner.session().log().is_empty());
}
