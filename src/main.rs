use anyhow::{Context, Result};
use rift_combat::{BattleRunner, GameData, SeededRng, SideController};
use std::env;
use std::path::Path;

const DEFAULT_SEED: u64 = 42;
const MAX_TURNS: usize = 500;

/// Plays an automated exhibition battle between two rosters from `data/`.
///
/// Usage: rift-combat [player_roster] [opponent_roster] [seed]
/// Set `RIFT_JSON` to also print the result summary as JSON.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let player_roster = args.first().map(String::as_str).unwrap_or("embers");
    let opponent_roster = args.get(1).map(String::as_str).unwrap_or("tides");
    let seed = match args.get(2) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("seed must be an unsigned integer, got {raw}"))?,
        None => DEFAULT_SEED,
    };

    let data = GameData::load(Path::new("data")).context("failed to load game data")?;
    let session = data
        .new_session(
            format!("exhibition-{seed}"),
            player_roster,
            opponent_roster,
        )
        .context("failed to build the battle session")?;

    let mut runner =
        BattleRunner::new(session, SideController::Automated, SideController::Automated);
    let mut rng = SeededRng::new(seed);
    let result = runner.run_to_completion(&mut rng, MAX_TURNS)?;

    println!("=== {player_roster} vs {opponent_roster} (seed {seed}) ===");
    for entry in runner.session().log().entries() {
        println!("[round {:>3}] {}", entry.round, entry.message);
    }
    println!();
    println!(
        "Outcome: {:?} after {} rounds ({} actions, {} total damage)",
        result.outcome, result.rounds, result.total_actions, result.total_damage
    );
    for survivor in &result.surviving_roster {
        println!(
            "  {:?} {} ({}/{} HP)",
            survivor.side, survivor.name, survivor.current_hp, survivor.max_hp
        );
    }

    if env::var_os("RIFT_JSON").is_some() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
