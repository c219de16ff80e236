//! Headless skirmish driver.
//!
//! Loads a scenario and runtime configuration, runs the engagement with
//! every player ship on autopilot, and prints the combat log as it streams.
//!
//! ```bash
//! SKIRMISH_SCENARIO=crates/client/scenarios/ambush.ron cargo run -p combat-client
//! ```

mod config;

use anyhow::{Context, Result};
use combat_core::{HullClass, ShipSpec};
use runtime::{
    CombatRuntime, Event, ExecutionMode, RuntimeConfig, Scenario, ScenarioShip, Topic,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let client = ClientConfig::from_env();

    let mut runtime_config = match &client.config_path {
        Some(path) => RuntimeConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if client.phase_stepped {
        runtime_config = runtime_config.with_mode(ExecutionMode::PhaseStepped);
    }

    let scenario = match &client.scenario_path {
        Some(path) => Scenario::load_from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => default_scenario(),
    };
    tracing::info!(scenario = %scenario.name, ships = scenario.ships.len(), "starting skirmish");

    let runtime = CombatRuntime::from_scenario(runtime_config, &scenario)?;
    let printer = tokio::spawn(print_log(runtime.subscribe(Topic::Log)));

    let outcome = runtime.run(client.max_turns).await?;
    let machine = runtime.shutdown().await?;
    // The worker dropped the event bus, so the printer drains and exits.
    printer.await?;

    match outcome {
        Some(outcome) => println!(
            "== {} after round {} ({}) ==",
            outcome
                .winner
                .map_or_else(|| "No winner".to_string(), |w| format!("{w} wins")),
            outcome.round,
            outcome.reason
        ),
        None => println!("== No result after {} turns ==", client.max_turns),
    }
    for combatant in machine.combatants() {
        println!(
            "{:<16} {:<10} hull {:>3}/{:<3} hits {}/{} damage {}",
            combatant.name,
            combatant.faction.to_string(),
            combatant.ship.current_hull(),
            combatant.ship.combat_stats().max_hull,
            combatant.performance.attacks_hit,
            combatant.performance.attacks_made,
            combatant.performance.damage_dealt,
        );
    }
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn print_log(mut rx: tokio::sync::broadcast::Receiver<Event>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match rx.recv().await {
            Ok(Event::Log(entry)) => {
                println!("[R{:>2} {:<12}] {}", entry.round, entry.phase.to_string(), entry.message)
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "log printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Two frigates, one per side, when no scenario file is given.
fn default_scenario() -> Scenario {
    let ship = |faction: &str, name: &str| ScenarioShip {
        faction: faction.to_string(),
        controller: Default::default(),
        personality: None,
        experience: None,
        seed: None,
        spec: ShipSpec::nominal(name, HullClass::Frigate),
    };
    Scenario::new(
        "frigate duel",
        0x5eed,
        vec![ship("Navy", "Resolute"), ship("Pirates", "Magpie")],
    )
}
