use std::path::PathBuf;

use anyhow::Context;
use iot_wizard::commands::{self, simulation as sim_commands};
use iot_wizard::services::simulation::SimulationUpdate;
use iot_wizard::utils::config;
use iot_wizard::App;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = config::data_dir();
    let app = App::load(data_dir.clone())
        .with_context(|| format!("Failed to load settings from {}", data_dir.display()))?;

    if let Some(setup_path) = std::env::args().nth(1).map(PathBuf::from) {
        let summary = commands::setup::load_setup(&app, &setup_path)
            .with_context(|| format!("Failed to apply setup file {}", setup_path.display()))?;
        log::info!(
            "Loaded {} location(s), {} person(s), {} device(s) from {}",
            summary.locations,
            summary.people,
            summary.devices,
            setup_path.display()
        );
    }

    let mut updates = app.simulator().subscribe();
    sim_commands::start_simulation(&app).context("Failed to start simulation")?;
    log::info!("Simulation running, press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                sim_commands::stop_simulation(&app);
                break;
            }
            update = updates.recv() => match update {
                Ok(SimulationUpdate::CycleCompleted { added, history_len, .. }) => {
                    for event in &added {
                        log::info!("  {}", event.summary());
                    }
                    log::info!("Cycle added {} event(s), history holds {}", added.len(), history_len);
                }
                Ok(SimulationUpdate::Stopped { reason }) => {
                    if let Some(reason) = reason {
                        log::error!("Simulation stopped: {}", reason);
                    }
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} simulation update(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    let history = sim_commands::get_event_history(&app, None);
    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}
