use serde::Serialize;

use crate::app::App;
use crate::error::Result;
use crate::models::SystemEvent;
use crate::services::simulation::SimulationStatus;
use crate::services::story;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationView {
    pub status: SimulationStatus,
    pub last_error: Option<String>,
    pub cycles_completed: u64,
    pub history_len: usize,
}

/// Starts with a client built from the current settings.
pub fn start_simulation(app: &App) -> Result<SimulationView> {
    app.simulator().start(app.client())?;
    Ok(get_simulation_status(app))
}

pub fn stop_simulation(app: &App) -> SimulationView {
    app.simulator().stop();
    get_simulation_status(app)
}

pub fn get_simulation_status(app: &App) -> SimulationView {
    let simulator = app.simulator();
    SimulationView {
        status: simulator.status(),
        last_error: simulator.last_error(),
        cycles_completed: simulator.cycles_completed(),
        history_len: app.snapshot().history.len(),
    }
}

/// Newest `limit` events (all when `None`), oldest first.
pub fn get_event_history(app: &App, limit: Option<usize>) -> Vec<SystemEvent> {
    let snapshot = app.snapshot();
    let history = &snapshot.history;
    history.latest(limit.unwrap_or(history.len())).to_vec()
}

pub async fn generate_story(app: &App) -> Result<String> {
    let client = app.client();
    story::narrate(client.as_ref(), app.store()).await
}
