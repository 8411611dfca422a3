use chrono::Local;

use super::inference::ChatClient;
use super::prompts::{scenario_messages, EnvironmentContext};
use super::validator::parse_event_batch;
use crate::error::{Result, WizardError};
use crate::models::{CreateScenarioRequest, Scenario, SystemEvent};
use crate::state::{ScenarioState, StateStore};

fn check_request(request: &CreateScenarioRequest) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(WizardError::invalid_input("Scenario name is required"));
    }
    if request.description.trim().is_empty() {
        return Err(WizardError::invalid_input("Scenario description is required"));
    }
    if request.duration == 0 {
        return Err(WizardError::invalid_input("Scenario duration must be at least one minute"));
    }
    Ok(())
}

async fn scenario_events(
    client: &dyn ChatClient,
    request: &CreateScenarioRequest,
    state: &ScenarioState,
) -> Result<Vec<SystemEvent>> {
    let env = EnvironmentContext::at(&Local::now());
    let messages = scenario_messages(
        request.name.trim(),
        request.description.trim(),
        request.time_of_day,
        request.duration,
        state,
        &env,
    )?;
    let content = client.complete(&messages, None).await?;
    parse_event_batch(&content)
}

/// Generates the events for a new scenario and stores it, inactive.
pub async fn create_scenario(
    client: &dyn ChatClient,
    store: &StateStore,
    request: CreateScenarioRequest,
) -> Result<Scenario> {
    check_request(&request)?;
    let snapshot = store.snapshot();
    let events = scenario_events(client, &request, &snapshot).await?;

    let scenario = Scenario {
        id: uuid::Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        description: request.description.trim().to_string(),
        time_of_day: request.time_of_day,
        duration: request.duration,
        events,
        is_active: false,
    };
    log::info!(
        "[Scenarios] Created '{}' ({}) with {} event(s)",
        scenario.name,
        scenario.id,
        scenario.events.len()
    );
    store.apply(|s| s.with_scenario(scenario.clone()));
    Ok(scenario)
}

/// Regenerates a stored scenario's events against the current state and
/// makes it the active one. Returns the new events.
pub async fn run_scenario(client: &dyn ChatClient, store: &StateStore, id: &str) -> Result<Vec<SystemEvent>> {
    let snapshot = store.snapshot();
    let scenario = snapshot
        .scenario(id)
        .ok_or_else(|| WizardError::NotFound(format!("scenario '{}'", id)))?;
    let request = CreateScenarioRequest {
        name: scenario.name.clone(),
        description: scenario.description.clone(),
        time_of_day: scenario.time_of_day,
        duration: scenario.duration,
    };

    let events = scenario_events(client, &request, &snapshot).await?;
    log::info!("[Scenarios] Running '{}' with {} event(s)", request.name, events.len());
    store.update(|s| s.with_scenario_run(id, events.clone()))?;
    Ok(events)
}
