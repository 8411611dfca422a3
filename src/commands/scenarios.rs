use crate::app::App;
use crate::error::Result;
use crate::models::{CreateScenarioRequest, Scenario, SystemEvent};
use crate::services::scenarios;

pub fn get_scenarios(app: &App) -> Vec<Scenario> {
    app.snapshot().scenarios.clone()
}

pub async fn create_scenario(app: &App, request: CreateScenarioRequest) -> Result<Scenario> {
    let client = app.client();
    scenarios::create_scenario(client.as_ref(), app.store(), request).await
}

pub async fn run_scenario(app: &App, id: &str) -> Result<Vec<SystemEvent>> {
    let client = app.client();
    scenarios::run_scenario(client.as_ref(), app.store(), id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{app_in, CannedClient};
    use crate::models::TimeOfDay;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_then_run() {
        let dir = tempfile::tempdir().unwrap();
        let reply = r#"[{"deviceName":"Smart Thermostat","event":"Pre-heat","location":"Office","timestamp":"2024-11-04T06:30:00Z","value":21}]"#;
        let app = app_in(dir.path(), Arc::new(CannedClient::new(&[reply])));

        let scenario = create_scenario(
            &app,
            CreateScenarioRequest {
                name: "Cold start".into(),
                description: "Office warms up before staff arrive".into(),
                time_of_day: TimeOfDay::Morning,
                duration: 30,
            },
        )
        .await
        .unwrap();
        assert_eq!(get_scenarios(&app).len(), 1);

        let events = run_scenario(&app, &scenario.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(get_scenarios(&app)[0].is_active);
    }
}
