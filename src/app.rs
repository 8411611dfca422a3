use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::models::{get_device_catalog, AISettings, DeviceCategory, Settings};
use crate::services::inference::{ChatClient, HttpChatClient};
use crate::services::simulation::Simulator;
use crate::state::{ScenarioState, StateStore};
use crate::utils::config;

pub type ClientFactory = Box<dyn Fn(&AISettings) -> Arc<dyn ChatClient> + Send + Sync>;

/// Owns the state store, the simulator and the settings. Every command takes
/// one of these.
pub struct App {
    store: Arc<StateStore>,
    settings: RwLock<Settings>,
    data_dir: PathBuf,
    simulator: Simulator,
    catalog: Vec<DeviceCategory>,
    client_factory: ClientFactory,
}

impl App {
    pub fn new(data_dir: PathBuf, settings: Settings) -> Self {
        let store = Arc::new(StateStore::new(ScenarioState::with_history_limit(
            settings.simulation.history_limit.max(1),
        )));
        let simulator = Simulator::new(store.clone(), &settings.simulation);
        Self {
            store,
            settings: RwLock::new(settings),
            data_dir,
            simulator,
            catalog: get_device_catalog(),
            client_factory: Box::new(|ai: &AISettings| -> Arc<dyn ChatClient> {
                Arc::new(HttpChatClient::new(ai))
            }),
        }
    }

    /// Reads persisted settings from `data_dir` and fills the API key from the
    /// environment when none is stored.
    pub fn load(data_dir: PathBuf) -> Result<Self> {
        let mut settings = config::read_settings(&data_dir)?;
        config::apply_env_defaults(&mut settings);
        log::info!("[App] Data dir: {}", data_dir.display());
        Ok(Self::new(data_dir, settings))
    }

    pub fn with_client_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&AISettings) -> Arc<dyn ChatClient> + Send + Sync + 'static,
    {
        self.client_factory = Box::new(factory);
        self
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<ScenarioState> {
        self.store.snapshot()
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn catalog(&self) -> &[DeviceCategory] {
        &self.catalog
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace_settings(&self, settings: Settings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// A client for the current AI settings, with the key resolved against
    /// the environment.
    pub fn client(&self) -> Arc<dyn ChatClient> {
        let mut ai = self.settings().ai;
        ai.api_key = config::resolve_api_key(&ai.api_key);
        (self.client_factory)(&ai)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_persisted_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.ai.api_key = "sk-stored".into();
        settings.simulation.history_limit = 10;
        config::write_settings(dir.path(), &settings).unwrap();

        let app = App::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(app.settings().ai.api_key, "sk-stored");
        assert_eq!(app.snapshot().history.limit(), 10);
        assert_eq!(app.catalog().len(), 2);
    }

    #[test]
    fn client_reflects_current_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(dir.path().to_path_buf(), Settings::default());
        let mut settings = app.settings();
        settings.ai.api_key = "sk-new".into();
        app.replace_settings(settings);
        assert!(app.client().is_configured());
    }
}
