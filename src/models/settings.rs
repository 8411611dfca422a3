use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: String,
    pub ai: AISettings,
    pub simulation: SimulationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            ai: AISettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub interval_secs: u64,
    pub history_limit: usize,
    pub propagate_device_values: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            history_limit: 50,
            propagate_device_values: true,
        }
    }
}
