use serde::{Deserialize, Serialize};

use super::SystemEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Coarse bucket for a local hour (0-23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            h if h < 6 => TimeOfDay::Night,
            h if h < 12 => TimeOfDay::Morning,
            h if h < 18 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        TimeOfDay::Morning
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub time_of_day: TimeOfDay,
    /// Minutes of simulated time.
    pub duration: u32,
    #[serde(default)]
    pub events: Vec<SystemEvent>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScenarioRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_duration() -> u32 {
    60
}
