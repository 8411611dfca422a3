use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DeviceValue;

/// A simulated occurrence reported by the inference step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEvent {
    pub timestamp: DateTime<Utc>,
    /// Expected to name an installed device; not enforced.
    pub device_name: String,
    pub location: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DeviceValue>,
}

impl SystemEvent {
    pub fn summary(&self) -> String {
        match &self.value {
            Some(value) => format!(
                "{} {} @ {}: {} (value: {})",
                self.timestamp.to_rfc3339(),
                self.device_name,
                self.location,
                self.event,
                value
            ),
            None => format!(
                "{} {} @ {}: {}",
                self.timestamp.to_rfc3339(),
                self.device_name,
                self.location,
                self.event
            ),
        }
    }
}
