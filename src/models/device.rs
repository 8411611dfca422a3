use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Sensor,
    Actuator,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Sensor => "sensor",
            DeviceKind::Actuator => "actuator",
        }
    }
}

/// Declared type of a device reading. The catalog capitalises these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[serde(alias = "Number")]
    Number,
    #[serde(alias = "Boolean")]
    Boolean,
    #[serde(alias = "String")]
    String,
}

/// Either a plain on/off capability or a short description of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Capability {
    Flag(bool),
    Described(String),
}

impl From<bool> for Capability {
    fn from(flag: bool) -> Self {
        Capability::Flag(flag)
    }
}

impl From<&str> for Capability {
    fn from(text: &str) -> Self {
        Capability::Described(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInterface {
    pub display: Capability,
    pub app: Capability,
    pub voice: Capability,
}

impl Default for DeviceInterface {
    fn default() -> Self {
        Self {
            display: Capability::Described("numeric".to_string()),
            app: Capability::Flag(true),
            voice: Capability::Flag(false),
        }
    }
}

/// A reading or state. Untagged so it reads straight from model JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl DeviceValue {
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(DeviceValue::Boolean(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(DeviceValue::Number),
            serde_json::Value::String(s) => Some(DeviceValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DeviceValue::Boolean(_) => DataType::Boolean,
            DeviceValue::Number(_) => DataType::Number,
            DeviceValue::Text(_) => DataType::String,
        }
    }
}

impl std::fmt::Display for DeviceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceValue::Boolean(b) => write!(f, "{}", b),
            DeviceValue::Number(n) => write!(f, "{}", n),
            DeviceValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub interface: DeviceInterface,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<DeviceValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
}

impl Device {
    /// Copy of this template bound to `location`. The template is untouched.
    pub fn installed_at(&self, location: &str) -> Device {
        Device {
            location: Some(location.to_string()),
            ..self.clone()
        }
    }

    pub fn accepts(&self, value: &DeviceValue) -> bool {
        value.data_type() == self.data_type
    }

    pub fn is_installed_at(&self, location: &str) -> bool {
        self.location.as_deref() == Some(location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCategory {
    pub category: String,
    pub devices: Vec<Device>,
}

/// Form input for a user-defined device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDeviceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub data_type: DataType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub interface: DeviceInterface,
    #[serde(default)]
    pub features: Vec<String>,
}

pub const CUSTOM_CATEGORY: &str = "Custom Devices";

impl CustomDeviceRequest {
    pub fn into_device(self) -> Device {
        Device {
            name: self.name.trim().to_string(),
            description: self.description,
            kind: self.kind,
            data_type: self.data_type,
            unit: self.unit.filter(|u| !u.trim().is_empty()),
            interface: self.interface,
            features: self
                .features
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            location: None,
            current_value: None,
            category: Some(CUSTOM_CATEGORY.to_string()),
            is_custom: true,
        }
    }
}
