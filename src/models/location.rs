use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    Residential,
    Office,
    Retail,
    Factory,
    Farm,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Residential => "Residential",
            LocationType::Office => "Office",
            LocationType::Retail => "Retail",
            LocationType::Factory => "Factory",
            LocationType::Farm => "Farm",
        }
    }
}

impl Default for LocationType {
    fn default() -> Self {
        LocationType::Residential
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: LocationType,
    /// Name of the enclosing location. A back-reference only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, kind: LocationType) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
        }
    }

    pub fn within(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}
