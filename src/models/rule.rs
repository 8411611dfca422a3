use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Rule {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_active: true,
        }
    }

    pub fn toggled(&self) -> Self {
        Self {
            is_active: !self.is_active,
            ..self.clone()
        }
    }
}

pub fn get_default_rules() -> Vec<Rule> {
    vec![
        Rule::new("Safety Priority", "The system should prioritize safety"),
        Rule::new("Energy Saving", "The system should prioritize energy saving"),
    ]
}
