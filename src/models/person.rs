use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub key_activities: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

impl Person {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            key_activities: vec![],
            goals: vec![],
        }
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.key_activities.push(activity.into());
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goals.push(goal.into());
        self
    }
}
