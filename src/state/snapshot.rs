use std::collections::HashMap;

use serde::Serialize;

use super::EventHistory;
use crate::error::{Result, WizardError};
use crate::models::{
    get_default_rules, Device, DeviceValue, Location, Person, Rule, Scenario, SystemEvent,
};

/// Everything the user has declared plus what the simulation produced.
///
/// Every `with_*`/`without_*` method returns a fresh state and leaves `self`
/// alone, so a snapshot handed out by the store never changes underneath its
/// reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioState {
    pub locations: Vec<Location>,
    pub people: Vec<Person>,
    /// Installed devices, i.e. catalog copies bound to a location.
    pub devices: Vec<Device>,
    pub rules: Vec<Rule>,
    pub history: EventHistory,
    pub scenarios: Vec<Scenario>,
    pub latest_story: Option<String>,
}

impl Default for ScenarioState {
    fn default() -> Self {
        Self::with_history_limit(super::HISTORY_LIMIT)
    }
}

impl ScenarioState {
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            locations: vec![],
            people: vec![],
            devices: vec![],
            rules: get_default_rules(),
            history: EventHistory::with_limit(limit),
            scenarios: vec![],
            latest_story: None,
        }
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_active)
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn device_values(&self) -> HashMap<String, DeviceValue> {
        self.devices
            .iter()
            .filter_map(|d| d.current_value.clone().map(|v| (d.name.clone(), v)))
            .collect()
    }

    // ─── Locations & people (add-only) ───

    pub fn with_location(&self, location: Location) -> Result<Self> {
        let name = location.name.trim();
        if name.is_empty() {
            return Err(WizardError::invalid_input("location name is required"));
        }
        if self.location(name).is_some() {
            return Err(WizardError::invalid_input(format!(
                "location '{}' already exists",
                name
            )));
        }
        let parent = location
            .parent
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(parent) = parent {
            if self.location(parent).is_none() {
                return Err(WizardError::invalid_input(format!(
                    "parent location '{}' does not exist",
                    parent
                )));
            }
        }

        let mut next = self.clone();
        next.locations.push(Location {
            name: name.to_string(),
            kind: location.kind,
            parent: parent.map(str::to_string),
        });
        Ok(next)
    }

    pub fn with_person(&self, person: Person) -> Result<Self> {
        let name = person.name.trim();
        if name.is_empty() {
            return Err(WizardError::invalid_input("person name is required"));
        }
        if person.age == 0 {
            return Err(WizardError::invalid_input("age must be a positive number"));
        }

        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let mut next = self.clone();
        next.people.push(Person {
            name: name.to_string(),
            age: person.age,
            key_activities: clean(person.key_activities),
            goals: clean(person.goals),
        });
        Ok(next)
    }

    // ─── Installed devices ───

    pub fn with_device_installed(&self, template: &Device, location: &str) -> Result<Self> {
        if template.name.trim().is_empty() {
            return Err(WizardError::invalid_input("device name is required"));
        }
        if self.location(location).is_none() {
            return Err(WizardError::invalid_input(format!(
                "unknown location '{}'",
                location
            )));
        }
        let mut next = self.clone();
        next.devices.push(template.installed_at(location));
        Ok(next)
    }

    /// Removes every installed device matching both name and location.
    pub fn without_device(&self, name: &str, location: Option<&str>) -> Result<Self> {
        let mut next = self.clone();
        next.devices
            .retain(|d| !(d.name == name && d.location.as_deref() == location));
        if next.devices.len() == self.devices.len() {
            return Err(WizardError::NotFound(format!(
                "device '{}' at '{}'",
                name,
                location.unwrap_or("unspecified")
            )));
        }
        Ok(next)
    }

    /// Full replace of the current-value map, keyed by device name.
    ///
    /// Devices missing from `values` keep their value. Values whose type
    /// disagrees with the device's declared data type are skipped. Returns the
    /// new state and the number of devices whose value was set.
    pub fn with_device_values(&self, values: &HashMap<String, DeviceValue>) -> (Self, usize) {
        let mut next = self.clone();
        let mut updated = 0;
        for device in next.devices.iter_mut() {
            let Some(value) = values.get(&device.name) else {
                continue;
            };
            if device.accepts(value) {
                device.current_value = Some(value.clone());
                updated += 1;
            } else {
                log::warn!(
                    "Skipping value {:?} for '{}': expected {:?}",
                    value,
                    device.name,
                    device.data_type
                );
            }
        }
        (next, updated)
    }

    // ─── Rules ───

    pub fn with_rules(&self, rules: Vec<Rule>) -> Self {
        Self {
            rules,
            ..self.clone()
        }
    }

    pub fn with_rule(&self, rule: Rule) -> Result<Self> {
        let name = rule.name.trim();
        let description = rule.description.trim();
        if name.is_empty() || description.is_empty() {
            return Err(WizardError::invalid_input(
                "rule name and description are required",
            ));
        }
        if self.rules.iter().any(|r| r.name == name) {
            return Err(WizardError::invalid_input(format!(
                "rule '{}' already exists",
                name
            )));
        }
        let mut rules = self.rules.clone();
        rules.push(Rule {
            name: name.to_string(),
            description: description.to_string(),
            is_active: rule.is_active,
        });
        Ok(self.with_rules(rules))
    }

    pub fn with_rule_toggled(&self, name: &str) -> Result<Self> {
        if !self.rules.iter().any(|r| r.name == name) {
            return Err(WizardError::NotFound(format!("rule '{}'", name)));
        }
        let rules = self
            .rules
            .iter()
            .map(|r| if r.name == name { r.toggled() } else { r.clone() })
            .collect();
        Ok(self.with_rules(rules))
    }

    // ─── Simulation output ───

    /// Merges `events` into the rolling history and, when `propagate` is set,
    /// copies event values onto matching installed devices.
    pub fn with_events(&self, events: Vec<SystemEvent>, propagate: bool) -> Self {
        let mut next = self.clone();
        if propagate {
            let mut ordered: Vec<&SystemEvent> = events.iter().collect();
            ordered.sort_by_key(|e| e.timestamp);
            for event in ordered {
                if let Some(value) = &event.value {
                    next.set_value_from_event(event, value);
                }
            }
        }
        next.history = self.history.merged(events);
        next
    }

    fn set_value_from_event(&mut self, event: &SystemEvent, value: &DeviceValue) {
        let located = self
            .devices
            .iter()
            .any(|d| d.name == event.device_name && d.is_installed_at(&event.location));
        for device in self.devices.iter_mut() {
            if device.name != event.device_name {
                continue;
            }
            if located && !device.is_installed_at(&event.location) {
                continue;
            }
            if device.accepts(value) {
                device.current_value = Some(value.clone());
            } else {
                log::warn!(
                    "Event value {:?} does not fit '{}' ({:?})",
                    value,
                    device.name,
                    device.data_type
                );
            }
        }
    }

    pub fn with_scenario(&self, scenario: Scenario) -> Self {
        let mut next = self.clone();
        next.scenarios.push(scenario);
        next
    }

    /// Replaces a scenario's events and makes it the only active one.
    pub fn with_scenario_run(&self, id: &str, events: Vec<SystemEvent>) -> Result<Self> {
        if self.scenario(id).is_none() {
            return Err(WizardError::NotFound(format!("scenario '{}'", id)));
        }
        let mut next = self.clone();
        for scenario in next.scenarios.iter_mut() {
            scenario.is_active = scenario.id == id;
            if scenario.is_active {
                scenario.events = events.clone();
            }
        }
        Ok(next)
    }

    pub fn with_story(&self, story: String) -> Self {
        Self {
            latest_story: Some(story),
            ..self.clone()
        }
    }
}
