use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::Serialize;

use super::inference::ChatMessage;
use crate::error::Result;
use crate::models::{Device, Location, Person, Rule, SystemEvent, TimeOfDay};
use crate::state::ScenarioState;

// ─── Constants ───

const EVENT_SYSTEM_PROMPT: &str = r#"You are an IoT event simulator. Generate a JSON array of events with this exact structure:
[
  {
    "deviceName": "string",
    "event": "string",
    "location": "string",
    "timestamp": "ISO date string",
    "value": "number, string or boolean (optional)"
  }
]
Consider:
- Device capabilities and locations
- User activities and schedules
- System rules and priorities
- Season and time-appropriate behaviors
Only use device names and locations from the user's list.
Respond with the JSON array only. Do NOT wrap it in markdown code blocks."#;

const STATE_SYSTEM_PROMPT: &str = r#"You are an IoT system assistant that generates realistic sensor data and device states.
Your response should be a valid JSON object where keys are device names and values are appropriate readings.
For boolean devices, use true/false. For numeric devices, use numbers. For text devices, use strings."#;

const SCENARIO_SYSTEM_PROMPT: &str = r#"Generate a sequence of IoT events for a specific scenario. Events should be realistic and follow system rules.
Respond with a JSON array only, each element shaped as {"deviceName", "event", "location", "timestamp", "value"?}."#;

const STORY_SYSTEM_PROMPT: &str = r#"You are the narrator of a smart-environment simulation.
Write a short, plain-text story (one or two paragraphs, no markdown) describing what the occupants are doing and how the devices respond.
Stay consistent with the listed events, people, rules and environment."#;

const NONE: &str = "none";

// ─── Environment ───

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Zero-based month: Jan-Feb and Oct-Dec are winter.
    pub fn from_month0(month0: u32) -> Self {
        match month0 {
            2 | 3 => Season::Spring,
            4 | 5 => Season::Summer,
            6..=8 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

/// Calendar context derived from a local time anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentContext {
    pub season: Season,
    pub is_daytime: bool,
    pub time_of_day: TimeOfDay,
    pub anchor: DateTime<Utc>,
}

impl EnvironmentContext {
    /// Month and hour are read in `now`'s own timezone.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let hour = now.hour();
        Self {
            season: Season::from_month0(now.month0()),
            is_daytime: (6..18).contains(&hour),
            time_of_day: TimeOfDay::from_hour(hour),
            anchor: now.with_timezone(&Utc),
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "Season: {}, Daylight: {}, Time of day: {}",
            self.season.as_str(),
            if self.is_daytime { "day" } else { "night" },
            self.time_of_day.as_str()
        )
    }
}

// ─── Enumerations ───

fn join_or_none(items: Vec<String>) -> String {
    if items.is_empty() {
        NONE.to_string()
    } else {
        items.join(", ")
    }
}

pub fn describe_locations(locations: &[Location]) -> String {
    join_or_none(
        locations
            .iter()
            .map(|l| match &l.parent {
                Some(parent) => format!("{} ({}, in {})", l.name, l.kind, parent),
                None => format!("{} ({})", l.name, l.kind),
            })
            .collect(),
    )
}

pub fn describe_devices(devices: &[Device]) -> String {
    join_or_none(
        devices
            .iter()
            .map(|d| {
                format!(
                    "{} in {} ({})",
                    d.name,
                    d.location.as_deref().unwrap_or("unspecified"),
                    d.kind.as_str()
                )
            })
            .collect(),
    )
}

pub fn describe_people(people: &[Person]) -> String {
    join_or_none(
        people
            .iter()
            .map(|p| {
                let mut line = format!("{}: {}", p.name, p.key_activities.join(", "));
                if !p.goals.is_empty() {
                    line.push_str(&format!(" (goals: {})", p.goals.join(", ")));
                }
                line
            })
            .collect(),
    )
}

/// Descriptions of active rules only.
pub fn describe_active_rules(rules: &[Rule]) -> String {
    join_or_none(
        rules
            .iter()
            .filter(|r| r.is_active)
            .map(|r| r.description.clone())
            .collect(),
    )
}

// ─── Message sets ───

pub fn event_generation_messages(state: &ScenarioState, env: &EnvironmentContext) -> Vec<ChatMessage> {
    let user = format!(
        "Generate next hour's events for:\n\
         Locations: {}\n\n\
         Devices: {}\n\n\
         People: {}\n\n\
         Rules: {}\n\n\
         Environment: {}\n\n\
         Start time: {}",
        describe_locations(&state.locations),
        describe_devices(&state.devices),
        describe_people(&state.people),
        describe_active_rules(&state.rules),
        env.describe(),
        env.anchor.to_rfc3339()
    );
    vec![ChatMessage::system(EVENT_SYSTEM_PROMPT), ChatMessage::user(user)]
}

pub fn device_state_messages(state: &ScenarioState) -> Result<Vec<ChatMessage>> {
    let active: Vec<&Rule> = state.active_rules().collect();
    let user = format!(
        "Generate appropriate sensor values and states for these devices: {}\n\
         Consider the following context:\n\
         Locations: {}\n\
         People: {}\n\
         Active Rules: {}\n\n\
         Respond with a JSON object only, no additional text.\n\
         Example format: {{\"Device1\": 23.5, \"Device2\": true, \"Device3\": \"active\"}}",
        serde_json::to_string(&state.devices)?,
        serde_json::to_string(&state.locations)?,
        serde_json::to_string(&state.people)?,
        serde_json::to_string(&active)?
    );
    Ok(vec![ChatMessage::system(STATE_SYSTEM_PROMPT), ChatMessage::user(user)])
}

pub fn scenario_messages(
    name: &str,
    description: &str,
    time_of_day: TimeOfDay,
    duration_minutes: u32,
    state: &ScenarioState,
    env: &EnvironmentContext,
) -> Result<Vec<ChatMessage>> {
    let active: Vec<&Rule> = state.active_rules().collect();
    let user = format!(
        "Generate events for scenario: {}\n\
         Description: {}\n\
         Time of Day: {}\n\
         Duration: {} minutes\n\
         Locations: {}\n\
         Devices: {}\n\
         People: {}\n\
         Rules: {}\n\
         Season: {}\n\
         Current Time: {}",
        name,
        description,
        time_of_day.as_str(),
        duration_minutes,
        describe_locations(&state.locations),
        serde_json::to_string(&state.devices)?,
        serde_json::to_string(&state.people)?,
        serde_json::to_string(&active)?,
        env.season.as_str(),
        env.anchor.to_rfc3339()
    );
    Ok(vec![ChatMessage::system(SCENARIO_SYSTEM_PROMPT), ChatMessage::user(user)])
}

pub fn story_messages(
    state: &ScenarioState,
    env: &EnvironmentContext,
    recent: &[SystemEvent],
) -> Vec<ChatMessage> {
    let events = if recent.is_empty() {
        NONE.to_string()
    } else {
        recent
            .iter()
            .map(SystemEvent::summary)
            .collect::<Vec<_>>()
            .join("\n")
    };
    let user = format!(
        "Tell the story of this environment right now.\n\
         Environment: {}\n\
         Locations: {}\n\
         Devices: {}\n\
         People: {}\n\
         Rules: {}\n\
         Recent events:\n{}\n\
         Current Time: {}",
        env.describe(),
        describe_locations(&state.locations),
        describe_devices(&state.devices),
        describe_people(&state.people),
        describe_active_rules(&state.rules),
        events,
        env.anchor.to_rfc3339()
    );
    vec![ChatMessage::system(STORY_SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{find_template, get_device_catalog, LocationType};
    use chrono::FixedOffset;

    fn local(month: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, month, 10, hour, 15, 0)
            .unwrap()
    }

    fn sample_state() -> ScenarioState {
        let catalog = get_device_catalog();
        ScenarioState::default()
            .with_location(Location::new("Home", LocationType::Residential))
            .unwrap()
            .with_location(Location::new("Kitchen", LocationType::Residential).within("Home"))
            .unwrap()
            .with_device_installed(find_template(&catalog, "Smart Plug").unwrap(), "Kitchen")
            .unwrap()
            .with_person(Person::new("Ada", 36).with_activity("cooking").with_goal("eat well"))
            .unwrap()
            .with_rule(Rule {
                name: "Night Mode".into(),
                description: "Dim all lights after midnight".into(),
                is_active: false,
            })
            .unwrap()
    }

    #[test]
    fn season_mapping_covers_every_month() {
        let seasons: Vec<_> = (0..12).map(Season::from_month0).collect();
        use Season::*;
        assert_eq!(
            seasons,
            vec![
                Winter, Winter, Spring, Spring, Summer, Summer, Autumn, Autumn, Autumn, Winter,
                Winter, Winter
            ]
        );
    }

    #[test]
    fn environment_uses_local_hour() {
        // 05:15 local is 03:15 UTC; both are night.
        let early = EnvironmentContext::at(&local(1, 5));
        assert_eq!(early.season, Season::Winter);
        assert!(!early.is_daytime);
        assert_eq!(early.time_of_day, TimeOfDay::Night);

        let noon = EnvironmentContext::at(&local(7, 12));
        assert_eq!(noon.season, Season::Autumn);
        assert!(noon.is_daytime);
        assert_eq!(noon.time_of_day, TimeOfDay::Afternoon);
        assert_eq!(noon.anchor.hour(), 10);

        let late = EnvironmentContext::at(&local(5, 20));
        assert!(!late.is_daytime);
        assert_eq!(late.time_of_day, TimeOfDay::Evening);
    }

    #[test]
    fn enumerations_are_stable() {
        let state = sample_state();
        assert_eq!(
            describe_locations(&state.locations),
            "Home (Residential), Kitchen (Residential, in Home)"
        );
        assert_eq!(describe_devices(&state.devices), "Smart Plug in Kitchen (actuator)");
        assert_eq!(describe_people(&state.people), "Ada: cooking (goals: eat well)");
        assert_eq!(describe_locations(&[]), "none");
    }

    #[test]
    fn event_prompt_contains_only_active_rules() {
        let state = sample_state();
        let env = EnvironmentContext::at(&local(3, 9));
        let messages = event_generation_messages(&state, &env);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");

        let user = &messages[1].content;
        for rule in state.rules.iter() {
            assert_eq!(user.contains(&rule.description), rule.is_active, "{}", rule.name);
        }
        assert!(user.contains("Season: spring"));
        assert!(user.contains("Start time: 2024-03-10T07:15:00+00:00"));
    }

    #[test]
    fn state_prompt_serializes_active_rules_only() {
        let state = sample_state();
        let messages = device_state_messages(&state).unwrap();
        let user = &messages[1].content;
        assert!(user.contains("\"Smart Plug\""));
        assert!(user.contains("The system should prioritize safety"));
        assert!(!user.contains("Dim all lights after midnight"));
    }

    #[test]
    fn story_prompt_lists_recent_events() {
        let state = sample_state();
        let env = EnvironmentContext::at(&local(10, 22));
        let event = SystemEvent {
            timestamp: env.anchor,
            device_name: "Smart Plug".into(),
            location: "Kitchen".into(),
            event: "Kettle switched on".into(),
            value: None,
        };
        let messages = story_messages(&state, &env, &[event]);
        assert!(messages[1].content.contains("Kettle switched on"));
        assert!(messages[1].content.contains("Season: winter"));
    }
}
