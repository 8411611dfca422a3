use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, ValidationError, ValidationIssue, WizardError};
use crate::models::{DeviceValue, SystemEvent};

const REQUIRED_TEXT_FIELDS: [&str; 3] = ["deviceName", "event", "location"];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("fence pattern is valid")
    })
}

/// Drops a surrounding markdown code fence, if the model added one.
pub fn strip_code_fences(content: &str) -> &str {
    match fence_pattern().captures(content).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => content.trim(),
    }
}

pub fn parse_json(content: &str) -> Result<Value> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str(cleaned)
        .map_err(|e| WizardError::parse(format!("Invalid JSON response from API: {}", e)))
}

/// Accepts RFC 3339, RFC 2822, ISO offsets without a colon, naive date-times
/// (read as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let with_offset = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        });
    if let Some(parsed) = with_offset {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text_field<'a>(
    index: usize,
    object: &'a Map<String, Value>,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<&'a str> {
    match object.get(field) {
        None => {
            issues.push(ValidationIssue::element(index, Some(field), "missing required field"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            issues.push(ValidationIssue::element(
                index,
                Some(field),
                format!("invalid type: expected string, got {}", json_type(other)),
            ));
            None
        }
    }
}

fn validate_event(index: usize, candidate: &Value, issues: &mut Vec<ValidationIssue>) -> Option<SystemEvent> {
    let Some(object) = candidate.as_object() else {
        issues.push(ValidationIssue::element(
            index,
            None,
            format!("event is not an object, got {}", json_type(candidate)),
        ));
        return None;
    };

    let before = issues.len();
    let texts: Vec<Option<&str>> = REQUIRED_TEXT_FIELDS
        .iter()
        .map(|field| text_field(index, object, field, issues))
        .collect();

    let timestamp = text_field(index, object, "timestamp", issues).and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            issues.push(ValidationIssue::element(
                index,
                Some("timestamp"),
                format!("invalid timestamp format: {}", raw),
            ));
        }
        parsed
    });

    let value = match object.get("value") {
        None => None,
        Some(raw) => {
            let converted = DeviceValue::from_json(raw);
            if converted.is_none() {
                issues.push(ValidationIssue::element(
                    index,
                    Some("value"),
                    format!(
                        "invalid type: expected number, string or boolean, got {}",
                        json_type(raw)
                    ),
                ));
            }
            converted
        }
    };

    if issues.len() != before {
        return None;
    }
    match (texts.as_slice(), timestamp) {
        ([Some(device_name), Some(event), Some(location)], Some(timestamp)) => Some(SystemEvent {
            timestamp,
            device_name: device_name.to_string(),
            location: location.to_string(),
            event: event.to_string(),
            value,
        }),
        _ => None,
    }
}

/// Strict decode of an event batch. Any bad element rejects the whole batch.
pub fn validate_event_batch(value: &Value) -> std::result::Result<Vec<SystemEvent>, ValidationError> {
    let Some(candidates) = value.as_array() else {
        return Err(ValidationError {
            issues: vec![ValidationIssue::root(format!(
                "expected array of events, got {}",
                json_type(value)
            ))],
        });
    };

    let mut issues = Vec::new();
    let events: Vec<SystemEvent> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| validate_event(index, candidate, &mut issues))
        .collect();

    if issues.is_empty() {
        Ok(events)
    } else {
        Err(ValidationError { issues })
    }
}

/// Strict decode of a `{device name: reading}` object.
pub fn validate_device_states(
    value: &Value,
) -> std::result::Result<HashMap<String, DeviceValue>, ValidationError> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError {
            issues: vec![ValidationIssue::root(format!(
                "expected object of device states, got {}",
                json_type(value)
            ))],
        });
    };

    let mut issues = Vec::new();
    let mut states = HashMap::with_capacity(object.len());
    for (name, raw) in object {
        match DeviceValue::from_json(raw) {
            Some(v) => {
                states.insert(name.clone(), v);
            }
            None => issues.push(ValidationIssue::key(
                name,
                format!(
                    "invalid type: expected number, string or boolean, got {}",
                    json_type(raw)
                ),
            )),
        }
    }

    if issues.is_empty() {
        Ok(states)
    } else {
        Err(ValidationError { issues })
    }
}

fn log_rejection(kind: &str, err: &ValidationError) {
    log::warn!("[Validator] {} rejected with {} issue(s)", kind, err.issues.len());
    for issue in &err.issues {
        log::warn!("[Validator]   {}", issue);
    }
}

pub fn parse_event_batch(content: &str) -> Result<Vec<SystemEvent>> {
    let value = parse_json(content)?;
    validate_event_batch(&value).map_err(|err| {
        log_rejection("event batch", &err);
        WizardError::Validation(err)
    })
}

pub fn parse_device_states(content: &str) -> Result<HashMap<String, DeviceValue>> {
    let value = parse_json(content)?;
    validate_device_states(&value).map_err(|err| {
        log_rejection("device states", &err);
        WizardError::Validation(err)
    })
}
