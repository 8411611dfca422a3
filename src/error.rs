use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WizardError>;

#[derive(Debug, Error)]
pub enum WizardError {
    /// Missing or unusable configuration, e.g. no API key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-2xx response (`status` set) or transport failure (`status` unset).
    #[error("network error: {}", describe_network(.status, .message))]
    Network { status: Option<u16>, message: String },

    /// Model output or response envelope is not valid JSON.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Form-level input rejected before touching state.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_network(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API error: {} {}", code, message).trim_end().to_string(),
        None => message.to_string(),
    }
}

impl WizardError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Network {
            status: Some(status),
            message: body.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Network {
            status: None,
            message: msg.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Single line suitable for showing next to the simulation controls.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(msg) => msg.clone(),
            Self::Network { status: Some(code), .. } => format!("API error: {}", code),
            Self::Network { status: None, message } => format!("Network failure: {}", message),
            Self::Parse(_) => "Invalid JSON response from API".to_string(),
            Self::Validation(_) => {
                "API returned invalid event data structure. Check logs for details.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// One rejected field inside a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Element position for array payloads.
    pub index: Option<usize>,
    /// Offending field or map key.
    pub field: Option<String>,
    pub reason: String,
}

impl ValidationIssue {
    pub fn root(reason: impl Into<String>) -> Self {
        Self {
            index: None,
            field: None,
            reason: reason.into(),
        }
    }

    pub fn element(index: usize, field: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field: field.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub fn key(field: &str, reason: impl Into<String>) -> Self {
        Self {
            index: None,
            field: Some(field.to_string()),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, &self.field) {
            (Some(i), Some(field)) => write!(f, "[{}].{}: {}", i, field, self.reason),
            (Some(i), None) => write!(f, "[{}]: {}", i, self.reason),
            (None, Some(field)) => write!(f, "{}: {}", field, self.reason),
            (None, None) => write!(f, "{}", self.reason),
        }
    }
}

/// A wholesale rejection; carries every issue found, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{} issue(s): {}", self.issues.len(), joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_status_is_reported_in_user_message() {
        let err = WizardError::status(429, "rate limited");
        assert!(err.is_network());
        assert_eq!(err.user_message(), "API error: 429");
        assert_eq!(err.to_string(), "network error: API error: 429 rate limited");
    }

    #[test]
    fn validation_display_lists_index_and_field() {
        let err = ValidationError {
            issues: vec![
                ValidationIssue::element(2, Some("timestamp"), "invalid timestamp format: soon"),
                ValidationIssue::root("expected array of events, got object"),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 issue(s)"));
        assert!(text.contains("[2].timestamp: invalid timestamp format: soon"));
        assert!(text.contains("expected array of events, got object"));
    }
}
