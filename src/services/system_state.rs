use super::inference::ChatClient;
use super::prompts::device_state_messages;
use super::validator::parse_device_states;
use crate::error::Result;
use crate::state::StateStore;

const STATE_MAX_TOKENS: u32 = 500;

/// Asks the model for a plausible value per installed device and stores the
/// ones that fit. Returns how many devices changed.
pub async fn generate_system_state(client: &dyn ChatClient, store: &StateStore) -> Result<usize> {
    let snapshot = store.snapshot();
    if snapshot.devices.is_empty() {
        log::info!("[SystemState] No devices installed, nothing to generate");
        return Ok(0);
    }

    let messages = device_state_messages(&snapshot)?;
    let content = client.complete(&messages, Some(STATE_MAX_TOKENS)).await?;
    let values = parse_device_states(&content)?;

    let mut applied = 0;
    store.apply(|s| {
        let (next, count) = s.with_device_values(&values);
        applied = count;
        next
    });
    log::info!(
        "[SystemState] Applied {} of {} generated value(s)",
        applied,
        values.len()
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WizardError;
    use crate::models::{find_template, get_device_catalog, DeviceValue, Location, LocationType};
    use crate::services::inference::ChatMessage;
    use crate::state::ScenarioState;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedClient {
        content: String,
        seen_max_tokens: Mutex<Option<Option<u32>>>,
    }

    impl FixedClient {
        fn new(content: &str) -> Self {
            Self {
                content: content.to_string(),
                seen_max_tokens: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatClient for FixedClient {
        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(&self, _messages: &[ChatMessage], max_tokens: Option<u32>) -> Result<String> {
            *self.seen_max_tokens.lock().unwrap() = Some(max_tokens);
            Ok(self.content.clone())
        }
    }

    fn store_with_devices() -> StateStore {
        let catalog = get_device_catalog();
        let state = ScenarioState::default()
            .with_location(Location::new("Office", LocationType::Office))
            .unwrap()
            .with_device_installed(find_template(&catalog, "Temperature Sensor").unwrap(), "Office")
            .unwrap()
            .with_device_installed(find_template(&catalog, "Smart Plug").unwrap(), "Office")
            .unwrap();
        StateStore::new(state)
    }

    #[tokio::test]
    async fn applies_matching_values_only() {
        let store = store_with_devices();
        let client = FixedClient::new(
            r#"{"Temperature Sensor": 21.5, "Smart Plug": "yes", "Unknown": 3}"#,
        );

        let applied = generate_system_state(&client, &store).await.unwrap();
        assert_eq!(applied, 1);
        assert_eq!(*client.seen_max_tokens.lock().unwrap(), Some(Some(500)));

        let values = store.snapshot().device_values();
        assert_eq!(values.get("Temperature Sensor"), Some(&DeviceValue::Number(21.5)));
        assert!(values.get("Smart Plug").is_none());
    }

    #[tokio::test]
    async fn non_object_response_leaves_state_untouched() {
        let store = store_with_devices();
        let before = store.snapshot();
        let client = FixedClient::new("[1, 2]");

        let err = generate_system_state(&client, &store).await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(*store.snapshot(), *before);
    }

    #[tokio::test]
    async fn no_devices_skips_the_request() {
        let store = StateStore::default();
        let client = FixedClient::new("{}");
        assert_eq!(generate_system_state(&client, &store).await.unwrap(), 0);
        assert!(client.seen_max_tokens.lock().unwrap().is_none());
    }
}
