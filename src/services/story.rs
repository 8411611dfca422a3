use chrono::Local;

use super::inference::ChatClient;
use super::prompts::{story_messages, EnvironmentContext};
use crate::error::{Result, WizardError};
use crate::state::StateStore;

const STORY_EVENT_WINDOW: usize = 10;
const STORY_MAX_TOKENS: u32 = 400;

/// Narrates the current environment from its latest events and keeps the
/// text as the state's latest story.
pub async fn narrate(client: &dyn ChatClient, store: &StateStore) -> Result<String> {
    let snapshot = store.snapshot();
    let env = EnvironmentContext::at(&Local::now());
    let messages = story_messages(&snapshot, &env, snapshot.history.latest(STORY_EVENT_WINDOW));

    let story = client
        .complete(&messages, Some(STORY_MAX_TOKENS))
        .await?
        .trim()
        .to_string();
    if story.is_empty() {
        return Err(WizardError::parse("Empty story from API"));
    }

    log::info!("[Story] Narrated {} chars", story.len());
    store.apply(|s| s.with_story(story.clone()));
    Ok(story)
}
