mod history;
mod snapshot;
mod store;

pub use history::{EventHistory, HISTORY_LIMIT};
pub use snapshot::ScenarioState;
pub use store::StateStore;
