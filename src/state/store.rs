use std::sync::{Arc, PoisonError, RwLock};

use super::ScenarioState;
use crate::error::Result;

/// Holds the current snapshot. Mutations swap in a whole new snapshot;
/// readers keep whatever `Arc` they already took.
#[derive(Debug)]
pub struct StateStore {
    current: RwLock<Arc<ScenarioState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(ScenarioState::default())
    }
}

impl StateStore {
    pub fn new(initial: ScenarioState) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<ScenarioState> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the snapshot with `f(current)`. On error the snapshot is kept.
    pub fn update<F>(&self, f: F) -> Result<Arc<ScenarioState>>
    where
        F: FnOnce(&ScenarioState) -> Result<ScenarioState>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(f(&guard)?);
        *guard = next.clone();
        Ok(next)
    }

    pub fn apply<F>(&self, f: F) -> Arc<ScenarioState>
    where
        F: FnOnce(&ScenarioState) -> ScenarioState,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(f(&guard));
        *guard = next.clone();
        next
    }
}
