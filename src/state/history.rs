use serde::Serialize;

use crate::models::SystemEvent;

pub const HISTORY_LIMIT: usize = 50;

/// Most recent events, ascending by timestamp, bounded by `limit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventHistory {
    limit: usize,
    events: Vec<SystemEvent>,
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }
}

impl EventHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            events: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn events(&self) -> &[SystemEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Up to `n` newest events, still in ascending order.
    pub fn latest(&self, n: usize) -> &[SystemEvent] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }

    /// New history holding old + incoming, re-sorted, oldest evicted past the limit.
    ///
    /// The sort is stable, so events sharing a timestamp keep insertion order
    /// (existing entries before incoming ones).
    pub fn merged<I>(&self, incoming: I) -> EventHistory
    where
        I: IntoIterator<Item = SystemEvent>,
    {
        let mut events = self.events.clone();
        events.extend(incoming);
        events.sort_by_key(|e| e.timestamp);
        let overflow = events.len().saturating_sub(self.limit);
        events.drain(..overflow);
        EventHistory {
            limit: self.limit,
            events,
        }
    }
}
