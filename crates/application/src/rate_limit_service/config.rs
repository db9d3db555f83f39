use std::collections::HashMap;

/// Limit applied to events that were never registered.
pub const DEFAULT_EVENT_LIMIT: u32 = 25;

/// Registry of named rate limit events and their per-window thresholds.
///
/// Built once at boot from configuration and shared behind an `Arc`; lookups
/// never fail, falling back to [`DEFAULT_EVENT_LIMIT`] for unknown events.
#[derive(Debug, Clone, Default)]
pub struct RateLimitEvents {
    limits: HashMap<String, u32>,
}

impl RateLimitEvents {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overwrites) the limit for a named event. Returns the
    /// registered limit.
    pub fn register_event(&mut self, name: impl Into<String>, limit: u32) -> u32 {
        let name = name.into();
        self.limits.insert(name, limit);
        limit
    }

    /// Registers every `(name, limit)` pair from the mapping.
    pub fn register_events<I, N>(&mut self, events: I)
    where
        I: IntoIterator<Item = (N, u32)>,
        N: Into<String>,
    {
        for (name, limit) in events {
            self.register_event(name, limit);
        }
    }

    /// Returns the limit for an event, or [`DEFAULT_EVENT_LIMIT`] if the
    /// event was never registered.
    #[must_use]
    pub fn event_limit(&self, name: &str) -> u32 {
        self.limits.get(name).copied().unwrap_or(DEFAULT_EVENT_LIMIT)
    }

    /// Iterates over the registered events, for the boot log banner.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.limits.iter().map(|(name, limit)| (name.as_str(), *limit))
    }
}
