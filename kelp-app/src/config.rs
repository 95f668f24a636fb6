//! Application configuration

use std::time::Duration;

/// App configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Wall-clock budget for a full item-save flow. The write is not
    /// aborted remotely on expiry - it may still land and will be
    /// reflected by the next snapshot.
    pub save_timeout: Duration,

    /// Capacity of the app event broadcast channel
    pub event_capacity: usize,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            save_timeout: Duration::from_secs(10),
            event_capacity: 64,
        }
    }

    /// Set the save timeout
    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = timeout;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
