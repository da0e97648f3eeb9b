//! Monitor Configuration
//!
//! Two debounce delays:
//! - initial: for resources seen for the first time, long enough to absorb
//!   start-up and reconnect noise
//! - existing: for resources whose quorum status is already known
//!
//! Immutable once the monitor is started.

use std::time::Duration;

use super::admission::DelayKind;
use super::errors::{MonitorError, MonitorResult};

/// Default delay for resources without a registry entry
pub const INITIAL_DELAY_DEFAULT: Duration = Duration::from_secs(60);

/// Default delay for resources with a known quorum status
pub const EXISTING_DELAY_DEFAULT: Duration = Duration::from_secs(45);

/// Default capacity of the lost-user channel. Kept minimal so a stalled
/// consumer stalls the notifying watcher instead of piling up names.
pub const OUTPUT_CAPACITY_DEFAULT: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay before re-checking a newly observed resource
    pub initial_delay: Duration,

    /// Delay before re-checking a resource already in the registry
    pub existing_delay: Duration,

    /// Capacity of the lost-user channel
    pub output_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            initial_delay: INITIAL_DELAY_DEFAULT,
            existing_delay: EXISTING_DELAY_DEFAULT,
            output_capacity: OUTPUT_CAPACITY_DEFAULT,
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial and the existing-resource delay
    pub fn with_delay(mut self, initial: Duration, existing: Duration) -> Self {
        self.initial_delay = initial;
        self.existing_delay = existing;
        self
    }

    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Delay for an admission of the given kind
    pub fn delay_for(&self, kind: DelayKind) -> Duration {
        match kind {
            DelayKind::Initial => self.initial_delay,
            DelayKind::Existing => self.existing_delay,
        }
    }

    /// Validate the configuration.
    ///
    /// Zero delays would turn every blip into a notification; a zero
    /// capacity channel cannot be built.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.initial_delay.is_zero() {
            return Err(MonitorError::config("initial_delay must be > 0"));
        }
        if self.existing_delay.is_zero() {
            return Err(MonitorError::config("existing_delay must be > 0"));
        }
        if self.output_capacity == 0 {
            return Err(MonitorError::config("output_capacity must be > 0"));
        }
        Ok(())
    }
}
