//! Observability for the monitor
//!
//! - Structured logging (JSON lines on stderr)
//! - Lock-free counters
//! - A closed set of named events
//!
//! # Usage
//!
//! ```ignore
//! use lostuser::observability::{log_event_with_fields, Event, MonitorMetrics};
//!
//! log_event_with_fields(Event::WatchScheduled, &[("resource", "pvc-1")]);
//!
//! let metrics = MonitorMetrics::new();
//! metrics.increment_watches_scheduled();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, MonitorMetrics};

/// Log a lifecycle event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
