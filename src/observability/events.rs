//! Observable monitor events
//!
//! Every log line the monitor emits is named by one of these.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Monitor subscribed and running
    MonitorStart,
    /// Stop requested
    MonitorStopRequested,
    /// Ingestion loop and all watchers finished
    MonitorStopped,
    /// Backend closed the event stream
    EventStreamEnded,

    // Configuration
    ConfigLoaded,

    // Event stream
    /// An event line could not be decoded
    EventDecodeFailed,
    /// Reading the event stream failed
    EventStreamFailed,

    // Admission
    /// First sighting of a resource, quorum status recorded
    ResourceObserved,
    /// Quorum status could not be fetched, resource not recorded
    QuorumQueryFailed,
    /// A watcher was scheduled
    WatchScheduled,
    /// Watcher already pending, signal coalesced
    WatchCoalesced,

    // Watcher
    /// Resource still promotable after the delay
    ResourceUserLost,
    /// Resource no longer promotable after the delay
    ResourceSettled,
    /// Resource deleted or reconfigured, registry entry dropped
    ResourceRemoved,
    /// Watcher aborted by shutdown
    WatchCancelled,
    /// Watcher task panicked
    WatcherFailed,
    /// Re-check failed, monitor shuts down (FATAL)
    BackendFailure,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::MonitorStart => "MONITOR_START",
            Event::MonitorStopRequested => "MONITOR_STOP_REQUESTED",
            Event::MonitorStopped => "MONITOR_STOPPED",
            Event::EventStreamEnded => "EVENT_STREAM_ENDED",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::EventDecodeFailed => "EVENT_DECODE_FAILED",
            Event::EventStreamFailed => "EVENT_STREAM_FAILED",

            Event::ResourceObserved => "RESOURCE_OBSERVED",
            Event::QuorumQueryFailed => "QUORUM_QUERY_FAILED",
            Event::WatchScheduled => "WATCH_SCHEDULED",
            Event::WatchCoalesced => "WATCH_COALESCED",

            Event::ResourceUserLost => "RESOURCE_USER_LOST",
            Event::ResourceSettled => "RESOURCE_SETTLED",
            Event::ResourceRemoved => "RESOURCE_REMOVED",
            Event::WatchCancelled => "WATCH_CANCELLED",
            Event::WatcherFailed => "WATCHER_FAILED",
            Event::BackendFailure => "BACKEND_FAILURE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::WatchCoalesced | Event::WatchCancelled | Event::ResourceSettled => {
                Severity::Trace
            }
            Event::EventDecodeFailed | Event::QuorumQueryFailed => Severity::Warn,
            Event::EventStreamFailed | Event::WatcherFailed => Severity::Error,
            Event::BackendFailure => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::BackendFailure)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::MonitorStart,
            Event::MonitorStopRequested,
            Event::MonitorStopped,
            Event::EventStreamEnded,
            Event::ConfigLoaded,
            Event::EventDecodeFailed,
            Event::EventStreamFailed,
            Event::ResourceObserved,
            Event::QuorumQueryFailed,
            Event::WatchScheduled,
            Event::WatchCoalesced,
            Event::ResourceUserLost,
            Event::ResourceSettled,
            Event::ResourceRemoved,
            Event::WatchCancelled,
            Event::WatcherFailed,
            Event::BackendFailure,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::BackendFailure.is_fatal());
        assert_eq!(Event::BackendFailure.severity(), Severity::Fatal);
        assert!(!Event::ResourceUserLost.is_fatal());
    }

    #[test]
    fn test_noisy_events_are_trace() {
        assert_eq!(Event::WatchCoalesced.severity(), Severity::Trace);
        assert_eq!(Event::WatchCancelled.severity(), Severity::Trace);
    }
}
