//! Lost Resource User Monitor
//!
//! Turns the backend's noisy stream of "may this resource be promoted"
//! signals into debounced, quorum-gated "user lost" notifications.
//!
//! Per resource:
//!
//! ```text
//! Unknown ──► NoQuorumIdle
//!    │
//!    └──────► QuorumWatching ──► QuorumIdle ──► QuorumWatching ...
//!                   │
//!                   └──► Unknown (deleted or no longer DRBD)
//! ```
//!
//! - At most one watcher per resource at any time
//! - Resources without quorum never produce a notification
//! - A notification needs a replica that still may be promoted after the
//!   delay
//!
//! Quorum status is read once per registry entry and not refreshed. A
//! resource whose quorum setting changes keeps its old status until the
//! entry is removed.

mod admission;
mod config;
mod engine;
mod errors;
mod quorum;
mod registry;
mod shutdown;
mod watcher;

pub use admission::{admit_existing, admit_new, Admission, DelayKind, SkipReason};
pub use config::{
    MonitorConfig, EXISTING_DELAY_DEFAULT, INITIAL_DELAY_DEFAULT, OUTPUT_CAPACITY_DEFAULT,
};
pub use engine::{LostUserMonitor, LostUsers, MonitorHandle, StopHandle};
pub use errors::{MonitorError, MonitorResult};
pub use quorum::resource_has_quorum;
pub use registry::{ResourcePhase, ResourceRecord};
pub use shutdown::Termination;
pub use watcher::{evaluate, RemovalReason, ReplicaVerdict, WatchOutcome};
