//! Resource registry
//!
//! The monitor's only mutable shared state: resource name → record, behind
//! one mutex. Critical sections never await.
//!
//! Entries are created on the first positive signal for a resource and
//! removed only when the resource is gone or no longer a DRBD resource.
//! Quorum status is recorded once and not refreshed while the entry lives.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::admission::{admit_existing, admit_new, Admission};

/// Per-resource state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Quorum status at first observation
    pub has_quorum: bool,
    /// A watcher is scheduled and has not finished
    pub is_watched: bool,
}

/// Where a resource stands in the monitor's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePhase {
    /// No registry entry (never seen, or removed)
    Unknown,
    NoQuorumIdle,
    QuorumIdle,
    QuorumWatching,
}

impl ResourceRecord {
    pub fn phase(&self) -> ResourcePhase {
        match (self.has_quorum, self.is_watched) {
            (false, _) => ResourcePhase::NoQuorumIdle,
            (true, false) => ResourcePhase::QuorumIdle,
            (true, true) => ResourcePhase::QuorumWatching,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    records: Mutex<HashMap<String, ResourceRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ResourceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, resource_name: &str) -> Option<ResourceRecord> {
        self.lock().get(resource_name).copied()
    }

    pub fn phase(&self, resource_name: &str) -> ResourcePhase {
        self.get(resource_name)
            .map(|record| record.phase())
            .unwrap_or(ResourcePhase::Unknown)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Admission for a resource with an entry, or `None` if there is none
    pub fn admit_known(&self, resource_name: &str) -> Option<Admission> {
        self.lock().get_mut(resource_name).map(admit_existing)
    }

    /// Create the entry for a newly observed resource and decide.
    ///
    /// Falls back to the existing-entry rules if an entry appeared while
    /// the quorum status was being fetched.
    pub fn admit_new(&self, resource_name: &str, has_quorum: bool) -> Admission {
        let mut records = self.lock();
        if let Some(record) = records.get_mut(resource_name) {
            return admit_existing(record);
        }
        let (record, admission) = admit_new(has_quorum);
        records.insert(resource_name.to_string(), record);
        admission
    }

    /// Clear the watched flag once a watcher is done
    pub fn finish_watch(&self, resource_name: &str) {
        if let Some(record) = self.lock().get_mut(resource_name) {
            record.is_watched = false;
        }
    }

    /// Drop the entry. Returns true if there was one.
    pub fn remove(&self, resource_name: &str) -> bool {
        self.lock().remove(resource_name).is_some()
    }
}
