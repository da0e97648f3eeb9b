//! Admission decision
//!
//! Decides, for one positive may-promote signal, whether a watcher is
//! scheduled and with which delay. The rules:
//!
//! | registry entry            | decision                       |
//! |---------------------------|--------------------------------|
//! | none, quorum query fails  | skip, no entry created         |
//! | none, quorum disabled     | skip, entry `{false, false}`   |
//! | none, quorum enabled      | watch (initial delay)          |
//! | watched                   | skip (coalesced)               |
//! | not watched, no quorum    | skip                           |
//! | not watched, quorum       | watch (existing delay)         |
//!
//! The quorum query happens outside the registry lock.

use crate::backend::{BackendError, ResourceBackend};
use crate::observability::{log_event_with_fields, Event};

use super::quorum::resource_has_quorum;
use super::registry::{Registry, ResourceRecord};

/// Which configured delay a watcher waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    /// First observation of the resource
    Initial,
    /// Resource already in the registry
    Existing,
}

impl DelayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelayKind::Initial => "initial",
            DelayKind::Existing => "existing",
        }
    }
}

/// Why no watcher was scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A watcher for this resource is already pending
    AlreadyWatched,
    /// Quorum is disabled for this resource
    NoQuorum,
    /// The quorum property could not be read
    QuorumUnavailable(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Watch(DelayKind),
    Skip(SkipReason),
}

impl Admission {
    pub fn is_watch(&self) -> bool {
        matches!(self, Admission::Watch(_))
    }
}

/// Decision for a resource that already has a registry entry. Marks the
/// record as watched when a watcher is scheduled.
pub fn admit_existing(record: &mut ResourceRecord) -> Admission {
    if record.is_watched {
        return Admission::Skip(SkipReason::AlreadyWatched);
    }
    if !record.has_quorum {
        return Admission::Skip(SkipReason::NoQuorum);
    }
    record.is_watched = true;
    Admission::Watch(DelayKind::Existing)
}

/// Record and decision for a resource seen for the first time.
///
/// A quorum-enabled resource is recorded as already watched, since the
/// caller schedules its watcher right away.
pub fn admit_new(has_quorum: bool) -> (ResourceRecord, Admission) {
    let record = ResourceRecord {
        has_quorum,
        is_watched: has_quorum,
    };
    let admission = if has_quorum {
        Admission::Watch(DelayKind::Initial)
    } else {
        Admission::Skip(SkipReason::NoQuorum)
    };
    (record, admission)
}

/// Full admission for one positive signal on `resource_name`
pub async fn decide<B: ResourceBackend>(
    backend: &B,
    registry: &Registry,
    resource_name: &str,
) -> Admission {
    if let Some(admission) = registry.admit_known(resource_name) {
        return admission;
    }

    let has_quorum = match resource_has_quorum(backend, resource_name).await {
        Ok(has_quorum) => has_quorum,
        Err(e) => {
            let error = e.to_string();
            log_event_with_fields(
                Event::QuorumQueryFailed,
                &[("resource", resource_name), ("error", error.as_str())],
            );
            return Admission::Skip(SkipReason::QuorumUnavailable(e));
        }
    };

    log_event_with_fields(
        Event::ResourceObserved,
        &[
            ("resource", resource_name),
            ("has_quorum", if has_quorum { "true" } else { "false" }),
        ],
    );
    registry.admit_new(resource_name, has_quorum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::model::ResourceDefinition;

    #[test]
    fn test_new_with_quorum_is_watched_immediately() {
        let (record, admission) = admit_new(true);
        assert!(record.has_quorum);
        assert!(record.is_watched);
        assert_eq!(admission, Admission::Watch(DelayKind::Initial));
    }

    #[test]
    fn test_new_without_quorum_is_recorded_unwatched() {
        let (record, admission) = admit_new(false);
        assert!(!record.has_quorum);
        assert!(!record.is_watched);
        assert_eq!(admission, Admission::Skip(SkipReason::NoQuorum));
    }

    #[test]
    fn test_existing_watched_is_coalesced() {
        let mut record = ResourceRecord {
            has_quorum: true,
            is_watched: true,
        };
        assert_eq!(
            admit_existing(&mut record),
            Admission::Skip(SkipReason::AlreadyWatched)
        );
        assert!(record.is_watched);
    }

    #[test]
    fn test_existing_without_quorum_never_watched() {
        let mut record = ResourceRecord {
            has_quorum: false,
            is_watched: false,
        };
        assert_eq!(admit_existing(&mut record), Admission::Skip(SkipReason::NoQuorum));
        assert!(!record.is_watched);
    }

    #[test]
    fn test_existing_idle_with_quorum_uses_existing_delay() {
        let mut record = ResourceRecord {
            has_quorum: true,
            is_watched: false,
        };
        assert_eq!(admit_existing(&mut record), Admission::Watch(DelayKind::Existing));
        assert!(record.is_watched);
    }

    #[tokio::test]
    async fn test_decide_queries_quorum_once() {
        let backend = InMemoryBackend::new();
        backend.set_definition(ResourceDefinition::new("pvc-1").with_quorum("majority"));
        let registry = Registry::new();

        assert_eq!(
            decide(&backend, &registry, "pvc-1").await,
            Admission::Watch(DelayKind::Initial)
        );
        assert_eq!(
            decide(&backend, &registry, "pvc-1").await,
            Admission::Skip(SkipReason::AlreadyWatched)
        );
        assert_eq!(backend.definition_queries(), 1);
    }

    #[tokio::test]
    async fn test_decide_failed_quorum_query_creates_nothing() {
        let backend = InMemoryBackend::new();
        let registry = Registry::new();

        // no definition: the query fails with not-found
        let admission = decide(&backend, &registry, "pvc-1").await;
        assert!(matches!(
            admission,
            Admission::Skip(SkipReason::QuorumUnavailable(_))
        ));
        assert!(registry.get("pvc-1").is_none());

        // re-evaluated from scratch next time
        backend.set_definition(ResourceDefinition::new("pvc-1").with_quorum("majority"));
        assert!(decide(&backend, &registry, "pvc-1").await.is_watch());
        assert_eq!(backend.definition_queries(), 2);
    }

    #[tokio::test]
    async fn test_decide_quorumless_resource_is_cached() {
        let backend = InMemoryBackend::new();
        backend.set_definition(ResourceDefinition::new("pvc-3").with_quorum("off"));
        let registry = Registry::new();

        for _ in 0..3 {
            assert_eq!(
                decide(&backend, &registry, "pvc-3").await,
                Admission::Skip(SkipReason::NoQuorum)
            );
        }
        assert_eq!(backend.definition_queries(), 1);
        assert_eq!(
            registry.get("pvc-3"),
            Some(ResourceRecord {
                has_quorum: false,
                is_watched: false
            })
        );
    }
}
