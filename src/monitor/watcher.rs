//! Watcher
//!
//! One watcher per admitted signal. It waits out the debounce delay,
//! re-queries the live replica state and then:
//! - not found: drops the registry entry
//! - a replica is no longer DRBD: drops the registry entry
//! - a replica may be promoted: sends the resource name (blocking)
//! - otherwise: nothing
//!
//! Unless the entry was dropped, the watched flag is cleared at the end.
//! Any other query failure shuts the whole monitor down. On shutdown the
//! watcher returns at once and leaves the registry alone.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::{BackendError, ResourceBackend};
use crate::model::{LayerKind, Resource};
use crate::observability::{log_event_with_fields, Event, MonitorMetrics};

use super::registry::Registry;
use super::shutdown::{Shutdown, Termination};

/// What the re-queried replicas say
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaVerdict {
    /// A replica's top layer is not DRBD
    LayerMismatch(LayerKind),
    /// At least one replica may be promoted
    Promotable,
    /// No replica may be promoted
    Settled,
}

/// Classify the replicas of a resource. A layer mismatch on any replica
/// takes precedence over promotability.
pub fn evaluate(replicas: &[Resource]) -> ReplicaVerdict {
    if let Some(replica) = replicas
        .iter()
        .find(|r| !r.layer_object.kind.is_replicated())
    {
        return ReplicaVerdict::LayerMismatch(replica.layer_object.kind);
    }
    if replicas.iter().any(Resource::may_promote) {
        ReplicaVerdict::Promotable
    } else {
        ReplicaVerdict::Settled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    NotFound,
    LayerMismatch(LayerKind),
}

/// How a watcher finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Shutdown came first
    Cancelled,
    /// Registry entry dropped, nothing sent
    Removed(RemovalReason),
    /// Resource name sent on the lost-user channel
    Notified,
    /// Resource still promotable, but the lost-user receiver is gone
    Undelivered,
    /// Resource no longer promotable, nothing sent
    Settled,
    /// Re-check failed, monitor shut down
    Fatal(BackendError),
}

pub(crate) struct Watcher<B> {
    resource_name: String,
    delay: Duration,
    backend: Arc<B>,
    registry: Arc<Registry>,
    metrics: Arc<MonitorMetrics>,
    shutdown: Shutdown,
    lost_tx: mpsc::Sender<String>,
}

impl<B: ResourceBackend> Watcher<B> {
    pub(crate) fn new(
        resource_name: String,
        delay: Duration,
        backend: Arc<B>,
        registry: Arc<Registry>,
        metrics: Arc<MonitorMetrics>,
        shutdown: Shutdown,
        lost_tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            resource_name,
            delay,
            backend,
            registry,
            metrics,
            shutdown,
            lost_tx,
        }
    }

    pub(crate) async fn run(self) -> WatchOutcome {
        let mut signal = self.shutdown.signal();

        if signal
            .run_until_cancelled(tokio::time::sleep(self.delay))
            .await
            .is_none()
        {
            return self.cancelled();
        }

        let queried = signal
            .run_until_cancelled(self.backend.resources(&self.resource_name))
            .await;

        let replicas = match queried {
            None => return self.cancelled(),
            Some(Ok(replicas)) => replicas,
            Some(Err(e)) if e.is_not_found() => return self.remove(RemovalReason::NotFound),
            Some(Err(e)) => return self.fail(e),
        };

        match evaluate(&replicas) {
            ReplicaVerdict::LayerMismatch(kind) => self.remove(RemovalReason::LayerMismatch(kind)),
            ReplicaVerdict::Settled => {
                self.metrics.increment_settled();
                log_event_with_fields(
                    Event::ResourceSettled,
                    &[("resource", self.resource_name.as_str())],
                );
                self.registry.finish_watch(&self.resource_name);
                WatchOutcome::Settled
            }
            ReplicaVerdict::Promotable => {
                let sent = signal
                    .run_until_cancelled(self.lost_tx.send(self.resource_name.clone()))
                    .await;

                let outcome = match sent {
                    None => return self.cancelled(),
                    Some(Ok(())) => {
                        self.metrics.increment_notifications();
                        log_event_with_fields(
                            Event::ResourceUserLost,
                            &[("resource", self.resource_name.as_str())],
                        );
                        WatchOutcome::Notified
                    }
                    Some(Err(_)) => {
                        log_event_with_fields(
                            Event::ResourceUserLost,
                            &[
                                ("resource", self.resource_name.as_str()),
                                ("delivered", "false"),
                            ],
                        );
                        WatchOutcome::Undelivered
                    }
                };

                self.registry.finish_watch(&self.resource_name);
                outcome
            }
        }
    }

    fn cancelled(&self) -> WatchOutcome {
        self.metrics.increment_cancellations();
        log_event_with_fields(
            Event::WatchCancelled,
            &[("resource", self.resource_name.as_str())],
        );
        WatchOutcome::Cancelled
    }

    fn remove(&self, reason: RemovalReason) -> WatchOutcome {
        self.registry.remove(&self.resource_name);
        self.metrics.increment_removals();

        let reason_str = match reason {
            RemovalReason::NotFound => "not_found".to_string(),
            RemovalReason::LayerMismatch(kind) => format!("layer_mismatch:{}", kind),
        };
        log_event_with_fields(
            Event::ResourceRemoved,
            &[
                ("resource", self.resource_name.as_str()),
                ("reason", reason_str.as_str()),
            ],
        );
        WatchOutcome::Removed(reason)
    }

    fn fail(&self, error: BackendError) -> WatchOutcome {
        self.metrics.increment_backend_failures();

        let message = error.to_string();
        log_event_with_fields(
            Event::BackendFailure,
            &[
                ("resource", self.resource_name.as_str()),
                ("code", error.code()),
                ("error", message.as_str()),
            ],
        );
        self.shutdown
            .trigger(Termination::BackendFailure(error.clone()));
        WatchOutcome::Fatal(error)
    }
}
