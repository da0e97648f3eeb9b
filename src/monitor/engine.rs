//! Lost-user monitor
//!
//! The ingestion loop reads may-promote events, runs the admission decision
//! for every positive one and spawns a watcher when told to. It owns the
//! monitor's lifecycle:
//! - stop requested: closes the backend stream and ends
//! - stream ended: triggers shutdown (pending watchers are cancelled) and ends
//! - a watcher hit a fatal backend error: same as stop requested
//!
//! After the loop ends, all watchers are drained. The lost-user channel
//! closes once the loop and every watcher have dropped their sender.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use uuid::Uuid;

use crate::backend::{EligibilityStream, ResourceBackend};
use crate::model::EligibilityEvent;
use crate::observability::{log_event_with_fields, Event, MetricsSnapshot, MonitorMetrics};

use super::admission::{decide, Admission, SkipReason};
use super::config::MonitorConfig;
use super::errors::{MonitorError, MonitorResult};
use super::registry::Registry;
use super::shutdown::{Shutdown, ShutdownSignal, Termination};
use super::watcher::{WatchOutcome, Watcher};

/// Ingestion loop state. Lives inside the monitor task.
pub struct LostUserMonitor<B> {
    monitor_id: Uuid,
    backend: Arc<B>,
    config: MonitorConfig,
    registry: Arc<Registry>,
    metrics: Arc<MonitorMetrics>,
    shutdown: Shutdown,
}

impl<B: ResourceBackend> LostUserMonitor<B> {
    /// Subscribe to may-promote events and start the monitor.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle does not stop the monitor.
    pub async fn start(
        backend: Arc<B>,
        config: MonitorConfig,
    ) -> MonitorResult<(MonitorHandle, LostUsers)> {
        config.validate()?;

        let events = backend
            .subscribe_promotions()
            .await
            .map_err(MonitorError::Subscribe)?;

        let (lost_tx, lost_rx) = mpsc::channel(config.output_capacity);
        let monitor = Self {
            monitor_id: Uuid::new_v4(),
            backend,
            config,
            registry: Arc::new(Registry::new()),
            metrics: Arc::new(MonitorMetrics::new()),
            shutdown: Shutdown::new(),
        };

        let handle = MonitorHandle {
            monitor_id: monitor.monitor_id,
            shutdown: monitor.shutdown.clone(),
            metrics: Arc::clone(&monitor.metrics),
            registry: Arc::clone(&monitor.registry),
            task: tokio::spawn(monitor.run(events, lost_tx)),
        };

        Ok((handle, LostUsers { rx: lost_rx }))
    }

    async fn run(self, mut events: B::Events, lost_tx: mpsc::Sender<String>) -> Termination {
        let monitor_id = self.monitor_id.to_string();
        let initial_ms = self.config.initial_delay.as_millis().to_string();
        let existing_ms = self.config.existing_delay.as_millis().to_string();
        log_event_with_fields(
            Event::MonitorStart,
            &[
                ("monitor_id", monitor_id.as_str()),
                ("initial_delay_ms", initial_ms.as_str()),
                ("existing_delay_ms", existing_ms.as_str()),
            ],
        );

        let mut signal = self.shutdown.signal();
        let mut watchers: JoinSet<WatchOutcome> = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = signal.cancelled() => {
                    events.close();
                    break;
                }

                Some(joined) = watchers.join_next(), if !watchers.is_empty() => {
                    self.reap(joined);
                }

                next = events.next_event() => match next {
                    Some(event) => {
                        self.ingest(event, &mut signal, &mut watchers, &lost_tx).await;
                    }
                    None => {
                        log_event_with_fields(
                            Event::EventStreamEnded,
                            &[("monitor_id", monitor_id.as_str())],
                        );
                        self.shutdown.trigger(Termination::StreamEnded);
                        events.close();
                        break;
                    }
                },
            }
        }

        drop(lost_tx);
        while let Some(joined) = watchers.join_next().await {
            self.reap(joined);
        }

        let termination = self.shutdown.cause().unwrap_or(Termination::Stopped);
        log_event_with_fields(
            Event::MonitorStopped,
            &[
                ("monitor_id", monitor_id.as_str()),
                ("reason", termination.as_str()),
                ("tracked_resources", self.registry.len().to_string().as_str()),
            ],
        );
        termination
    }

    async fn ingest(
        &self,
        event: EligibilityEvent,
        signal: &mut ShutdownSignal,
        watchers: &mut JoinSet<WatchOutcome>,
        lost_tx: &mpsc::Sender<String>,
    ) {
        self.metrics.increment_events_received();
        if !event.is_actionable() {
            self.metrics.increment_events_ignored();
            return;
        }

        let resource_name = event.resource_name;
        let decided = signal
            .run_until_cancelled(decide(&*self.backend, &self.registry, &resource_name))
            .await;
        let Some(admission) = decided else {
            return;
        };

        match admission {
            Admission::Watch(kind) => {
                let delay = self.config.delay_for(kind);
                let delay_ms = delay.as_millis().to_string();
                log_event_with_fields(
                    Event::WatchScheduled,
                    &[
                        ("resource", resource_name.as_str()),
                        ("delay", kind.as_str()),
                        ("delay_ms", delay_ms.as_str()),
                    ],
                );
                self.metrics.increment_watches_scheduled();

                let watcher = Watcher::new(
                    resource_name,
                    delay,
                    Arc::clone(&self.backend),
                    Arc::clone(&self.registry),
                    Arc::clone(&self.metrics),
                    self.shutdown.clone(),
                    lost_tx.clone(),
                );
                watchers.spawn(watcher.run());
            }
            Admission::Skip(SkipReason::AlreadyWatched) => {
                self.metrics.increment_watches_coalesced();
                log_event_with_fields(
                    Event::WatchCoalesced,
                    &[("resource", resource_name.as_str())],
                );
            }
            Admission::Skip(SkipReason::NoQuorum) => {
                self.metrics.increment_quorumless_skips();
            }
            Admission::Skip(SkipReason::QuorumUnavailable(_)) => {
                self.metrics.increment_quorum_query_failures();
            }
        }
    }

    fn reap(&self, joined: Result<WatchOutcome, JoinError>) {
        if let Err(e) = joined {
            let error = e.to_string();
            log_event_with_fields(Event::WatcherFailed, &[("error", error.as_str())]);
        }
    }
}

/// Control side of a running monitor
#[derive(Debug)]
pub struct MonitorHandle {
    monitor_id: Uuid,
    shutdown: Shutdown,
    metrics: Arc<MonitorMetrics>,
    registry: Arc<Registry>,
    task: JoinHandle<Termination>,
}

impl MonitorHandle {
    /// Request shutdown. Idempotent.
    pub fn stop(&self) {
        request_stop(&self.shutdown, self.monitor_id);
    }

    /// A cloneable handle that can only stop the monitor
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            monitor_id: self.monitor_id,
            shutdown: self.shutdown.clone(),
        }
    }

    /// True once shutdown has been triggered for any reason
    pub fn is_stopping(&self) -> bool {
        self.shutdown.is_triggered()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of resources currently tracked
    pub fn tracked_resources(&self) -> usize {
        self.registry.len()
    }

    /// Wait until the ingestion loop and all watchers have finished
    pub async fn join(self) -> Termination {
        match self.task.await {
            Ok(termination) => termination,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Termination::Stopped,
        }
    }
}

/// Stop-only handle, shareable across tasks
#[derive(Debug, Clone)]
pub struct StopHandle {
    monitor_id: Uuid,
    shutdown: Shutdown,
}

impl StopHandle {
    /// Request shutdown. Idempotent.
    pub fn stop(&self) {
        request_stop(&self.shutdown, self.monitor_id);
    }
}

fn request_stop(shutdown: &Shutdown, monitor_id: Uuid) {
    if shutdown.trigger(Termination::Stopped) {
        let monitor_id = monitor_id.to_string();
        log_event_with_fields(
            Event::MonitorStopRequested,
            &[("monitor_id", monitor_id.as_str())],
        );
    }
}

/// Names of resources that lost their user.
///
/// Yields `None` once the monitor has fully stopped.
#[derive(Debug)]
pub struct LostUsers {
    rx: mpsc::Receiver<String>,
}

impl LostUsers {
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
