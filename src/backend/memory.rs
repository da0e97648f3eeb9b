//! In-memory backend
//!
//! Holds resource definitions and replicas in process memory and feeds
//! events through a bounded channel. Queries can be made to fail on demand.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::errors::{BackendError, BackendResult};
use super::{EligibilityStream, ResourceBackend};
use crate::model::{EligibilityEvent, Resource, ResourceDefinition};

/// Capacity of the event channel between publishers and the monitor
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct ClusterState {
    definitions: HashMap<String, ResourceDefinition>,
    resources: HashMap<String, Vec<Resource>>,
    resource_failure: Option<BackendError>,
    definition_failure: Option<BackendError>,
    resource_queries: u64,
    definition_queries: u64,
}

/// Backend kept entirely in memory
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Mutex<ClusterState>,
    events_tx: Mutex<Option<mpsc::Sender<EligibilityEvent>>>,
    events_rx: Mutex<Option<mpsc::Receiver<EligibilityEvent>>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(ClusterState::default()),
            events_tx: Mutex::new(Some(tx)),
            events_rx: Mutex::new(Some(rx)),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a resource definition
    pub fn set_definition(&self, definition: ResourceDefinition) {
        self.state()
            .definitions
            .insert(definition.name.clone(), definition);
    }

    /// Replace the replicas of a resource
    pub fn set_resources(&self, resource_name: &str, replicas: Vec<Resource>) {
        self.state()
            .resources
            .insert(resource_name.to_string(), replicas);
    }

    /// Delete a resource together with its definition
    pub fn remove_resource(&self, resource_name: &str) {
        let mut state = self.state();
        state.definitions.remove(resource_name);
        state.resources.remove(resource_name);
    }

    /// Make every following replica query fail with `error` (or succeed
    /// again with `None`)
    pub fn fail_resource_queries(&self, error: Option<BackendError>) {
        self.state().resource_failure = error;
    }

    /// Make every following definition query fail with `error` (or succeed
    /// again with `None`)
    pub fn fail_definition_queries(&self, error: Option<BackendError>) {
        self.state().definition_failure = error;
    }

    /// Number of replica queries served so far
    pub fn resource_queries(&self) -> u64 {
        self.state().resource_queries
    }

    /// Number of definition queries served so far
    pub fn definition_queries(&self) -> u64 {
        self.state().definition_queries
    }

    /// Push an event to the subscriber
    pub async fn publish(&self, event: EligibilityEvent) -> BackendResult<()> {
        let tx = self
            .events_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| BackendError::Unavailable("event stream closed".to_string()))?;

        tx.send(event)
            .await
            .map_err(|_| BackendError::Unavailable("event stream closed".to_string()))
    }

    /// End the event stream. Events already queued are still delivered.
    pub fn close_events(&self) {
        self.events_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl ResourceBackend for InMemoryBackend {
    type Events = ChannelEventStream;

    async fn subscribe_promotions(&self) -> BackendResult<ChannelEventStream> {
        let rx = self
            .events_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| BackendError::Unavailable("already subscribed".to_string()))?;

        Ok(ChannelEventStream::new(rx))
    }

    async fn resources(&self, resource_name: &str) -> BackendResult<Vec<Resource>> {
        let mut state = self.state();
        state.resource_queries += 1;

        if let Some(err) = state.resource_failure.clone() {
            return Err(err);
        }

        state
            .resources
            .get(resource_name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(resource_name.to_string()))
    }

    async fn resource_definition(&self, resource_name: &str) -> BackendResult<ResourceDefinition> {
        let mut state = self.state();
        state.definition_queries += 1;

        if let Some(err) = state.definition_failure.clone() {
            return Err(err);
        }

        state
            .definitions
            .get(resource_name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(resource_name.to_string()))
    }
}

/// Event stream backed by a tokio channel
#[derive(Debug)]
pub struct ChannelEventStream {
    rx: mpsc::Receiver<EligibilityEvent>,
    closed: bool,
}

impl ChannelEventStream {
    pub fn new(rx: mpsc::Receiver<EligibilityEvent>) -> Self {
        Self { rx, closed: false }
    }
}

impl EligibilityStream for ChannelEventStream {
    async fn next_event(&mut self) -> Option<EligibilityEvent> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    fn close(&mut self) {
        self.closed = true;
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerKind;

    #[tokio::test]
    async fn test_unknown_resource_is_not_found() {
        let backend = InMemoryBackend::new();

        let err = backend.resources("pvc-1").await.unwrap_err();
        assert!(err.is_not_found());

        let err = backend.resource_definition("pvc-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_and_remove_resource() {
        let backend = InMemoryBackend::new();
        backend.set_definition(ResourceDefinition::new("pvc-1").with_quorum("majority"));
        backend.set_resources(
            "pvc-1",
            vec![
                Resource::drbd("pvc-1", "node-a", false),
                Resource::with_layer("pvc-1", "node-b", LayerKind::Storage),
            ],
        );

        assert_eq!(backend.resources("pvc-1").await.unwrap().len(), 2);
        assert!(backend.resource_definition("pvc-1").await.unwrap().quorum_enabled());

        backend.remove_resource("pvc-1");
        assert!(backend.resources("pvc-1").await.unwrap_err().is_not_found());
        assert_eq!(backend.resource_queries(), 2);
        assert_eq!(backend.definition_queries(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let backend = InMemoryBackend::new();
        backend.set_resources("pvc-1", vec![Resource::drbd("pvc-1", "node-a", true)]);
        backend.fail_resource_queries(Some(BackendError::Unavailable("down".into())));

        let err = backend.resources("pvc-1").await.unwrap_err();
        assert_eq!(err, BackendError::Unavailable("down".into()));

        backend.fail_resource_queries(None);
        assert!(backend.resources("pvc-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_single_subscription() {
        let backend = InMemoryBackend::new();
        let _events = backend.subscribe_promotions().await.unwrap();
        assert!(backend.subscribe_promotions().await.is_err());
    }

    #[tokio::test]
    async fn test_events_delivered_until_closed() {
        let backend = InMemoryBackend::new();
        let mut events = backend.subscribe_promotions().await.unwrap();

        backend.publish(EligibilityEvent::promotable("pvc-1")).await.unwrap();
        backend.close_events();

        assert_eq!(
            events.next_event().await,
            Some(EligibilityEvent::promotable("pvc-1"))
        );
        assert_eq!(events.next_event().await, None);
        assert!(backend.publish(EligibilityEvent::promotable("pvc-2")).await.is_err());
    }

    #[tokio::test]
    async fn test_closed_stream_yields_nothing() {
        let backend = InMemoryBackend::new();
        let mut events = backend.subscribe_promotions().await.unwrap();
        backend.publish(EligibilityEvent::promotable("pvc-1")).await.unwrap();

        events.close();
        assert_eq!(events.next_event().await, None);
    }
}
