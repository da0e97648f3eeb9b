//! Backend Interfaces
//!
//! The monitor never talks to a wire protocol itself. It consumes:
//! - an eligibility event stream that can be closed explicitly
//! - a per-replica resource state query that distinguishes "not found"
//! - a resource definition query used to read the quorum property
//!
//! Two implementations ship with the crate: [`InMemoryBackend`] for
//! embedding and tests, and [`SnapshotBackend`] which re-reads a JSON
//! cluster snapshot on every query.

mod errors;
mod memory;
mod snapshot;

use std::future::Future;

use crate::model::{EligibilityEvent, Resource, ResourceDefinition};

pub use errors::{BackendError, BackendResult};
pub use memory::{ChannelEventStream, InMemoryBackend};
pub use snapshot::{ClusterSnapshot, LineEventStream, SnapshotBackend};

/// A stream of may-promote events
pub trait EligibilityStream: Send + 'static {
    /// Wait for the next event. `None` means the stream has ended.
    fn next_event(&mut self) -> impl Future<Output = Option<EligibilityEvent>> + Send;

    /// Tear down the stream. No events are delivered afterwards.
    fn close(&mut self);
}

/// Queries the monitor issues against the cluster backend
pub trait ResourceBackend: Send + Sync + 'static {
    type Events: EligibilityStream;

    /// Open the may-promote event stream
    fn subscribe_promotions(&self) -> impl Future<Output = BackendResult<Self::Events>> + Send;

    /// All replicas of a resource. Fails with [`BackendError::NotFound`]
    /// if the resource does not exist.
    fn resources(
        &self,
        resource_name: &str,
    ) -> impl Future<Output = BackendResult<Vec<Resource>>> + Send;

    /// The resource's cluster-wide definition
    fn resource_definition(
        &self,
        resource_name: &str,
    ) -> impl Future<Output = BackendResult<ResourceDefinition>> + Send;
}
