//! Backend data model
//!
//! Typed views of the parts of the cluster backend's resource model that the
//! monitor reads: per-replica resources with their layer stack, resource
//! definitions with their properties, and may-promote events.

mod event;
mod layer;
mod resource;

pub use event::EligibilityEvent;
pub use layer::LayerKind;
pub use resource::{
    DrbdResource, Resource, ResourceDefinition, ResourceLayer, ResourceState, QUORUM_OFF,
    QUORUM_PROPERTY,
};
