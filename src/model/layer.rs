//! Device layer kinds
//!
//! A resource is assembled from a stack of device layers. Only the DRBD
//! layer is replicated; every other kind is outside the monitor's model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a device layer as reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerKind {
    /// Replicated block device
    Drbd,
    Luks,
    Storage,
    Nvme,
    Exos,
    Writecache,
    Cache,
    Bcache,
    /// Any kind this crate does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl LayerKind {
    /// Returns the wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Drbd => "DRBD",
            LayerKind::Luks => "LUKS",
            LayerKind::Storage => "STORAGE",
            LayerKind::Nvme => "NVME",
            LayerKind::Exos => "EXOS",
            LayerKind::Writecache => "WRITECACHE",
            LayerKind::Cache => "CACHE",
            LayerKind::Bcache => "BCACHE",
            LayerKind::Unknown => "UNKNOWN",
        }
    }

    /// True for the replicated layer the monitor understands
    pub fn is_replicated(&self) -> bool {
        matches!(self, LayerKind::Drbd)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
