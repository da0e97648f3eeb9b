//! Resource and resource-definition views
//!
//! Field names follow the backend's JSON representation. Everything except
//! the name is optional on the wire.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::layer::LayerKind;

/// Property on the resource definition that enables DRBD quorum
pub const QUORUM_PROPERTY: &str = "DrbdOptions/Resource/quorum";

/// Property value that explicitly disables quorum
pub const QUORUM_OFF: &str = "off";

/// One replica of a resource, as deployed on a single node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub props: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default)]
    pub layer_object: ResourceLayer,
    #[serde(default)]
    pub state: ResourceState,
}

impl Resource {
    /// Create a DRBD replica on `node_name`
    pub fn drbd(name: impl Into<String>, node_name: impl Into<String>, may_promote: bool) -> Self {
        Self {
            name: name.into(),
            node_name: node_name.into(),
            layer_object: ResourceLayer {
                kind: LayerKind::Drbd,
                drbd: Some(DrbdResource {
                    may_promote,
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a replica whose top layer is `kind`
    pub fn with_layer(name: impl Into<String>, node_name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            node_name: node_name.into(),
            layer_object: ResourceLayer {
                kind,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Whether this replica's DRBD layer reports it may be promoted.
    ///
    /// Always false for replicas whose top layer is not DRBD.
    pub fn may_promote(&self) -> bool {
        self.layer_object.kind.is_replicated()
            && self
                .layer_object
                .drbd
                .as_ref()
                .map(|d| d.may_promote)
                .unwrap_or(false)
    }
}

/// Top of a replica's layer stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLayer {
    #[serde(rename = "type", default)]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_name_suffix: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResourceLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drbd: Option<DrbdResource>,
}

/// DRBD-specific layer data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrbdResource {
    #[serde(default)]
    pub node_id: u32,
    #[serde(default)]
    pub peer_slots: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default)]
    pub may_promote: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(default)]
    pub in_use: bool,
}

/// Cluster-wide definition of a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    #[serde(default)]
    pub props: HashMap<String, String>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: HashMap::new(),
        }
    }

    /// Set the DRBD quorum property
    pub fn with_quorum(mut self, value: impl Into<String>) -> Self {
        self.props.insert(QUORUM_PROPERTY.to_string(), value.into());
        self
    }

    /// Quorum is enabled unless the property is missing or explicitly "off"
    pub fn quorum_enabled(&self) -> bool {
        match self.props.get(QUORUM_PROPERTY) {
            None => false,
            Some(value) => value != QUORUM_OFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_backend_resource() {
        let json = r#"{
            "name": "pvc-1",
            "node_name": "node-a",
            "layer_object": {
                "type": "DRBD",
                "children": [{"type": "STORAGE"}],
                "drbd": {"node_id": 1, "peer_slots": 7, "may_promote": true}
            },
            "state": {"in_use": false}
        }"#;

        let res: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(res.name, "pvc-1");
        assert_eq!(res.layer_object.kind, LayerKind::Drbd);
        assert_eq!(res.layer_object.children[0].kind, LayerKind::Storage);
        assert!(res.may_promote());
    }

    #[test]
    fn test_missing_layer_data_cannot_promote() {
        let res: Resource = serde_json::from_str(r#"{"name": "pvc-1"}"#).unwrap();
        assert_eq!(res.layer_object.kind, LayerKind::Unknown);
        assert!(!res.may_promote());
    }

    #[test]
    fn test_non_drbd_layer_never_promotes() {
        let mut res = Resource::with_layer("pvc-1", "node-a", LayerKind::Luks);
        res.layer_object.drbd = Some(DrbdResource {
            may_promote: true,
            ..Default::default()
        });
        assert!(!res.may_promote());
    }

    #[test]
    fn test_quorum_property_values() {
        assert!(!ResourceDefinition::new("r").quorum_enabled());
        assert!(!ResourceDefinition::new("r").with_quorum("off").quorum_enabled());
        assert!(ResourceDefinition::new("r").with_quorum("majority").quorum_enabled());
        assert!(ResourceDefinition::new("r").with_quorum("all").quorum_enabled());
        assert!(ResourceDefinition::new("r").with_quorum("2").quorum_enabled());
    }
}
