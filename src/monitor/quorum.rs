//! Quorum oracle

use crate::backend::{BackendResult, ResourceBackend};

/// Whether DRBD quorum is enabled for `resource_name`.
///
/// Reads the quorum property from the resource definition. A failed fetch
/// is an error, never a guess in either direction.
pub async fn resource_has_quorum<B: ResourceBackend>(
    backend: &B,
    resource_name: &str,
) -> BackendResult<bool> {
    let definition = backend.resource_definition(resource_name).await?;
    Ok(definition.quorum_enabled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, InMemoryBackend};
    use crate::model::ResourceDefinition;

    #[tokio::test]
    async fn test_property_values() {
        let backend = InMemoryBackend::new();
        backend.set_definition(ResourceDefinition::new("missing"));
        backend.set_definition(ResourceDefinition::new("off").with_quorum("off"));
        backend.set_definition(ResourceDefinition::new("majority").with_quorum("majority"));

        assert!(!resource_has_quorum(&backend, "missing").await.unwrap());
        assert!(!resource_has_quorum(&backend, "off").await.unwrap());
        assert!(resource_has_quorum(&backend, "majority").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let backend = InMemoryBackend::new();
        backend.set_definition(ResourceDefinition::new("pvc-1").with_quorum("majority"));
        backend.fail_definition_queries(Some(BackendError::Unavailable("down".into())));

        let err = resource_has_quorum(&backend, "pvc-1").await.unwrap_err();
        assert_eq!(err, BackendError::Unavailable("down".into()));
    }
}
