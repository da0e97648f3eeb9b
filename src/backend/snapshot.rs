//! Snapshot-file backend
//!
//! Cluster state lives in a JSON file that is re-read on every query, so
//! the re-check after a debounce delay always sees the current contents.
//! Events arrive as one JSON object per line on any async reader.
//!
//! Snapshot format:
//!
//! ```json
//! {
//!   "resource_definitions": [
//!     {"name": "pvc-1", "props": {"DrbdOptions/Resource/quorum": "majority"}}
//!   ],
//!   "resources": [
//!     {"name": "pvc-1", "node_name": "node-a",
//!      "layer_object": {"type": "DRBD", "drbd": {"may_promote": true}}}
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use super::errors::{BackendError, BackendResult};
use super::{EligibilityStream, ResourceBackend};
use crate::model::{EligibilityEvent, Resource, ResourceDefinition};
use crate::observability::{log_event_with_fields, Event};

/// Contents of a snapshot file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub resource_definitions: Vec<ResourceDefinition>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ClusterSnapshot {
    /// Read and decode a snapshot file
    pub async fn load(path: &Path) -> BackendResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            BackendError::Io(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> BackendResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn definition(&self, resource_name: &str) -> Option<&ResourceDefinition> {
        self.resource_definitions
            .iter()
            .find(|rd| rd.name == resource_name)
    }

    /// Replicas of a resource. A resource with neither a definition nor any
    /// replica does not exist.
    pub fn replicas(&self, resource_name: &str) -> BackendResult<Vec<Resource>> {
        let replicas: Vec<Resource> = self
            .resources
            .iter()
            .filter(|r| r.name == resource_name)
            .cloned()
            .collect();

        if replicas.is_empty() && self.definition(resource_name).is_none() {
            return Err(BackendError::NotFound(resource_name.to_string()));
        }
        Ok(replicas)
    }
}

/// Backend reading cluster state from a snapshot file and events from a
/// line-oriented reader
#[derive(Debug)]
pub struct SnapshotBackend<R> {
    path: PathBuf,
    events: Mutex<Option<R>>,
}

impl<R> SnapshotBackend<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(path: impl Into<PathBuf>, events: R) -> Self {
        Self {
            path: path.into(),
            events: Mutex::new(Some(events)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> BackendResult<ClusterSnapshot> {
        ClusterSnapshot::load(&self.path).await
    }
}

impl<R> ResourceBackend for SnapshotBackend<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    type Events = LineEventStream<R>;

    async fn subscribe_promotions(&self) -> BackendResult<LineEventStream<R>> {
        let reader = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| BackendError::Unavailable("already subscribed".to_string()))?;

        Ok(LineEventStream::new(reader))
    }

    async fn resources(&self, resource_name: &str) -> BackendResult<Vec<Resource>> {
        self.snapshot().await?.replicas(resource_name)
    }

    async fn resource_definition(&self, resource_name: &str) -> BackendResult<ResourceDefinition> {
        self.snapshot()
            .await?
            .definition(resource_name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(resource_name.to_string()))
    }
}

/// Newline-delimited JSON event stream
#[derive(Debug)]
pub struct LineEventStream<R> {
    lines: Option<Lines<R>>,
}

impl<R> LineEventStream<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: Some(reader.lines()),
        }
    }
}

impl<R> EligibilityStream for LineEventStream<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_event(&mut self) -> Option<EligibilityEvent> {
        let lines = self.lines.as_mut()?;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<EligibilityEvent>(line) {
                        Ok(event) => return Some(event),
                        Err(e) => {
                            let error = e.to_string();
                            log_event_with_fields(
                                Event::EventDecodeFailed,
                                &[("error", error.as_str()), ("line", line)],
                            );
                        }
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    let error = e.to_string();
                    log_event_with_fields(Event::EventStreamFailed, &[("error", error.as_str())]);
                    return None;
                }
            }
        }
    }

    fn close(&mut self) {
        self.lines = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::BufReader;

    const SNAPSHOT: &str = r#"{
        "resource_definitions": [
            {"name": "pvc-1", "props": {"DrbdOptions/Resource/quorum": "majority"}},
            {"name": "pvc-empty"}
        ],
        "resources": [
            {"name": "pvc-1", "node_name": "node-a",
             "layer_object": {"type": "DRBD", "drbd": {"may_promote": true}}},
            {"name": "pvc-1", "node_name": "node-b",
             "layer_object": {"type": "DRBD", "drbd": {"may_promote": false}}}
        ]
    }"#;

    fn snapshot_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_replica_lookup() {
        let snapshot = ClusterSnapshot::parse(SNAPSHOT).unwrap();

        assert_eq!(snapshot.replicas("pvc-1").unwrap().len(), 2);
        assert!(snapshot.replicas("pvc-empty").unwrap().is_empty());
        assert!(snapshot.replicas("pvc-gone").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_queries_reread_the_file() {
        let file = snapshot_file(SNAPSHOT);
        let backend = SnapshotBackend::new(file.path(), BufReader::new(&b""[..]));

        let rd = backend.resource_definition("pvc-1").await.unwrap();
        assert!(rd.quorum_enabled());
        assert_eq!(backend.resources("pvc-1").await.unwrap().len(), 2);

        std::fs::write(file.path(), r#"{"resources": []}"#).unwrap();
        assert!(backend.resources("pvc-1").await.unwrap_err().is_not_found());
        assert!(backend
            .resource_definition("pvc-1")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_not_found() {
        let backend = SnapshotBackend::new(
            "/nonexistent/lostuser/snapshot.json",
            BufReader::new(&b""[..]),
        );
        let err = backend.resources("pvc-1").await.unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_decode_error() {
        let file = snapshot_file("{not json");
        let backend = SnapshotBackend::new(file.path(), BufReader::new(&b""[..]));
        let err = backend.resources("pvc-1").await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn test_line_stream_skips_garbage() {
        let input = b"{\"resource_name\":\"pvc-1\",\"may_promote\":true}\n\
                      \n\
                      garbage\n\
                      {\"resource_name\":\"pvc-2\",\"may_promote\":false}\n";
        let mut stream = LineEventStream::new(BufReader::new(&input[..]));

        assert_eq!(
            stream.next_event().await,
            Some(EligibilityEvent::promotable("pvc-1"))
        );
        assert_eq!(
            stream.next_event().await,
            Some(EligibilityEvent::new("pvc-2", false))
        );
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_closed_line_stream_ends() {
        let input = b"{\"resource_name\":\"pvc-1\",\"may_promote\":true}\n";
        let mut stream = LineEventStream::new(BufReader::new(&input[..]));
        stream.close();
        assert_eq!(stream.next_event().await, None);
    }

    #[tokio::test]
    async fn test_subscribe_once() {
        let file = snapshot_file(SNAPSHOT);
        let backend = SnapshotBackend::new(file.path(), BufReader::new(&b""[..]));
        assert!(backend.subscribe_promotions().await.is_ok());
        assert!(backend.subscribe_promotions().await.is_err());
    }
}
