//! In-memory connector for pipeline and scheduler tests that don't need
//! real file I/O.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use warden_core::{ObjectRecord, Source};

use crate::connector::{Connector, FetchedRange};
use crate::error::{ConnectError, ConnectResult};

/// Connector backed by an in-memory map of `fetch_path -> bytes`, with a
/// fixed discovered-object set handed back verbatim.
pub struct MockConnector {
    objects: Vec<ObjectRecord>,
    content: RwLock<HashMap<String, Vec<u8>>>,
}

impl MockConnector {
    pub fn new(objects: Vec<ObjectRecord>, content: HashMap<String, Vec<u8>>) -> Self {
        Self { objects, content: RwLock::new(content) }
    }

    /// Replace the bytes behind `fetch_path`, simulating content changing
    /// between scan cycles.
    pub fn set_content(&self, fetch_path: impl Into<String>, bytes: Vec<u8>) {
        self.content.write().expect("mock connector lock poisoned").insert(fetch_path.into(), bytes);
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn discover(&self, _source: &Source) -> ConnectResult<Vec<ObjectRecord>> {
        Ok(self.objects.clone())
    }

    async fn fetch(&self, _source: &Source, fetch_path: &str, offset: u64, limit: u64) -> ConnectResult<FetchedRange> {
        let content = self.content.read().expect("mock connector lock poisoned");
        let bytes = content
            .get(fetch_path)
            .ok_or_else(|| ConnectError::NotFound(fetch_path.to_string()))?;
        let start = (offset as usize).min(bytes.len());
        let end = (start + limit as usize).min(bytes.len());
        Ok(FetchedRange { data: bytes[start..end].to_vec(), expanded: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ServiceKind;

    #[tokio::test]
    async fn fetch_returns_stored_bytes() {
        let mut content = HashMap::new();
        content.insert("a.txt".to_string(), b"abcdefgh".to_vec());
        let connector = MockConnector::new(vec![], content);
        let source = Source::new("acct", ServiceKind::S3, "bucket");
        let fetched = connector.fetch(&source, "a.txt", 2, 3).await.unwrap();
        assert_eq!(fetched.data, b"cde");
    }

    #[tokio::test]
    async fn fetch_unknown_path_is_not_found() {
        let connector = MockConnector::new(vec![], HashMap::new());
        let source = Source::new("acct", ServiceKind::S3, "bucket");
        assert!(connector.fetch(&source, "missing.txt", 0, 1).await.is_err());
    }

    #[tokio::test]
    async fn set_content_overwrites_subsequent_fetch() {
        let connector = MockConnector::new(vec![], HashMap::new());
        connector.set_content("a.txt", b"v1".to_vec());
        connector.set_content("a.txt", b"v2".to_vec());
        let source = Source::new("acct", ServiceKind::S3, "bucket");
        let fetched = connector.fetch(&source, "a.txt", 0, 2).await.unwrap();
        assert_eq!(fetched.data, b"v2");
    }
}
