//! End-to-end: walk a temp directory through discovery, tiling, leasing,
//! and classification, and check the findings that come back are masked
//! and scoped to what the fixture actually contains.

use std::sync::Mutex;

use async_trait::async_trait;
use warden_classify::{builtin_catalog, ClassifierPipeline};
use warden_connect::{Connector, LocalFsConnector};
use warden_core::{ServiceKind, Source};
use warden_pipeline::lease::LeaseBroker;
use warden_pipeline::pipeline::{scan_chunk, PipelineCtx, ScanOutcome};

struct AlwaysGrantLease {
    leased: Mutex<Vec<i64>>,
}

impl AlwaysGrantLease {
    fn new() -> Self {
        Self { leased: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl LeaseBroker for AlwaysGrantLease {
    async fn try_lease(&self, chunk_id: i64) -> bool {
        self.leased.lock().unwrap().push(chunk_id);
        true
    }

    async fn release(&self, _chunk_id: i64, _scanned_at: chrono::DateTime<chrono::Utc>, _hash: String) {}
}

#[tokio::test]
async fn scans_a_local_directory_and_masks_findings() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        dir.path().join("customers.txt"),
        "Contact: jane.doe@example.com, SSN 078-05-1120\n",
    )
    .await
    .unwrap();

    let connector = LocalFsConnector::new(dir.path());
    let source = Source::new("123456789012", ServiceKind::S3, "local-fixture");

    let objects = connector.discover(&source).await.unwrap();
    assert_eq!(objects.len(), 1);
    let object = &objects[0];
    assert_eq!(object.chunks.len(), 1);

    let classifiers = ClassifierPipeline::build(&builtin_catalog(), true).unwrap();
    let lease = AlwaysGrantLease::new();

    let ctx = PipelineCtx {
        connector: &connector,
        lease: &lease,
        classifiers: &classifiers,
        source: &source,
        object_name: &object.object_name,
    };

    let outcome = scan_chunk(&ctx, object.chunks[0].clone()).await;
    let ScanOutcome::Scanned { findings, chunk } = outcome else {
        panic!("expected a successful scan, got {outcome:?}");
    };

    assert!(!findings.is_empty(), "expected at least one finding in the fixture text");
    assert!(findings.iter().any(|f| f.classifier_name == "EMAIL_ADDRESS"));
    assert!(findings.iter().any(|f| f.classifier_name == "US_SSN"));
    for finding in &findings {
        assert_ne!(finding.masked_value, "jane.doe@example.com");
        assert_ne!(finding.masked_value, "078-05-1120");
    }
    assert_eq!(lease.leased.lock().unwrap().as_slice(), &[chunk.id]);
}

#[tokio::test]
async fn empty_file_scans_clean_without_touching_classifiers() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("empty.txt"), b"").await.unwrap();

    let connector = LocalFsConnector::new(dir.path());
    let source = Source::new("123456789012", ServiceKind::S3, "local-fixture");
    let objects = connector.discover(&source).await.unwrap();

    assert_eq!(objects.len(), 1);
    assert!(objects[0].chunks.is_empty(), "zero-size object should have no chunks to scan");
}
