//! Wires the control-plane client, connector, classifier pipeline, worker
//! pool and the two schedulers into the running agent (spec §4.5, §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use warden_classify::{builtin_catalog, ClassifierPipeline};
use warden_client::ControlPlaneClient;
use warden_connect::{Connector, LocalFsConnector};
use warden_core::{ClassifierKind, Source};
use warden_diff::diff_source;
use warden_pipeline::hashing::hash_chunk_body;
use warden_pipeline::lease::LeaseBroker;
use warden_pipeline::pipeline::{scan_chunk, PipelineCtx, ScanOutcome};
use warden_pool::WorkerPool;
use warden_scheduler::{run_periodic_job, BackgroundScheduler, ForegroundScheduler};

use crate::config::WardenConfig;
use crate::error::Result;

/// Default foreground tick: how often `detect_new_tasks` and
/// `rescan_by_data_type` are driven. Fixed at 15 minutes regardless of any
/// classification's own `scanning_period_minutes` (spec §9 open question,
/// decided in DESIGN.md).
const FOREGROUND_TICK: Duration = Duration::from_secs(15 * 60);
const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// [`LeaseBroker`] implemented over the control plane: a lease is a
/// conditional `WAIT_FOR_SCAN -> IN_PROGRESS` chunk status update (spec
/// §4.4 step 1).
pub struct ControlPlaneLeaseBroker {
    client: Arc<ControlPlaneClient>,
}

impl ControlPlaneLeaseBroker {
    pub fn new(client: Arc<ControlPlaneClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LeaseBroker for ControlPlaneLeaseBroker {
    async fn try_lease(&self, chunk_id: i64) -> bool {
        match self
            .client
            .lease_data_chunk(&json!({ "chunk_id": chunk_id, "status": "IN_PROGRESS" }))
            .await
        {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, chunk_id, "lease attempt failed");
                false
            }
        }
    }

    async fn release(&self, chunk_id: i64, scanned_at: chrono::DateTime<chrono::Utc>, hash: String) {
        let body = json!({
            "chunk_id": chunk_id,
            "status": "SCANNED",
            "scanned_at": scanned_at.to_rfc3339(),
            "latest_data_type": scanned_at.to_rfc3339(),
            "hash": hash,
        });
        if let Err(e) = self.client.update_data_chunks_batch(&json!([body])).await {
            warn!(error = %e, chunk_id, "failed to release chunk lease");
        }
    }
}

/// Everything the running agent needs, assembled once at startup.
pub struct Agent {
    pub scanner_id: String,
    pub client: Arc<ControlPlaneClient>,
    pub connector: Arc<dyn Connector>,
    pub classifiers: Arc<ClassifierPipeline>,
    pub catalog: Vec<warden_core::Classifier>,
    pub lease: Arc<ControlPlaneLeaseBroker>,
    pub pool: WorkerPool,
}

impl Agent {
    pub async fn bootstrap(config: &WardenConfig, scan_root: std::path::PathBuf) -> Result<Self> {
        let http = reqwest::Client::new();
        let scanner_id = crate::instance_id::resolve_scanner_id(&http, config.is_test_mode()).await?;
        info!(scanner_id = %scanner_id, "resolved scanner instance identity");

        let base_url = config
            .server_domain
            .clone()
            .unwrap_or_else(|| "https://api.example.invalid".to_string());
        let client = Arc::new(ControlPlaneClient::new(
            base_url,
            format!("{}/oauth/token", config.shared_secret.stack),
            config.shared_secret.tenant.clone(),
            config.shared_secret.secret.clone(),
        ));

        let connector: Arc<dyn Connector> = Arc::new(LocalFsConnector::new(scan_root));
        let catalog = builtin_catalog();
        let classifiers =
            Arc::new(ClassifierPipeline::build(&catalog, true).map_err(crate::error::WardenError::Classify)?);
        let lease = Arc::new(ControlPlaneLeaseBroker::new(client.clone()));
        let pool = if config.is_test_mode() {
            WorkerPool::test_mode()
        } else {
            WorkerPool::new(config.max_python_processes)
        };

        Ok(Self {
            scanner_id,
            client,
            connector,
            classifiers,
            catalog,
            lease,
            pool,
        })
    }

    /// Fetch the control plane's last-known object/chunk state for
    /// `source` (spec §4.2 step 0). Best-effort: an empty set stands in
    /// for "nothing recorded yet" or a response this agent can't parse,
    /// which the diff treats as every discovered object being new.
    async fn known_objects(&self, source: &Source) -> Vec<warden_core::ObjectRecord> {
        match self.client.file_metadata_filter(&source.canonical()).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, source = %source, "failed to fetch known object metadata, treating as empty");
                Vec::new()
            }
        }
    }

    /// Discover every object currently at `source`, tile it into chunks,
    /// and fetch+hash each chunk's current content so the diff engine can
    /// tell which chunks actually changed (spec §4.2-§4.3).
    async fn discover_and_hash(
        &self,
        source: &Source,
    ) -> Result<(Vec<warden_core::ObjectRecord>, HashMap<(String, u64), String>)> {
        let mut objects = self
            .connector
            .discover(source)
            .await
            .map_err(crate::error::WardenError::Connect)?;

        let kind = warden_connect::plan::chunk_kind_for_service(source.service.is_tabular(), source.service.is_document());

        let mut new_hashes = HashMap::new();
        for object in &mut objects {
            object.chunks = warden_connect::plan::tile_object(object, kind);
            for chunk in &object.chunks {
                let (fetch_offset, fetch_limit) = chunk.fetch_range();
                let range = self
                    .connector
                    .fetch(source, &object.fetch_path, fetch_offset, fetch_limit)
                    .await
                    .map_err(crate::error::WardenError::Connect)?;
                new_hashes.insert((object.full_path.clone(), chunk.offset), hash_chunk_body(&range.data));
            }
        }

        Ok((objects, new_hashes))
    }

    /// Push a diff's object and chunk mutations to the control plane.
    /// Content-change updates are not pushed here: the chunk's hash is
    /// only settled once it is actually rescanned, via
    /// [`ControlPlaneLeaseBroker::release`].
    async fn apply_mutations(&self, diff: &warden_diff::SourceDiff) {
        for mutation in &diff.object_mutations {
            use warden_diff::ObjectMutation::*;
            let (full_path, result) = match mutation {
                Delete { full_path } => (full_path, self.client.delete_batch_metadata(&[full_path.clone()]).await),
                SetSize { full_path, size } => (
                    full_path,
                    self.client.batch_file_metadata(&json!([{ "full_path": full_path, "size": size }])).await,
                ),
                Ignore { full_path } => (
                    full_path,
                    self.client.batch_file_metadata(&json!([{ "full_path": full_path, "status": "IGNORED" }])).await,
                ),
                Unignore { full_path } => {
                    (full_path, self.client.un_ignore_file_metadata(&json!({ "full_path": full_path })).await)
                }
                InsertIgnored { full_path, object_name } => (
                    full_path,
                    self.client
                        .batch_file_metadata(&json!([{
                            "full_path": full_path,
                            "object_name": object_name,
                            "status": "IGNORED",
                        }]))
                        .await,
                ),
            };
            if let Err(e) = result {
                warn!(error = %e, full_path, "failed to apply object mutation");
            }
        }

        let created: Vec<_> = diff
            .chunk_mutations
            .iter()
            .filter_map(|m| match m {
                warden_diff::ChunkMutation::Create { chunk } => Some(chunk),
                _ => None,
            })
            .collect();
        if !created.is_empty() {
            if let Err(e) = self.client.create_data_chunks_batch(&json!(created)).await {
                warn!(error = %e, count = created.len(), "failed to record newly discovered chunks");
            }
        }
    }

    /// Reconcile `source` against the control plane's known state and
    /// drain the resulting work queue through the scan pipeline (spec
    /// §4.2-§4.4).
    pub async fn reconcile_and_scan(&self, source: &Source) -> Result<Vec<ScanOutcome>> {
        let known = self.known_objects(source).await;
        let (discovered, new_hashes) = self.discover_and_hash(source).await?;

        let filename_classifiers: Vec<_> =
            self.catalog.iter().filter(|c| c.kind == ClassifierKind::Filename).cloned().collect();

        let diff = diff_source(&known, &discovered, &new_hashes, &filename_classifiers, &filename_classifiers, None);
        self.apply_mutations(&diff).await;

        if diff.work_queue.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes = self.scan_queue(diff.work_queue, self.classifiers.clone(), source.clone()).await;
        self.release_scanned(&outcomes).await;

        Ok(outcomes)
    }

    /// Drain `chunks` through the scan pipeline against `classifiers` (spec
    /// §4.4 steps 2-5). Shared by [`Agent::reconcile_and_scan`] and
    /// [`Agent::rescan_by_data_type`], which differ only in where the work
    /// queue comes from and whether NER runs.
    async fn scan_queue(
        &self,
        chunks: Vec<warden_core::Chunk>,
        classifiers: Arc<ClassifierPipeline>,
        source: Source,
    ) -> Vec<ScanOutcome> {
        let connector = self.connector.clone();
        let lease = self.lease.clone();

        self.pool
            .drain(chunks, move |chunk| {
                let connector = connector.clone();
                let lease = lease.clone();
                let classifiers = classifiers.clone();
                let source = source.clone();
                async move {
                    let object_name = chunk.full_path.clone();
                    let ctx = PipelineCtx {
                        connector: connector.as_ref(),
                        lease: lease.as_ref(),
                        classifiers: classifiers.as_ref(),
                        source: &source,
                        object_name: &object_name,
                    };
                    scan_chunk(&ctx, chunk).await
                }
            })
            .await
    }

    /// Select `SCANNED` chunks whose findings predate the current
    /// classifier catalog and re-run them with NER disabled (spec §4.5
    /// `rescan_by_data_type`): NER is expensive and its output doesn't
    /// change with catalog revisions, so a rescan only needs the
    /// regex/mass-regex/backtrack engines to pick up newly added or
    /// changed patterns.
    ///
    /// Rescan candidates come back from a single control-plane filter with
    /// no source attached (`GET rescan/data-chunks/filter`), so this reuses
    /// the first registered source as the connector context; every source
    /// in a deployment shares the same underlying connector, so which one
    /// is used for the fetch call has no effect on the bytes returned.
    pub async fn rescan_by_data_type(&self, sources: &[Source]) -> Result<Vec<ScanOutcome>> {
        let Some(source) = sources.first() else {
            return Ok(Vec::new());
        };

        let mut candidates: Vec<warden_core::Chunk> = match self
            .client
            .rescan_candidate_chunks(warden_classify::CATALOG_VERSION)
            .await
        {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to fetch rescan candidates");
                Vec::new()
            }
        };

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Re-enter the lease cycle via the documented `Scanned ->
        // RescanInProgress -> WaitForScan` path rather than jumping
        // straight from Scanned to WaitForScan.
        for chunk in &mut candidates {
            chunk.status = warden_core::Status::RescanInProgress;
            chunk.status = warden_core::Status::WaitForScan;
        }

        let rescan_classifiers = Arc::new(
            ClassifierPipeline::build(&self.catalog, false).map_err(crate::error::WardenError::Classify)?,
        );

        let outcomes = self.scan_queue(candidates, rescan_classifiers, source.clone()).await;
        self.release_scanned(&outcomes).await;

        Ok(outcomes)
    }

    /// Persist every `Scanned` outcome's `IN_PROGRESS -> SCANNED`
    /// transition to the control plane (spec §4.4 step 7, §8 invariant 5).
    /// Without this the chunk stays leased `IN_PROGRESS` forever server-side
    /// even though this agent is done with it.
    async fn release_scanned(&self, outcomes: &[ScanOutcome]) {
        for outcome in outcomes {
            if let ScanOutcome::Scanned { chunk, .. } = outcome {
                let (Some(scanned_at), Some(hash)) = (chunk.scanned_at, chunk.hash.clone()) else {
                    continue;
                };
                self.lease.release(chunk.id, scanned_at, hash).await;
            }
        }
    }

    /// Send findings for every successfully scanned chunk up to the
    /// control plane (spec §4.4 step 6).
    pub async fn report(&self, outcomes: &[ScanOutcome]) {
        for outcome in outcomes {
            if let ScanOutcome::Scanned { chunk, findings } = outcome {
                if findings.is_empty() {
                    continue;
                }
                let body = json!({
                    "chunk_id": chunk.id,
                    "findings": findings,
                });
                if let Err(e) = self.client.report_sensitive_data(&body).await {
                    error!(error = %e, chunk_id = chunk.id, "failed to report findings");
                }
            }
        }
    }

    /// Record that `classification_id`'s scan just completed (spec §4.5):
    /// the classification group's `last_scanned` timestamp drives its own
    /// `scanning_period_minutes` cadence, independent of the fixed
    /// foreground tick.
    async fn mark_classification_scanned(&self, classification_id: i64) {
        let body = json!({
            "classification_id": classification_id,
            "last_scanned": chrono::Utc::now().to_rfc3339(),
        });
        if let Err(e) = self.client.update_data_classification_last_scanned(&body).await {
            warn!(error = %e, classification_id, "failed to update classification last_scanned");
        }
    }
}

/// Run both schedulers until `shutdown` fires (spec §4.5). `sources`
/// drives the per-tick scan: in a full deployment this would be pulled
/// from the control plane's classification/source registry instead of a
/// fixed list.
pub async fn run_agent(
    agent: Arc<Agent>,
    sources: Vec<Source>,
    shutdown_fg: warden_scheduler::Shutdown,
    shutdown_bg: warden_scheduler::Shutdown,
) {
    let mut foreground = ForegroundScheduler::new();
    for source in &sources {
        foreground.register_if_absent(source.canonical());
    }

    let fg_agent = agent.clone();
    let fg_sources = sources.clone();
    let detect_new_tasks = move || {
        let agent = fg_agent.clone();
        let sources = fg_sources.clone();
        async move {
            for source in &sources {
                match agent.reconcile_and_scan(source).await {
                    Ok(outcomes) => agent.report(&outcomes).await,
                    Err(e) => error!(error = %e, source = %source, "scan failed"),
                }
            }
        }
    };

    let rescan_agent = agent.clone();
    let rescan_sources = sources.clone();
    let rescan_by_data_type = move || {
        let agent = rescan_agent.clone();
        let sources = rescan_sources.clone();
        async move {
            match agent.rescan_by_data_type(&sources).await {
                Ok(outcomes) => agent.report(&outcomes).await,
                Err(e) => error!(error = %e, "rescan_by_data_type failed"),
            }
        }
    };

    let heartbeat_agent = agent.clone();
    let heartbeat = move || {
        let agent = heartbeat_agent.clone();
        async move {
            if let Err(e) = agent
                .client
                .heartbeat_scanner(&json!({ "scanner_id": agent.scanner_id }))
                .await
            {
                warn!(error = %e, "heartbeat failed");
            }
        }
    };

    let background = tokio::spawn(BackgroundScheduler::run(HEARTBEAT_PERIOD, heartbeat, shutdown_bg));

    foreground
        .run(FOREGROUND_TICK, detect_new_tasks, rescan_by_data_type, shutdown_fg)
        .await;

    let _ = background.await;
}

/// Drive a single classification's rescan job on its own period, used by
/// callers that register per-classification work after startup (spec
/// §4.5).
pub async fn spawn_classification_job(
    period: Duration,
    shutdown: warden_scheduler::Shutdown,
    agent: Arc<Agent>,
    source: Source,
    classification_id: i64,
) {
    run_periodic_job(period, shutdown, move || {
        let agent = agent.clone();
        let source = source.clone();
        async move {
            match agent.reconcile_and_scan(&source).await {
                Ok(outcomes) => {
                    agent.report(&outcomes).await;
                    agent.mark_classification_scanned(classification_id).await;
                }
                Err(e) => error!(error = %e, source = %source, "classification scan failed"),
            }
            period
        }
    })
    .await;
}
