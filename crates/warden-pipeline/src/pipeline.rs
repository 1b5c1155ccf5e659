//! `scan_chunk`: the eight-step per-chunk scan pipeline (spec §4.4).

use chrono::Utc;
use warden_classify::{is_phi, mask_finding, ClassifierPipeline};
use warden_connect::plan::{detect_csv_delimiter, detect_encoding};
use warden_connect::Connector;
use warden_core::{Chunk, ChunkKind, Finding, Source, Status};

use crate::hashing::{hash_chunk_body, hash_finding_content};
use crate::lease::LeaseBroker;

/// How a chunk's scan attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Scanned successfully; carries the findings ready for reporting and
    /// the chunk in its final `Scanned` state.
    Scanned { chunk: Chunk, findings: Vec<Finding> },
    /// Another agent already held the lease; this chunk is not this
    /// agent's problem this cycle.
    LeaseLost,
    /// Content could not be processed (corrupt archive, undecodable text);
    /// the chunk moves to `Failed` and siblings are unaffected.
    Failed { chunk: Chunk, reason: String },
}

/// Everything `scan_chunk` needs that isn't carried on the chunk itself.
pub struct PipelineCtx<'a> {
    pub connector: &'a dyn Connector,
    pub lease: &'a dyn LeaseBroker,
    pub classifiers: &'a ClassifierPipeline,
    pub source: &'a Source,
    pub object_name: &'a str,
}

/// Run the eight-step pipeline against `chunk`. Batching findings into
/// control-plane POSTs of up to [`warden_core::SENSITIVE_DATA_CHUNK`] and
/// the classification-group `last_scanned` bookkeeping (step 8 of §4.4)
/// happen one level up, where a whole classification job's chunks are
/// visible at once.
pub async fn scan_chunk(ctx: &PipelineCtx<'_>, mut chunk: Chunk) -> ScanOutcome {
    // Step 1: lease.
    if !ctx.lease.try_lease(chunk.id).await {
        return ScanOutcome::LeaseLost;
    }
    chunk.status = Status::InProgress;

    // Step 2: fetch, applying the overlap rule.
    let (offset, limit) = chunk.fetch_range();
    let fetched = match ctx.connector.fetch(ctx.source, &chunk.fetch_path, offset, limit).await {
        Ok(f) => f,
        Err(e) => {
            chunk.status = Status::Failed;
            return ScanOutcome::Failed { chunk, reason: e.to_string() };
        }
    };

    // Step 3: empty/invalid guard.
    let text = decode_chunk_text(&fetched.data);
    let chunk_hash = hash_chunk_body(&fetched.data);

    if text.trim().is_empty() {
        chunk.status = Status::Scanned;
        chunk.scanned_at = Some(Utc::now());
        chunk.hash = Some(chunk_hash);
        chunk.latest_data_type = Some(Utc::now());
        return ScanOutcome::Scanned { chunk, findings: Vec::new() };
    }

    // Step 4: PHI probe.
    chunk.is_phi = is_phi(ctx.object_name, &text);

    // Step 5: classify. Tabular chunks are scanned column-by-column so a
    // finding can be attributed to the column it came from; every other
    // kind is scanned as one undifferentiated block of text.
    let findings: Vec<Finding> = if chunk.kind == ChunkKind::Table {
        let columns = split_into_columns(&text);
        classify_columns(ctx.classifiers, &columns)
            .into_iter()
            .map(|mut f| {
                f.metadata_id = chunk.metadata_id;
                f.chunk_id = chunk.id;
                f
            })
            .collect()
    } else {
        ctx.classifiers
            .scan(&text)
            .into_iter()
            .map(|m| Finding {
                metadata_id: chunk.metadata_id,
                chunk_id: chunk.id,
                classifier_name: m.classifier_name.clone(),
                region: warden_classify::classify_region(&m.classifier_name).to_string(),
                score: m.score,
                masked_value: mask_finding(&m.classifier_name, &m.text),
                content_hash: hash_finding_content(&m.text),
                column: None,
            })
            .collect()
    };

    // Steps 6-7: reporting and finalisation. Reporting (the actual
    // control-plane POST, batched) happens in the caller; here we only
    // produce the finalised chunk state.
    chunk.status = Status::Scanned;
    chunk.scanned_at = Some(Utc::now());
    chunk.hash = Some(chunk_hash);
    chunk.latest_data_type = Some(Utc::now());

    ScanOutcome::Scanned { chunk, findings }
}

/// Scan tabular content column-by-column, concatenating each column's
/// string values with a space and attaching `column` to every finding
/// from that column (spec §4.4 step 5).
pub fn classify_columns(classifiers: &ClassifierPipeline, columns: &[(String, String)]) -> Vec<Finding> {
    columns
        .iter()
        .flat_map(|(column_name, joined_values)| {
            classifiers.scan(joined_values).into_iter().map(move |m| Finding {
                metadata_id: 0,
                chunk_id: 0,
                classifier_name: m.classifier_name.clone(),
                region: warden_classify::classify_region(&m.classifier_name).to_string(),
                score: m.score,
                masked_value: mask_finding(&m.classifier_name, &m.text),
                content_hash: hash_finding_content(&m.text),
                column: Some(column_name.clone()),
            })
        })
        .collect()
}

/// Decode chunk bytes the way they were actually encoded: valid UTF-8 is
/// used as-is, anything else falls back to a byte-for-codepoint Latin-1
/// decode rather than being discarded as empty (spec §4.2 encoding
/// detection).
fn decode_chunk_text(bytes: &[u8]) -> String {
    match detect_encoding(bytes) {
        "utf-8" => std::str::from_utf8(bytes).map(str::to_string).unwrap_or_default(),
        _ => bytes.iter().map(|b| *b as char).collect(),
    }
}

/// Split a table chunk's raw text into `(header, joined_values)` columns
/// using the sniffed CSV delimiter, so [`classify_columns`] can scan each
/// column independently (spec §4.4 step 5, §4.2 CSV delimiter detection).
fn split_into_columns(text: &str) -> Vec<(String, String)> {
    let delimiter = detect_csv_delimiter(text);
    let mut lines = text.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<&str> = header.split(delimiter).collect();
    let mut values: Vec<String> = vec![String::new(); headers.len()];
    for line in lines {
        for (i, value) in line.split(delimiter).enumerate() {
            if let Some(column) = values.get_mut(i) {
                if !column.is_empty() {
                    column.push(' ');
                }
                column.push_str(value);
            }
        }
    }
    headers.into_iter().map(str::to_string).zip(values).collect()
}
