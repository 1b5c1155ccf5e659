//! Source reconciliation: the eight-step algorithm from the chunk state
//! machine (tombstone sweep → chunk tombstone → size reconciliation →
//! content diff → ignore/un-ignore → filename inclusion →
//! classification-scoped filter → already-scanned pruning).

use std::collections::{HashMap, HashSet};

use regex::Regex;
use warden_core::{Chunk, Classifier, ClassifierCategory, ClassifierKind, ObjectRecord, Status};

use crate::mutation::{ChunkMutation, ObjectMutation, SourceDiff};

fn compile_filename_patterns(classifiers: &[Classifier]) -> Vec<Regex> {
    classifiers
        .iter()
        .filter(|c| c.kind == ClassifierKind::Filename)
        .flat_map(|c| c.patterns.iter())
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Reconcile `discovered` objects (`D`) against `known` objects already
/// recorded for this `(account, source)` (`S`).
///
/// `new_hashes` carries the freshly computed content hash for every
/// discovered chunk that survived the tombstone sweeps, keyed by
/// `(full_path, offset)` — fetching and hashing bytes is the caller's job
/// (it needs a live connector); this function only decides what the hashes
/// imply.
pub fn diff_source(
    known: &[ObjectRecord],
    discovered: &[ObjectRecord],
    new_hashes: &HashMap<(String, u64), String>,
    exclude_filename: &[Classifier],
    include_filename: &[Classifier],
    scoped_objects: Option<&[String]>,
) -> SourceDiff {
    let mut diff = SourceDiff::default();

    let known_by_path: HashMap<&str, &ObjectRecord> =
        known.iter().map(|o| (o.full_path.as_str(), o)).collect();
    let discovered_by_path: HashMap<&str, &ObjectRecord> =
        discovered.iter().map(|o| (o.full_path.as_str(), o)).collect();

    // Step 1: tombstone sweep. S \ D.
    for known_obj in known {
        if !discovered_by_path.contains_key(known_obj.full_path.as_str()) {
            diff.object_mutations.push(ObjectMutation::Delete {
                full_path: known_obj.full_path.clone(),
            });
        }
    }

    let exclude_patterns = compile_filename_patterns(
        &exclude_filename.iter().filter(|c| c.category == ClassifierCategory::Exclude).cloned().collect::<Vec<_>>(),
    );
    let include_patterns = compile_filename_patterns(
        &include_filename.iter().filter(|c| c.category == ClassifierCategory::Include).cloned().collect::<Vec<_>>(),
    );

    let mut work_queue: Vec<Chunk> = Vec::new();

    // Steps 2-4 run per object present in S ∩ D, steps 5-6 run per object
    // in D regardless of whether it was previously known.
    for discovered_obj in discovered {
        let known_obj = known_by_path.get(discovered_obj.full_path.as_str()).copied();

        if let Some(known_obj) = known_obj {
            // Step 2: chunk tombstone sweep.
            let discovered_offsets: HashSet<u64> = discovered_obj.chunks.iter().map(|c| c.offset).collect();
            for known_chunk in &known_obj.chunks {
                if !discovered_offsets.contains(&known_chunk.offset) {
                    diff.chunk_mutations.push(ChunkMutation::Delete {
                        full_path: known_obj.full_path.clone(),
                        offset: known_chunk.offset,
                    });
                }
            }

            // Step 3: size reconciliation.
            if known_obj.size != discovered_obj.size {
                diff.object_mutations.push(ObjectMutation::SetSize {
                    full_path: discovered_obj.full_path.clone(),
                    size: discovered_obj.size,
                });
            }
        }

        // Step 5: ignore / un-ignore, evaluated on the discovered name.
        let is_excluded = matches_any(&exclude_patterns, &discovered_obj.object_name);
        let was_known_and_ignored = known_obj.map(|o| o.status == Status::Ignored).unwrap_or(false);

        if is_excluded {
            if known_obj.is_some() && !was_known_and_ignored {
                diff.object_mutations.push(ObjectMutation::Ignore {
                    full_path: discovered_obj.full_path.clone(),
                });
            } else if known_obj.is_none() {
                diff.object_mutations.push(ObjectMutation::InsertIgnored {
                    full_path: discovered_obj.full_path.clone(),
                    object_name: discovered_obj.object_name.clone(),
                });
            }
            continue;
        } else if was_known_and_ignored {
            diff.object_mutations.push(ObjectMutation::Unignore {
                full_path: discovered_obj.full_path.clone(),
            });
            continue;
        }

        // Step 6: filename inclusion — when at least one INCLUDE/FILENAME
        // classifier is configured, only matching objects proceed.
        if !include_patterns.is_empty() && !matches_any(&include_patterns, &discovered_obj.object_name) {
            continue;
        }

        // Step 7: classification-scoped filter.
        if let Some(scoped) = scoped_objects {
            if !scoped.is_empty() && !scoped.iter().any(|s| s == &discovered_obj.full_path) {
                continue;
            }
        }

        // Step 4: content-change diff, restricted to chunks that survived
        // the tombstone sweep (i.e. every chunk currently in `discovered`).
        let known_chunks_by_offset: HashMap<u64, &Chunk> =
            known_obj.map(|o| o.chunks.iter().map(|c| (c.offset, c)).collect()).unwrap_or_default();

        for discovered_chunk in &discovered_obj.chunks {
            let key = (discovered_obj.full_path.clone(), discovered_chunk.offset);
            let Some(new_hash) = new_hashes.get(&key) else {
                // No fresh hash computed yet for this chunk this round
                // (e.g. archive member not yet re-expanded); leave as-is.
                continue;
            };

            match known_chunks_by_offset.get(&discovered_chunk.offset) {
                Some(existing) if existing.hash.as_deref() != Some(new_hash.as_str()) => {
                    diff.chunk_mutations.push(ChunkMutation::Update {
                        full_path: discovered_obj.full_path.clone(),
                        offset: discovered_chunk.offset,
                        new_hash: new_hash.clone(),
                    });
                    let mut requeued = (*existing).clone();
                    requeued.hash = None;
                    requeued.scanned_at = None;
                    requeued.instance_id = None;
                    requeued.status = Status::WaitForScan;
                    work_queue.push(requeued);
                }
                Some(_) => {
                    // Hash unchanged: no mutation, chunk stays as recorded.
                }
                None => {
                    let mut created = discovered_chunk.clone();
                    created.status = Status::WaitForScan;
                    diff.chunk_mutations.push(ChunkMutation::Create { chunk: created.clone() });
                    work_queue.push(created);
                }
            }
        }
    }

    // Step 8: already-scanned pruning. `work_queue` at this point only
    // ever holds chunks step 4 just created or requeued because their
    // content hash genuinely differs from what's on record — a chunk
    // whose hash matched never left the `Some(_) => {}` arm above and so
    // never reached the queue to begin with. Those two arms are the only
    // producers, so nothing further is eligible for pruning here: an
    // already-scanned object with an unchanged etag and unchanged chunk
    // hashes is pruned implicitly, by never being queued in the first
    // place, not by filtering it back out afterwards.
    diff.work_queue = work_queue;
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{ChunkKind, Ownership};

    fn object(full_path: &str, size: u64, etag: &str, status: Status, chunks: Vec<Chunk>) -> ObjectRecord {
        ObjectRecord {
            metadata_id: 1,
            full_path: full_path.into(),
            fetch_path: full_path.into(),
            object_name: full_path.rsplit('/').next().unwrap_or(full_path).to_string(),
            etag: etag.into(),
            size,
            ownership: Ownership::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            labels: vec![],
            status,
            is_phi: false,
            chunks,
        }
    }

    fn chunk(full_path: &str, offset: u64, hash: Option<&str>, status: Status) -> Chunk {
        let mut c = Chunk::new(1, full_path, full_path, ChunkKind::Blob, offset);
        c.hash = hash.map(|h| h.to_string());
        c.status = status;
        c
    }

    #[test]
    fn deleted_object_is_tombstoned() {
        let known = vec![object("a.txt", 10, "e1", Status::Scanned, vec![])];
        let diff = diff_source(&known, &[], &HashMap::new(), &[], &[], None);
        assert_eq!(diff.object_mutations, vec![ObjectMutation::Delete { full_path: "a.txt".into() }]);
    }

    #[test]
    fn vanished_chunk_is_tombstoned() {
        let known_chunk = chunk("a.txt", 0, Some("h1"), Status::Scanned);
        let known = vec![object("a.txt", 10, "e1", Status::Scanned, vec![known_chunk])];
        let discovered = vec![object("a.txt", 0, "e1", Status::WaitForScan, vec![])];
        let diff = diff_source(&known, &discovered, &HashMap::new(), &[], &[], None);
        assert!(diff.chunk_mutations.contains(&ChunkMutation::Delete { full_path: "a.txt".into(), offset: 0 }));
    }

    #[test]
    fn size_change_is_reconciled() {
        let known = vec![object("a.txt", 10, "e1", Status::Scanned, vec![])];
        let discovered = vec![object("a.txt", 20, "e2", Status::WaitForScan, vec![])];
        let diff = diff_source(&known, &discovered, &HashMap::new(), &[], &[], None);
        assert!(diff.object_mutations.contains(&ObjectMutation::SetSize { full_path: "a.txt".into(), size: 20 }));
    }

    #[test]
    fn changed_hash_requeues_chunk() {
        let known_chunk = chunk("a.txt", 0, Some("old"), Status::Scanned);
        let discovered_chunk = chunk("a.txt", 0, None, Status::WaitForScan);
        let known = vec![object("a.txt", 10, "e1", Status::Scanned, vec![known_chunk])];
        let discovered = vec![object("a.txt", 10, "e1", Status::Scanned, vec![discovered_chunk])];
        let mut hashes = HashMap::new();
        hashes.insert(("a.txt".to_string(), 0), "new".to_string());

        let diff = diff_source(&known, &discovered, &hashes, &[], &[], None);
        assert_eq!(diff.work_queue.len(), 1);
        assert_eq!(diff.work_queue[0].status, Status::WaitForScan);
    }

    #[test]
    fn new_offset_creates_chunk() {
        let discovered_chunk = chunk("a.txt", 0, None, Status::WaitForScan);
        let discovered = vec![object("a.txt", 10, "e1", Status::WaitForScan, vec![discovered_chunk])];
        let mut hashes = HashMap::new();
        hashes.insert(("a.txt".to_string(), 0), "h".to_string());

        let diff = diff_source(&[], &discovered, &hashes, &[], &[], None);
        assert_eq!(diff.work_queue.len(), 1);
        assert!(matches!(diff.chunk_mutations[0], ChunkMutation::Create { .. }));
    }

    #[test]
    fn unchanged_chunk_on_scanned_object_stays_out_of_work_queue() {
        let known_chunk = chunk("a.txt", 0, Some("h"), Status::Scanned);
        let discovered_chunk = chunk("a.txt", 0, None, Status::WaitForScan);
        let known = vec![object("a.txt", 10, "e1", Status::Scanned, vec![known_chunk])];
        let discovered = vec![object("a.txt", 10, "e1", Status::Scanned, vec![discovered_chunk])];
        let mut hashes = HashMap::new();
        hashes.insert(("a.txt".to_string(), 0), "h".to_string());

        let diff = diff_source(&known, &discovered, &hashes, &[], &[], None);
        assert!(diff.work_queue.is_empty());
        assert!(diff.chunk_mutations.is_empty());
    }

    #[test]
    fn new_chunk_on_an_otherwise_scanned_object_is_still_queued() {
        // The object's etag hasn't moved and its aggregate status is
        // still `Scanned`, but a chunk offset with no prior record
        // appeared (e.g. the tiling rules changed) — it must still be
        // scanned, not silently dropped for looking like "already done".
        let discovered_chunk = chunk("a.txt", 0, None, Status::WaitForScan);
        let known = vec![object("a.txt", 10, "e1", Status::Scanned, vec![])];
        let discovered = vec![object("a.txt", 10, "e1", Status::Scanned, vec![discovered_chunk])];
        let mut hashes = HashMap::new();
        hashes.insert(("a.txt".to_string(), 0), "h".to_string());

        let diff = diff_source(&known, &discovered, &hashes, &[], &[], None);
        assert_eq!(diff.work_queue.len(), 1);
        assert!(matches!(diff.chunk_mutations[0], ChunkMutation::Create { .. }));
    }
}
