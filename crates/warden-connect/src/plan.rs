//! Chunk-plan math: pure functions a connector (or a test) calls to decide
//! how an object's content is tiled, without needing a live connection.

use warden_core::{Chunk, ChunkKind, ObjectRecord};

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "bz2", "7z"];

/// Extensions that never produce chunks: an object ending in one of these
/// goes straight to `SCANNED` with zero chunks (spec §4.2, §8).
const UNSUPPORTED_EXTENSIONS: &[&str] =
    &["png", "jpg", "gif", "bmp", "svg", "tif", "tiff", "ico", "mbox", "webm"];

/// Extensions whose container format wraps a single payload whose
/// *uncompressed* size, not the file's on-disk size, should drive chunk
/// tiling (spec §4.2 "container-format text-size substitution").
const TEXT_CONTAINER_EXTENSIONS: &[&str] = &["gz", "bz2"];

fn extension_of(object_name: &str) -> Option<&str> {
    object_name.rsplit('.').next().filter(|ext| *ext != object_name)
}

pub fn is_archive(object_name: &str) -> bool {
    extension_of(object_name)
        .map(|ext| ARCHIVE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether `object_name`'s extension is one that never needs chunking
/// (binary image/video formats, mailbox dumps).
pub fn is_unsupported_extension(object_name: &str) -> bool {
    extension_of(object_name)
        .map(|ext| UNSUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether `object_name`'s on-disk size should be replaced by an
/// uncompressed size when planning chunks.
pub fn needs_text_size_substitution(object_name: &str) -> bool {
    extension_of(object_name)
        .map(|ext| TEXT_CONTAINER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// The chunk kind a row/document-oriented service always uses, overriding
/// whatever `ChunkKind` an extension-based guess would pick.
pub fn chunk_kind_for_service(is_tabular: bool, is_document: bool) -> ChunkKind {
    if is_tabular {
        ChunkKind::Table
    } else if is_document {
        ChunkKind::Document
    } else {
        ChunkKind::Blob
    }
}

/// An archive's member entries, expanded into virtual chunk-planning units.
/// Each member is tiled independently as if it were its own blob object;
/// the scan pipeline addresses members by `archive_path + "!" + member_name`
/// (a convention borrowed from zip-in-zip tooling).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub name: String,
    pub uncompressed_size: u64,
}

pub fn archive_member_fetch_path(archive_path: &str, member: &ArchiveMember) -> String {
    format!("{archive_path}!{}", member.name)
}

/// Tile a freshly-discovered object into its chunk set under `kind`'s
/// limit, using [`warden_core::chunk::tile_offsets`] for the offset math.
pub fn tile_object(record: &ObjectRecord, kind: ChunkKind) -> Vec<Chunk> {
    if is_unsupported_extension(&record.object_name) {
        return Vec::new();
    }
    warden_core::chunk::tile_offsets(record.size, kind)
        .into_iter()
        .map(|offset| Chunk::new(record.metadata_id, &record.full_path, &record.fetch_path, kind, offset))
        .collect()
}

/// Sniff a CSV delimiter from a sample line: prefer comma, but fall back to
/// semicolon, tab, or pipe if they appear more often (spec §4.2 "CSV
/// delimiter detection").
pub fn detect_csv_delimiter(sample: &str) -> char {
    let candidates = [',', ';', '\t', '|'];
    let first_line = sample.lines().next().unwrap_or(sample);
    candidates
        .into_iter()
        .max_by_key(|c| first_line.matches(*c).count())
        .filter(|c| first_line.contains(*c))
        .unwrap_or(',')
}

/// Cheap encoding sniff: valid UTF-8 stays UTF-8, otherwise fall back to
/// Latin-1 (spec §4.2 "encoding detection" — a full charset detector is out
/// of scope; this covers the two encodings the original's fixtures use).
pub fn detect_encoding(bytes: &[u8]) -> &'static str {
    if std::str::from_utf8(bytes).is_ok() {
        "utf-8"
    } else {
        "latin-1"
    }
}
