//! Local filesystem connector: walks a root directory and tiles each file
//! as a blob object. Grounded in the teacher's `LocalBackend` shape, rebuilt
//! against the `Connector` capability boundary instead of `Backend`'s
//! POSIX-style stat/list/read surface.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use warden_core::{ChunkKind, ObjectRecord, Ownership, Source, Status};

use crate::archive::{cache_dir_for, expand, has_sufficient_disk, uncompressed_total};
use crate::connector::{Connector, FetchedRange};
use crate::error::{ConnectError, ConnectResult};
use crate::plan::{is_archive, needs_text_size_substitution, tile_object};

/// Connector over a local directory tree, used by tests and by the `TEST`
/// run mode in place of a live cloud connector (spec §1 run modes).
#[derive(Debug, Clone)]
pub struct LocalFsConnector {
    root: PathBuf,
    /// `UPLOADED_FILES_FOLDER`: where archives are expanded (spec §6).
    /// Defaults to a sibling of `root` when not set explicitly.
    cache_root: PathBuf,
}

impl LocalFsConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let cache_root = std::env::temp_dir().join("wardenscan_uploaded_files");
        Self { root: root.into(), cache_root }
    }

    pub fn with_cache_root(root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache_root: cache_root.into() }
    }

    fn resolve(&self, fetch_path: &str) -> PathBuf {
        self.root.join(fetch_path)
    }

    async fn walk(&self, dir: &Path, out: &mut Vec<ObjectRecord>) -> ConnectResult<()> {
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                Box::pin(self.walk(&path, out)).await?;
                continue;
            }
            if !file_type.is_file() {
                continue;
            }
            let meta = entry.metadata().await?;
            let relative = path
                .strip_prefix(&self.root)
                .map_err(|_| ConnectError::Config(format!("{path:?} escaped connector root")))?
                .to_string_lossy()
                .replace('\\', "/");
            let object_name = relative.rsplit('/').next().unwrap_or(&relative).to_string();
            let size = effective_size(&path, meta.len()).await?;
            let modified: DateTime<Utc> = meta.modified().ok().map(DateTime::from).unwrap_or_else(Utc::now);
            let mut record = ObjectRecord {
                metadata_id: 0,
                full_path: relative.clone(),
                fetch_path: relative,
                object_name,
                etag: format!("{}:{}", meta.len(), modified.timestamp()),
                size,
                ownership: Ownership::default(),
                created_at: modified,
                updated_at: modified,
                labels: vec![],
                status: Status::WaitForScan,
                is_phi: false,
                chunks: vec![],
            };

            if is_archive(&record.object_name) {
                self.expand_archive_into(&path, &mut record, out).await?;
            } else {
                record.chunks = tile_object(&record, ChunkKind::Blob);
                record.recompute_status();
            }
            out.push(record);
        }
        Ok(())
    }

    /// Expand an archive object in place: the archive's own record ends up
    /// with zero chunks (it isn't itself scanned), and one record per
    /// extracted member is pushed onto `out` (spec §4.2 archive handling).
    async fn expand_archive_into(&self, path: &Path, record: &mut ObjectRecord, out: &mut Vec<ObjectRecord>) -> ConnectResult<()> {
        let data = fs::read(path).await?;
        let dest = cache_dir_for(&self.cache_root, &record.full_path);

        let required = uncompressed_total(&data, &record.object_name)?;
        if !has_sufficient_disk(&dest, required) {
            record.status = Status::Skipped;
            record.chunks = Vec::new();
            return Ok(());
        }

        let members = expand(&data, &record.object_name, &dest)?;
        record.chunks = Vec::new();
        record.recompute_status();

        for member in members {
            let member_full_path = member.full_path(&record.full_path);
            let member_fetch_path = member.fetch_path.to_string_lossy().replace('\\', "/");
            let member_name = &member.member.name;
            let member_object_name = member_name.rsplit('/').next().unwrap_or(member_name).to_string();
            let mut member_record = ObjectRecord {
                metadata_id: 0,
                full_path: member_full_path,
                fetch_path: member_fetch_path,
                object_name: member_object_name,
                etag: format!("{}:{}", record.etag, member.member.uncompressed_size),
                size: member.member.uncompressed_size,
                ownership: Ownership::default(),
                created_at: record.created_at,
                updated_at: record.updated_at,
                labels: vec![],
                status: Status::WaitForScan,
                is_phi: false,
                chunks: vec![],
            };
            member_record.chunks = tile_object(&member_record, ChunkKind::Blob);
            member_record.recompute_status();
            out.push(member_record);
        }
        Ok(())
    }
}

/// Gzip stores the uncompressed size (mod 2^32) in its final four bytes, so
/// a container's logical size can be read without decompressing the body
/// (spec §4.2 "container-format text-size substitution").
fn gzip_uncompressed_size(bytes: &[u8]) -> Option<u64> {
    if bytes.len() < 4 {
        return None;
    }
    let tail = &bytes[bytes.len() - 4..];
    Some(u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]) as u64)
}

async fn effective_size(path: &Path, on_disk_size: u64) -> ConnectResult<u64> {
    let name = path.to_string_lossy();
    if needs_text_size_substitution(&name) {
        let bytes = fs::read(path).await?;
        Ok(gzip_uncompressed_size(&bytes).unwrap_or(on_disk_size))
    } else {
        Ok(on_disk_size)
    }
}

#[async_trait]
impl Connector for LocalFsConnector {
    async fn discover(&self, _source: &Source) -> ConnectResult<Vec<ObjectRecord>> {
        let mut out = Vec::new();
        self.walk(&self.root, &mut out).await?;
        Ok(out)
    }

    async fn fetch(&self, _source: &Source, fetch_path: &str, offset: u64, limit: u64) -> ConnectResult<FetchedRange> {
        use tokio::io::{AsyncReadExt, AsyncSeekExt};

        let path = self.resolve(fetch_path);
        let mut file = fs::File::open(&path)
            .await
            .map_err(|e| if e.kind() == std::io::ErrorKind::NotFound {
                ConnectError::NotFound(fetch_path.to_string())
            } else {
                ConnectError::Io(e)
            })?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;
        let mut buf = vec![0u8; limit as usize];
        let read = file.read(&mut buf).await?;
        buf.truncate(read);
        Ok(FetchedRange { data: buf, expanded: false })
    }

    fn source_configuration(&self) -> serde_json::Value {
        serde_json::json!({ "root": self.root.to_string_lossy() })
    }
}
