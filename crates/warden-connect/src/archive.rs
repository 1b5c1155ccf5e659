//! Archive expansion (spec §4.2): recursive zip/tar inspection, uncompressed-size
//! accounting, and a free-disk guard before anything is written to the local
//! extraction cache. Disk checks are grounded in the teacher's
//! `disk_guardian::ensure_sufficient_space` (`sysinfo::Disks` + mount-point lookup).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sysinfo::Disks;

use crate::error::{ConnectError, ConnectResult};
use crate::plan::{archive_member_fetch_path, is_archive, ArchiveMember};

/// A file recovered from expanding an archive, ready to be tiled as its own
/// object. `fetch_path` is the on-disk extracted path (spec §4.2 "each inner
/// file becomes its own sequence of blob chunks whose `fetch_path` is the
/// on-disk extracted path").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMember {
    pub member: ArchiveMember,
    pub fetch_path: PathBuf,
}

impl ExtractedMember {
    /// The member's address within its parent archive, per
    /// [`archive_member_fetch_path`]'s `archive_path + "!" + member_name`
    /// convention.
    pub fn full_path(&self, archive_path: &str) -> String {
        archive_member_fetch_path(archive_path, &self.member)
    }
}

/// The cache directory an archive at `full_path` expands into, keyed the
/// way the spec requires so re-scans can detect an already-expanded tree.
pub fn cache_dir_for(cache_root: &Path, full_path: &str) -> PathBuf {
    let key = full_path.replace(['/', '\\'], "_");
    cache_root.join(format!("{key}_extracted_archive"))
}

/// Whether `dest`'s filesystem has `required_bytes` free, after expanding
/// `dest`'s parent to find the owning disk.
pub fn has_sufficient_disk(dest: &Path, required_bytes: u64) -> bool {
    let disks = Disks::new_with_refreshed_list();
    let owning = disks.iter().find(|disk| {
        dest.starts_with(disk.mount_point())
            || dest.parent().map(|p| p.starts_with(disk.mount_point())).unwrap_or(false)
    });
    match owning {
        Some(disk) => disk.available_space() >= required_bytes,
        // No disk matched (e.g. an in-memory tempfs in tests) — don't block
        // on a check we can't perform.
        None => true,
    }
}

fn extension_matches(name: &str, archive: bool) -> bool {
    if archive { is_archive(name) } else { false }
}

/// Sum of every member's uncompressed size, recursing into nested archives
/// so the whole tree is accounted for before any bytes are written (spec
/// §4.2 "uncompressed total (including nested archives) is computed before
/// extraction").
pub fn uncompressed_total(data: &[u8], object_name: &str) -> ConnectResult<u64> {
    match detect_kind(data, object_name) {
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(std::io::Cursor::new(data))
                .map_err(|e| ConnectError::Permanent(format!("corrupt zip {object_name}: {e}")))?;
            let mut total = 0u64;
            for i in 0..zip.len() {
                let mut entry = zip
                    .by_index(i)
                    .map_err(|e| ConnectError::Permanent(format!("corrupt zip entry in {object_name}: {e}")))?;
                if entry.is_dir() {
                    continue;
                }
                total += entry.size();
                if extension_matches(entry.name(), true) {
                    let mut nested = Vec::new();
                    entry.read_to_end(&mut nested).map_err(ConnectError::Io)?;
                    total += uncompressed_total(&nested, entry.name())?;
                }
            }
            Ok(total)
        }
        ArchiveKind::TarGz | ArchiveKind::Tar => {
            let reader: Box<dyn Read> = match detect_kind(data, object_name) {
                ArchiveKind::TarGz => Box::new(flate2::read::GzDecoder::new(data)),
                _ => Box::new(data),
            };
            let mut archive = tar::Archive::new(reader);
            let mut total = 0u64;
            let entries = archive
                .entries()
                .map_err(|e| ConnectError::Permanent(format!("corrupt tar {object_name}: {e}")))?;
            for entry in entries {
                let mut entry = entry.map_err(|e| ConnectError::Permanent(format!("corrupt tar entry in {object_name}: {e}")))?;
                if !entry.header().entry_type().is_file() {
                    continue;
                }
                total += entry.header().size().unwrap_or(0);
                let name = entry.path().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
                if extension_matches(&name, true) {
                    let mut nested = Vec::new();
                    entry.read_to_end(&mut nested).map_err(ConnectError::Io)?;
                    total += uncompressed_total(&nested, &name)?;
                }
            }
            Ok(total)
        }
        ArchiveKind::Unsupported => Ok(data.len() as u64),
    }
}

/// Expand `data` (the archive's bytes, named `object_name`) under `dest`,
/// recursing into nested archives on sight (spec §4.2 "nested archives are
/// unpacked on sight"). Returns every extracted leaf file.
pub fn expand(data: &[u8], object_name: &str, dest: &Path) -> ConnectResult<Vec<ExtractedMember>> {
    fs::create_dir_all(dest)?;
    match detect_kind(data, object_name) {
        ArchiveKind::Zip => expand_zip(data, object_name, dest),
        ArchiveKind::TarGz => {
            let decompressed = {
                let mut buf = Vec::new();
                flate2::read::GzDecoder::new(data).read_to_end(&mut buf).map_err(ConnectError::Io)?;
                buf
            };
            expand_tar(decompressed.as_slice(), object_name, dest)
        }
        ArchiveKind::Tar => expand_tar(data, object_name, dest),
        ArchiveKind::Unsupported => {
            // bz2/7z have no decoder wired in; fall back to writing the raw
            // bytes as a single extracted "member" so the object still gets
            // scanned as one opaque blob instead of silently vanishing.
            let path = dest.join(object_name);
            fs::write(&path, data)?;
            let member = ArchiveMember { name: object_name.to_string(), uncompressed_size: data.len() as u64 };
            Ok(vec![ExtractedMember { member, fetch_path: path }])
        }
    }
}

fn expand_zip(data: &[u8], object_name: &str, dest: &Path) -> ConnectResult<Vec<ExtractedMember>> {
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(data))
        .map_err(|e| ConnectError::Permanent(format!("corrupt zip {object_name}: {e}")))?;
    let mut members = Vec::new();
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| ConnectError::Permanent(format!("corrupt zip entry in {object_name}: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(ConnectError::Io)?;

        if extension_matches(&name, true) {
            let nested_dest = dest.join(format!("{name}_extracted_archive"));
            members.extend(expand(&bytes, &name, &nested_dest)?);
        } else {
            let out_path = dest.join(&name);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out_path, &bytes)?;
            let member = ArchiveMember { name, uncompressed_size: bytes.len() as u64 };
            members.push(ExtractedMember { member, fetch_path: out_path });
        }
    }
    Ok(members)
}

fn expand_tar<R: Read>(reader: R, object_name: &str, dest: &Path) -> ConnectResult<Vec<ExtractedMember>> {
    let mut archive = tar::Archive::new(reader);
    let mut members = Vec::new();
    let entries = archive
        .entries()
        .map_err(|e| ConnectError::Permanent(format!("corrupt tar {object_name}: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ConnectError::Permanent(format!("corrupt tar entry in {object_name}: {e}")))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(ConnectError::Io)?;

        if extension_matches(&name, true) {
            let nested_dest = dest.join(format!("{name}_extracted_archive"));
            members.extend(expand(&bytes, &name, &nested_dest)?);
        } else {
            let out_path = dest.join(&name);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out_path, &bytes)?;
            let member = ArchiveMember { name, uncompressed_size: bytes.len() as u64 };
            members.push(ExtractedMember { member, fetch_path: out_path });
        }
    }
    Ok(members)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    Unsupported,
}

/// Classify an archive by sniffing its leading bytes first, since a
/// `.tar*` file can actually be a zip (spec §4.2 "archive signature quirks
/// ... must be retried as zip").
fn detect_kind(data: &[u8], object_name: &str) -> ArchiveKind {
    if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
        return ArchiveKind::Zip;
    }
    let lower = object_name.to_ascii_lowercase();
    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
        ArchiveKind::TarGz
    } else if lower.ends_with(".tar") {
        ArchiveKind::Tar
    } else if lower.ends_with(".zip") {
        ArchiveKind::Zip
    } else {
        ArchiveKind::Unsupported
    }
}
