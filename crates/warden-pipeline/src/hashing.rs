//! Content hashing (spec §4.3, §4.4): MD5 for whole-chunk change
//! detection, SHA-384 for the per-finding content hash reported alongside
//! a masked value. Both are non-cryptographic uses — collision resistance
//! doesn't matter here, only cheap, stable fingerprints.

use md5::Md5;
use sha2::{Digest, Sha384};

pub fn hash_chunk_body(bytes: &[u8]) -> String {
    let digest = Md5::digest(bytes);
    hex::encode(digest)
}

pub fn hash_finding_content(text: &str) -> String {
    let digest = Sha384::digest(text.as_bytes());
    hex::encode(digest)
}
