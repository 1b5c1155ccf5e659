//! Gzip JSON request bodies (spec §4.7: POST/PUT/PATCH bodies are gzipped
//! JSON with `Accept-Encoding: gzip`).

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ClientResult;

pub fn gzip_json(value: &serde_json::Value) -> ClientResult<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).expect("writing to an in-memory buffer cannot fail");
    Ok(encoder.finish().expect("finishing an in-memory gzip stream cannot fail"))
}
