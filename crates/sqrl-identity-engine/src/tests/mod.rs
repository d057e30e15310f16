use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::codec::{HEADER, IdentityCodec};
use crate::models::Document;
use crate::schema::BuiltinSchemaSource;

/// Codec over the bundled schemas
pub fn test_codec() -> IdentityCodec<BuiltinSchemaSource> {
    IdentityCodec::builtin().unwrap()
}

/// A framed block: little-endian length and type, then the payload
pub fn block_bytes(block_type: u16, payload: &[u8]) -> Vec<u8> {
    let length = u16::try_from(payload.len() + 4).unwrap();
    let mut bytes = Vec::with_capacity(payload.len() + 4);
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.extend_from_slice(&block_type.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// A binary identity holding the given framed blocks
pub fn identity(blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = HEADER.to_vec();
    for block in blocks {
        bytes.extend_from_slice(block);
    }
    bytes
}

/// Type 1 block: 125 bytes, Scrypt log-N 9 and 100 iterations
pub fn user_access_block() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&45u16.to_le_bytes());
    payload.extend_from_slice(&[0x01; 12]);
    payload.extend_from_slice(&[0x02; 16]);
    payload.push(9);
    payload.extend_from_slice(&100u32.to_le_bytes());
    payload.extend_from_slice(&0x01f3u16.to_le_bytes());
    payload.push(4);
    payload.push(5);
    payload.extend_from_slice(&15u16.to_le_bytes());
    payload.extend_from_slice(&[0x03; 32]);
    payload.extend_from_slice(&[0x04; 32]);
    payload.extend_from_slice(&[0x05; 16]);
    block_bytes(1, &payload)
}

/// Type 2 block: 73 bytes, Scrypt log-N 9 and 150 iterations
pub fn rescue_code_block() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&[0xaa; 16]);
    payload.push(9);
    payload.extend_from_slice(&150u32.to_le_bytes());
    payload.extend_from_slice(&[0xbb; 32]);
    payload.extend_from_slice(&[0xcc; 16]);
    block_bytes(2, &payload)
}

/// Type 3 block with `keys` previous keys, the n-th filled with `0x11 * n`
pub fn previous_keys_block(keys: u16) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&keys.to_le_bytes());
    for key in 1..=keys {
        payload.extend_from_slice(&[0x11u8.wrapping_mul(key as u8); 32]);
    }
    payload.extend_from_slice(&[0xdd; 16]);
    block_bytes(3, &payload)
}

/// Block types with their item names and values, for comparing documents
/// without their ids
pub fn summary(document: &Document) -> Vec<(u16, Vec<(String, String)>)> {
    document
        .blocks()
        .iter()
        .map(|block| {
            let items = block
                .items()
                .iter()
                .map(|item| (item.name().to_string(), item.value()))
                .collect();
            (block.block_type(), items)
        })
        .collect()
}

/// Create a temporary directory for identity and schema files
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Write a test file with content
pub fn create_test_file(dir: &TempDir, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}
