//! TTF → WOFF 1.0 container encoder.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::sfnt::{align4, SfntFont, SFNT_HEADER_SIZE, SFNT_TABLE_RECORD_SIZE};
use super::{BoxFuture, EncodeResult, FontTranscoder};
use crate::error::EncodeError;

const WOFF_SIGNATURE: u32 = 0x774F_4646; // "wOFF"
const WOFF_HEADER_SIZE: usize = 44;
const WOFF_TABLE_ENTRY_SIZE: usize = 20;

/// Wraps a TrueType font in a WOFF 1.0 container, zlib-compressing each
/// table that gets smaller by it.
#[derive(Debug, Clone)]
pub struct WoffEncoder {
    level: Compression,
}

impl WoffEncoder {
    pub fn new() -> Self {
        Self {
            level: Compression::best(),
        }
    }

    /// Set the zlib compression level.
    pub fn with_level(mut self, level: Compression) -> Self {
        self.level = level;
        self
    }

    /// Encodes `ttf` synchronously.
    pub fn encode(&self, ttf: &[u8]) -> EncodeResult {
        let font = SfntFont::parse(ttf)?;

        let mut records = font.tables().to_vec();
        records.sort_by_key(|r| r.tag);

        let num_tables = records.len();
        let mut offset = WOFF_HEADER_SIZE + num_tables * WOFF_TABLE_ENTRY_SIZE;
        let mut directory = Vec::with_capacity(num_tables * WOFF_TABLE_ENTRY_SIZE);
        let mut payload = Vec::new();
        let mut total_sfnt_size = SFNT_HEADER_SIZE + num_tables * SFNT_TABLE_RECORD_SIZE;

        for record in &records {
            let original = font.table_data(record);
            let compressed = self.compress(original)?;
            let stored: &[u8] = if compressed.len() < original.len() {
                &compressed
            } else {
                original
            };

            directory.extend_from_slice(&record.tag);
            directory.extend_from_slice(&(offset as u32).to_be_bytes());
            directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
            directory.extend_from_slice(&record.length.to_be_bytes());
            directory.extend_from_slice(&record.checksum.to_be_bytes());

            payload.extend_from_slice(stored);
            payload.resize(align4(payload.len()), 0);

            offset += align4(stored.len());
            total_sfnt_size += align4(original.len());
        }

        let total_len = WOFF_HEADER_SIZE + directory.len() + payload.len();
        let mut out = Vec::with_capacity(total_len);
        out.extend_from_slice(&WOFF_SIGNATURE.to_be_bytes());
        out.extend_from_slice(&font.flavor().to_be_bytes());
        out.extend_from_slice(&(total_len as u32).to_be_bytes());
        out.extend_from_slice(&(num_tables as u16).to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // reserved
        out.extend_from_slice(&(total_sfnt_size as u32).to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes()); // majorVersion
        out.extend_from_slice(&0u16.to_be_bytes()); // minorVersion
        out.extend_from_slice(&[0u8; 20]); // no metadata or private block
        out.extend_from_slice(&directory);
        out.extend_from_slice(&payload);

        Ok(out)
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len()), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}

impl Default for WoffEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FontTranscoder for WoffEncoder {
    fn transcode<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, EncodeResult> {
        Box::pin(async move { self.encode(input) })
    }
}
