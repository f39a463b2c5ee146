//! TTF → EOT (Embedded OpenType) encoder.
//!
//! Produces an uncompressed EOT version 0x00020001 file: a little-endian
//! header filled from the font's `OS/2`, `head` and `name` tables, followed
//! by the unmodified TrueType data.

use super::sfnt::{read_u16, read_u32, SfntFont};
use super::{BoxFuture, EncodeResult, FontTranscoder};
use crate::error::EncodeError;

const EOT_VERSION: u32 = 0x0002_0001;
const EOT_MAGIC: u16 = 0x504C;
const EOT_FIXED_HEADER_SIZE: usize = 82;
const DEFAULT_CHARSET: u8 = 1;

// OS/2 field offsets
const OS2_WEIGHT_CLASS: usize = 4;
const OS2_FS_TYPE: usize = 8;
const OS2_PANOSE: usize = 32;
const OS2_UNICODE_RANGE: usize = 42;
const OS2_FS_SELECTION: usize = 62;
const OS2_CODEPAGE_RANGE: usize = 78;

// head field offsets
const HEAD_CHECKSUM_ADJUSTMENT: usize = 8;

// name IDs copied into the EOT header, in header order
const NAME_FAMILY: u16 = 1;
const NAME_SUBFAMILY: u16 = 2;
const NAME_VERSION: u16 = 5;
const NAME_FULL: u16 = 4;

const PLATFORM_WINDOWS: u16 = 3;
const ENCODING_UNICODE_BMP: u16 = 1;
const LANGUAGE_EN_US: u16 = 0x0409;

/// Wraps a TrueType font in an EOT header.
#[derive(Debug, Clone, Default)]
pub struct EotEncoder;

impl EotEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encodes `ttf` synchronously.
    pub fn encode(&self, ttf: &[u8]) -> EncodeResult {
        let font = SfntFont::parse(ttf)?;
        let os2 = font
            .table(b"OS/2")
            .ok_or_else(|| EncodeError::Invalid("font has no OS/2 table".into()))?;
        let head = font
            .table(b"head")
            .ok_or_else(|| EncodeError::Invalid("font has no head table".into()))?;

        let mut header = Vec::with_capacity(EOT_FIXED_HEADER_SIZE + 64);
        header.extend_from_slice(&0u32.to_le_bytes()); // EOTSize, patched below
        header.extend_from_slice(&(ttf.len() as u32).to_le_bytes());
        header.extend_from_slice(&EOT_VERSION.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes()); // Flags

        let panose = os2
            .get(OS2_PANOSE..OS2_PANOSE + 10)
            .ok_or_else(|| EncodeError::Invalid("OS/2 table truncated".into()))?;
        header.extend_from_slice(panose);
        header.push(DEFAULT_CHARSET);
        header.push((read_u16(os2, OS2_FS_SELECTION)? & 0x01) as u8);
        header.extend_from_slice(&u32::from(read_u16(os2, OS2_WEIGHT_CLASS)?).to_le_bytes());
        header.extend_from_slice(&read_u16(os2, OS2_FS_TYPE)?.to_le_bytes());
        header.extend_from_slice(&EOT_MAGIC.to_le_bytes());

        for i in 0..4 {
            let range = read_u32(os2, OS2_UNICODE_RANGE + i * 4)?;
            header.extend_from_slice(&range.to_le_bytes());
        }
        for i in 0..2 {
            // Version 0 OS/2 tables have no code page ranges
            let range = read_u32(os2, OS2_CODEPAGE_RANGE + i * 4).unwrap_or(0);
            header.extend_from_slice(&range.to_le_bytes());
        }

        header.extend_from_slice(&read_u32(head, HEAD_CHECKSUM_ADJUSTMENT)?.to_le_bytes());
        header.extend_from_slice(&[0u8; 16]); // Reserved1-4
        header.extend_from_slice(&0u16.to_le_bytes()); // Padding1
        debug_assert_eq!(header.len(), EOT_FIXED_HEADER_SIZE);

        let names = font.table(b"name");
        for name_id in [NAME_FAMILY, NAME_SUBFAMILY, NAME_VERSION, NAME_FULL] {
            let name = names
                .map(|table| windows_name_le(table, name_id))
                .transpose()?
                .flatten()
                .unwrap_or_default();
            header.extend_from_slice(&(name.len() as u16).to_le_bytes());
            header.extend_from_slice(&name);
            header.extend_from_slice(&0u16.to_le_bytes()); // Padding2-5
        }
        header.extend_from_slice(&0u16.to_le_bytes()); // RootStringSize

        let total = header.len() + ttf.len();
        header[0..4].copy_from_slice(&(total as u32).to_le_bytes());

        let mut out = header;
        out.extend_from_slice(ttf);
        Ok(out)
    }
}

impl FontTranscoder for EotEncoder {
    fn transcode<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, EncodeResult> {
        Box::pin(async move { self.encode(input) })
    }
}

/// Finds a Windows-platform Unicode name record and returns its string as
/// UTF-16LE. Prefers US English.
fn windows_name_le(table: &[u8], name_id: u16) -> Result<Option<Vec<u8>>, EncodeError> {
    let count = read_u16(table, 2)? as usize;
    let storage = read_u16(table, 4)? as usize;

    let mut fallback = None;
    for i in 0..count {
        let at = 6 + i * 12;
        let platform = read_u16(table, at)?;
        let encoding = read_u16(table, at + 2)?;
        let language = read_u16(table, at + 4)?;
        let id = read_u16(table, at + 6)?;
        if platform != PLATFORM_WINDOWS || encoding != ENCODING_UNICODE_BMP || id != name_id {
            continue;
        }

        let length = read_u16(table, at + 8)? as usize;
        let offset = read_u16(table, at + 10)? as usize;
        let start = storage + offset;
        let raw = table
            .get(start..start + length)
            .ok_or_else(|| EncodeError::Invalid("name record out of bounds".into()))?;

        if language == LANGUAGE_EN_US {
            return Ok(Some(swap_utf16_bytes(raw)));
        }
        fallback.get_or_insert_with(|| swap_utf16_bytes(raw));
    }
    Ok(fallback)
}

fn swap_utf16_bytes(be: &[u8]) -> Vec<u8> {
    be.chunks_exact(2).flat_map(|pair| [pair[1], pair[0]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::sfnt::build_sfnt;

    fn os2_table() -> Vec<u8> {
        let mut os2 = vec![0u8; 86];
        os2[OS2_WEIGHT_CLASS..OS2_WEIGHT_CLASS + 2].copy_from_slice(&400u16.to_be_bytes());
        os2[OS2_FS_TYPE..OS2_FS_TYPE + 2].copy_from_slice(&8u16.to_be_bytes());
        for (i, b) in os2[OS2_PANOSE..OS2_PANOSE + 10].iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        os2[OS2_UNICODE_RANGE..OS2_UNICODE_RANGE + 4].copy_from_slice(&1u32.to_be_bytes());
        os2[OS2_FS_SELECTION..OS2_FS_SELECTION + 2].copy_from_slice(&1u16.to_be_bytes());
        os2
    }

    fn head_table() -> Vec<u8> {
        let mut head = vec![0u8; 54];
        head[8..12].copy_from_slice(&0xB1B0_AFBAu32.to_be_bytes());
        head
    }

    /// A name table with a single Windows en-US family name.
    fn name_table(family: &str) -> Vec<u8> {
        let encoded: Vec<u8> = family.encode_utf16().flat_map(u16::to_be_bytes).collect();
        let mut table = Vec::new();
        for value in [0u16, 1, 6 + 12] {
            table.extend_from_slice(&value.to_be_bytes());
        }
        for value in [
            PLATFORM_WINDOWS,
            ENCODING_UNICODE_BMP,
            LANGUAGE_EN_US,
            NAME_FAMILY,
            encoded.len() as u16,
            0,
        ] {
            table.extend_from_slice(&value.to_be_bytes());
        }
        table.extend_from_slice(&encoded);
        table
    }

    fn le_u32(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
    }

    fn le_u16(data: &[u8], at: usize) -> u16 {
        u16::from_le_bytes(data[at..at + 2].try_into().unwrap())
    }

    #[test]
    fn test_header_from_tables() {
        let ttf = build_sfnt(&[
            (b"OS/2", os2_table()),
            (b"head", head_table()),
            (b"name", name_table("Icons")),
        ]);
        let eot = EotEncoder::new().encode(&ttf).unwrap();

        assert_eq!(le_u32(&eot, 0) as usize, eot.len());
        assert_eq!(le_u32(&eot, 4) as usize, ttf.len());
        assert_eq!(le_u32(&eot, 8), EOT_VERSION);
        assert_eq!(&eot[16..26], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(eot[26], DEFAULT_CHARSET);
        assert_eq!(eot[27], 1); // italic bit
        assert_eq!(le_u32(&eot, 28), 400);
        assert_eq!(le_u16(&eot, 32), 8);
        assert_eq!(le_u16(&eot, 34), EOT_MAGIC);
        assert_eq!(le_u32(&eot, 36), 1);
        assert_eq!(le_u32(&eot, 60), 0xB1B0_AFBA);

        // Family name, UTF-16LE
        let family_len = le_u16(&eot, EOT_FIXED_HEADER_SIZE) as usize;
        assert_eq!(family_len, 10);
        let family = &eot[EOT_FIXED_HEADER_SIZE + 2..EOT_FIXED_HEADER_SIZE + 2 + family_len];
        assert_eq!(family, b"I\0c\0o\0n\0s\0");

        assert!(eot.ends_with(&ttf));
    }

    #[test]
    fn test_missing_names_are_empty() {
        let ttf = build_sfnt(&[(b"OS/2", os2_table()), (b"head", head_table())]);
        let eot = EotEncoder::new().encode(&ttf).unwrap();
        // Four empty names (size + padding) plus the root string size
        assert_eq!(eot.len(), EOT_FIXED_HEADER_SIZE + 4 * 4 + 2 + ttf.len());
    }

    #[test]
    fn test_requires_os2() {
        let ttf = build_sfnt(&[(b"head", head_table())]);
        let err = EotEncoder::new().encode(&ttf).unwrap_err();
        assert!(err.to_string().contains("OS/2"));
    }

    #[test]
    fn test_swap_utf16_bytes() {
        assert_eq!(swap_utf16_bytes(&[0, b'A', 0, b'B']), vec![b'A', 0, b'B', 0]);
    }
}
