//! Minimal sfnt (TrueType/OpenType) table directory reader.
//!
//! Only what the container encoders need: the flavor, the table records and
//! bounds-checked access to table data.

use crate::error::EncodeError;

/// Size of the sfnt offset table.
pub(crate) const SFNT_HEADER_SIZE: usize = 12;

/// Size of one table record in the sfnt directory.
pub(crate) const SFNT_TABLE_RECORD_SIZE: usize = 16;

/// One entry of the sfnt table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    /// The tag as text, for error messages.
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed sfnt font borrowing its buffer.
#[derive(Debug)]
pub struct SfntFont<'a> {
    data: &'a [u8],
    flavor: u32,
    tables: Vec<TableRecord>,
}

impl<'a> SfntFont<'a> {
    /// Parses the offset table and table directory of `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self, EncodeError> {
        if data.len() < SFNT_HEADER_SIZE {
            return Err(EncodeError::Invalid("font shorter than sfnt header".into()));
        }

        let flavor = read_u32(data, 0)?;
        match flavor {
            0x0001_0000 | 0x4F54_544F | 0x7472_7565 => {}
            other => {
                return Err(EncodeError::Invalid(format!(
                    "unknown sfnt version {:#010x}",
                    other
                )))
            }
        }

        let num_tables = read_u16(data, 4)? as usize;
        let mut tables = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let at = SFNT_HEADER_SIZE + i * SFNT_TABLE_RECORD_SIZE;
            let record = TableRecord {
                tag: read_tag(data, at)?,
                checksum: read_u32(data, at + 4)?,
                offset: read_u32(data, at + 8)?,
                length: read_u32(data, at + 12)?,
            };

            let end = record.offset as usize + record.length as usize;
            if end > data.len() {
                return Err(EncodeError::Invalid(format!(
                    "table '{}' extends past end of font",
                    record.tag_str()
                )));
            }
            tables.push(record);
        }

        Ok(Self {
            data,
            flavor,
            tables,
        })
    }

    /// The sfnt version tag (`0x00010000` for TrueType outlines).
    pub fn flavor(&self) -> u32 {
        self.flavor
    }

    /// Table records in directory order.
    pub fn tables(&self) -> &[TableRecord] {
        &self.tables
    }

    /// The whole font buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Data of the table at `record`.
    pub fn table_data(&self, record: &TableRecord) -> &'a [u8] {
        let start = record.offset as usize;
        &self.data[start..start + record.length as usize]
    }

    /// Data of the table tagged `tag`, if present.
    pub fn table(&self, tag: &[u8; 4]) -> Option<&'a [u8]> {
        self.tables
            .iter()
            .find(|r| &r.tag == tag)
            .map(|r| self.table_data(r))
    }
}

pub(crate) fn read_u16(data: &[u8], at: usize) -> Result<u16, EncodeError> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| truncated(at))
}

pub(crate) fn read_u32(data: &[u8], at: usize) -> Result<u32, EncodeError> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| truncated(at))
}

fn read_tag(data: &[u8], at: usize) -> Result<[u8; 4], EncodeError> {
    data.get(at..at + 4)
        .map(|b| [b[0], b[1], b[2], b[3]])
        .ok_or_else(|| truncated(at))
}

fn truncated(at: usize) -> EncodeError {
    EncodeError::Invalid(format!("font data truncated at offset {}", at))
}

/// Rounds `n` up to a multiple of four.
pub(crate) fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Builds a TrueType font from raw tables, for encoder tests.
#[cfg(test)]
pub(crate) fn build_sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);

    let mut offset = SFNT_HEADER_SIZE + tables.len() * SFNT_TABLE_RECORD_SIZE;
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&table_checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += align4(data.len());
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
        out.resize(align4(out.len()), 0);
    }
    out
}

#[cfg(test)]
fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}
