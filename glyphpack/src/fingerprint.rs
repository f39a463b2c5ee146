//! Content fingerprints used as cache-busting tokens.

use flate2::Crc;

/// CRC-32 (IEEE 802.3) of `data` as 8 lowercase hex digits.
pub fn fingerprint(data: &[u8]) -> String {
    let mut crc = Crc::new();
    crc.update(data);
    format!("{:08x}", crc.sum())
}
