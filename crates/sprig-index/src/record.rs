//! On-disk encoding of the addition index.
//!
//! ```text
//! [4 bytes: magic "SPIX"]
//! [4 bytes: format version (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [4 bytes: payload length (little-endian u32)]
//! [N bytes: payload (bincode-serialized, sorted Vec<RepoPath>)]
//! ```

use std::collections::BTreeSet;

use sprig_types::RepoPath;

use crate::error::PersistenceError;

/// Magic bytes at the start of every index record.
pub const MAGIC: [u8; 4] = *b"SPIX";

/// Current record format version.
pub const VERSION: u32 = 1;

/// Magic + version + CRC + length.
const HEADER_SIZE: usize = 16;

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Serialize the set of staged paths.
pub fn encode(index: &BTreeSet<RepoPath>) -> Result<Vec<u8>, PersistenceError> {
    let paths: Vec<&RepoPath> = index.iter().collect();
    let payload =
        bincode::serialize(&paths).map_err(|e| PersistenceError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Parse and verify a record produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<BTreeSet<RepoPath>, PersistenceError> {
    if bytes.len() < HEADER_SIZE {
        return Err(PersistenceError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    let found = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if found != MAGIC {
        return Err(PersistenceError::InvalidMagic { found });
    }

    let version = read_u32(bytes, 4);
    if version != VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }

    let expected_crc = read_u32(bytes, 8);
    let length = read_u32(bytes, 12) as usize;
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != length {
        return Err(PersistenceError::Truncated {
            expected: HEADER_SIZE + length,
            actual: bytes.len(),
        });
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(PersistenceError::CrcMismatch {
            expected: expected_crc,
            actual: actual_crc,
        });
    }

    let paths: Vec<RepoPath> =
        bincode::deserialize(payload).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    Ok(paths.into_iter().collect())
}
