//! # Hasher Module
//!
//! Content fingerprints for exact-duplicate detection.
//!
//! A fingerprint is the SHA-256 digest of a file's full byte stream,
//! rendered as 64 lowercase hex characters. Files that cannot be read get
//! the all-zero sentinel, which duplicate detection never clusters.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Fixed-width hex digest of a file's content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex rendering
    pub const HEX_LEN: usize = 64;

    /// Sentinel for files whose bytes could not be read
    pub fn zero() -> Self {
        Self("0".repeat(Self::HEX_LEN))
    }

    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// Accept an existing hex digest, normalizing case
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() == Self::HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(hex.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters, for display
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint everything a reader yields
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<Fingerprint> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(Fingerprint(format!("{:x}", hasher.finalize())))
}

/// Fingerprint a file's full content
pub fn fingerprint_file(path: &Path) -> io::Result<Fingerprint> {
    let file = File::open(path)?;
    fingerprint_reader(BufReader::with_capacity(READ_BUFFER_SIZE, file))
}
