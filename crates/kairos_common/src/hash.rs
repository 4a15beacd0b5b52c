//! Content hashing for data-file versioning and graph fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit content hash computed using XXH3.
///
/// Delay tables record the hash of the text they were parsed from, and a
/// built timing graph can be fingerprinted so two builds of the same design
/// can be compared cheaply.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns the first 8 hex digits, for compact display in reports.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental hasher producing a [`ContentHash`].
///
/// Values are fed in order; the same sequence of updates always yields the
/// same hash.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds raw bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Feeds a string followed by a separator byte, so `"ab","c"` and
    /// `"a","bc"` hash differently.
    pub fn update_str(&mut self, s: &str) {
        self.state.update(s.as_bytes());
        self.state.update(&[0xff]);
    }

    /// Feeds an `f64` by its bit pattern.
    pub fn update_f64(&mut self, v: f64) {
        self.state.update(&v.to_bits().to_le_bytes());
    }

    /// Finishes and returns the hash.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
