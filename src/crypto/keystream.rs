//! Positional keystream used to obfuscate NCM audio data.
//!
//! The table is built with the RC4 key-scheduling algorithm, but the RC4
//! output loop is never run. Instead, the keystream byte at stream offset
//! `i` is read straight out of the fixed permutation:
//!
//! ```text
//! j  = (i + 1) mod 256
//! ks = S[(S[j] + S[(S[j] + j) mod 256]) mod 256]
//! ```
//!
//! Since `S` never changes after construction, the keystream only depends
//! on the absolute offset. Any slice of the payload can be decoded on its
//! own, and splitting the stream into chunks of any size gives the same
//! bytes.

use crate::{Error, Result};

/// 256-byte permutation derived once per file from the key-blob secret.
#[derive(Clone, PartialEq, Eq)]
pub struct KeystreamTable {
    s: [u8; 256],
}

impl std::fmt::Debug for KeystreamTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystreamTable").finish_non_exhaustive()
    }
}

impl KeystreamTable {
    /// Run the RC4 key schedule over `secret`.
    ///
    /// Returns [`Error::Parse`] if `secret` is empty.
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Parse("empty keystream secret"));
        }

        let mut s: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(secret[i % secret.len()]);
            s.swap(i, j as usize);
        }
        Ok(Self { s })
    }

    /// Build the table from a normalized, NUL-padded key box.
    ///
    /// Only the bytes before the first NUL take part in the schedule.
    pub fn from_key_box(key_box: &[u8]) -> Result<Self> {
        let len = key_box.iter().position(|&b| b == 0).unwrap_or(key_box.len());
        Self::new(&key_box[..len])
    }

    /// The raw permutation.
    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.s
    }

    /// Keystream byte for absolute stream offset `offset`.
    #[inline]
    pub fn byte_at(&self, offset: u64) -> u8 {
        let s = &self.s;
        let j = (offset.wrapping_add(1) & 0xFF) as u8;
        let a = s[j as usize];
        let b = s[a.wrapping_add(j) as usize];
        s[a.wrapping_add(b) as usize]
    }

    /// XOR `buf` in place with the keystream starting at `offset`.
    ///
    /// Applying it twice with the same offset restores the input.
    pub fn apply(&self, offset: u64, buf: &mut [u8]) {
        for (pos, b) in (offset..).zip(buf.iter_mut()) {
            *b ^= self.byte_at(pos);
        }
    }
}
