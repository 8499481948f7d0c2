//! Fixed constants of the NCM container format.
//!
//! The NetEase Cloud Music client obfuscates downloaded tracks with two
//! compiled-in AES-128 keys and a pair of single-byte XOR masks:
//!
//! * **Core key** - AES-128-ECB key for the key blob. The decrypted blob is
//!   `neteasecloudmusic` followed by the per-file secret that seeds the
//!   audio keystream.
//! * **Meta key** - AES-128-ECB key for the metadata blob. The decrypted
//!   blob is `music:` followed by a JSON object.
//!
//! These values are part of the format, not secrets under our control;
//! changing any of them breaks compatibility with real files.
//!
//! ## Container layout
//! ```text
//! [0x00] Magic "CTENFDAM"              (8 bytes)
//! [0x08] Reserved                      (2 bytes)
//! [0x0A] KeyLength                     (u32 LE)
//!        KeyBlob                       (KeyLength bytes, XOR 0x64, AES-ECB)
//!        MetaLength                    (u32 LE)
//!        MetaBlob                      (MetaLength bytes, XOR 0x63, base64, AES-ECB)
//!        Crc32 + Gap                   (9 bytes)
//!        CoverLength                   (u32 LE)
//!        Cover                         (CoverLength bytes)
//!        AudioData                     (remaining bytes, keystream XOR)
//! ```

/// Signature at the start of every NCM file.
pub const MAGIC: &[u8; 8] = b"CTENFDAM";

/// Reserved bytes between the magic and the key blob.
pub const RESERVED_LEN: u64 = 2;

/// AES-128 key for the key blob (`hzHRAmso5kInbaxW`).
pub const CORE_KEY: [u8; 16] = [
    0x68, 0x7A, 0x48, 0x52, 0x41, 0x6D, 0x73, 0x6F, 0x35, 0x6B, 0x49, 0x6E, 0x62, 0x61, 0x78, 0x57,
];

/// AES-128 key for the metadata blob (`#14ljk_!\]&0U<'(`).
pub const META_KEY: [u8; 16] = [
    0x23, 0x31, 0x34, 0x6C, 0x6A, 0x6B, 0x5F, 0x21, 0x5C, 0x5D, 0x26, 0x30, 0x55, 0x3C, 0x27, 0x28,
];

/// XOR mask applied to every byte of the key blob.
pub const KEY_XOR: u8 = 0x64;

/// XOR mask applied to every byte of the metadata blob.
pub const META_XOR: u8 = 0x63;

/// Known plaintext in front of the keystream secret.
pub const KEY_PREFIX: &[u8; 17] = b"neteasecloudmusic";

/// Known text in front of the base64 metadata.
pub const META_PREFIX: &[u8; 22] = b"163 key(Don't modify):";

/// Known plaintext in front of the metadata JSON.
pub const JSON_PREFIX: &[u8; 6] = b"music:";

/// CRC32 and padding between the metadata and the cover length.
pub const COVER_GAP_LEN: u64 = 9;

/// Size of the normalized key box the keystream secret is read from.
pub const KEY_BOX_LEN: usize = 256;
