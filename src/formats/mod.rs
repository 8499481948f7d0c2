//! Parsers for protected audio container formats.
//!
//! Parsers follow the same conventions:
//!
//! * **Generic over** [`std::io::Read`] - pass a [`std::fs::File`], a
//!   [`std::io::Cursor`], or anything else that reads. No seeking is needed;
//!   skipped regions are read and discarded.
//! * **Headers first** - the `parse` method reads and decrypts everything in
//!   front of the audio data and leaves the reader positioned at it. Audio is
//!   then streamed in chunks, never loaded whole.
//! * **Section-tagged errors** - every failure carries the
//!   [`crate::Section`] it happened in.
//!
//! ## Format overview
//!
//! | Module  | Format | Description |
//! |---------|--------|-------------|
//! | [`ncm`] | NCM    | NetEase Cloud Music download; AES-wrapped key and metadata, keystream-XORed MP3/FLAC |

pub mod ncm;
