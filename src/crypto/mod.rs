//! Cryptographic primitives used by the NCM decoder.
//!
//! All functions accept already-loaded key material; the fixed keys of the
//! format live in [`crate::keys`].
//!
//! The implementations here are intended for **offline file-format parsing**
//! only. They are not constant-time and should not be used in contexts where
//! timing side-channels are a concern.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`aes`] | AES-128/192/256 block transform with ECB, CBC and CFB modes |
//! | [`keystream`] | RC4-scheduled permutation and positional XOR keystream for audio data |
//!
//! ## Key hierarchy (brief)
//!
//! ```text
//! CORE_KEY (compiled in)
//!   └── AES-ECB decrypt key blob
//!         └── secret → RC4 key schedule → KeystreamTable → XOR audio data
//!
//! META_KEY (compiled in)
//!   └── AES-ECB decrypt metadata blob → JSON (format, title, album, artists)
//! ```

pub mod aes;
pub mod keystream;
