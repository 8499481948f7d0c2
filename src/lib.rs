//! **ncmkit** - a Rust library for removing the NCM wrapper from NetEase
//! Cloud Music downloads.
//!
//! # Modules
//! | Module | Contents |
//! |--------|----------|
//! | [`crypto::aes`]       | AES-128/192/256 with ECB, CBC and CFB modes |
//! | [`crypto::keystream`] | RC4-scheduled positional keystream for audio data |
//! | [`formats::ncm`]      | NCM container parser and decoder |
//! | [`dump`]              | Status-code entry point for host applications |
//! | [`keys`]              | Fixed keys and constants of the format |
//!
//! # Example
//! ```no_run
//! use std::fs::File;
//! use std::path::Path;
//!
//! use ncmkit::formats::ncm::Ncm;
//!
//! let mut input = File::open("song.ncm")?;
//! let path = Ncm::dump(&mut input, Path::new("out"))?;
//! println!("{}", path.display());
//! # Ok::<(), ncmkit::Error>(())
//! ```

pub mod crypto;
pub mod dump;
pub mod error;
pub mod formats;
pub mod keys;
pub(crate) mod utils;

pub use error::{Error, Result, Section};
