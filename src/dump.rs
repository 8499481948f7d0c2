//! Status-code entry point for host applications.
//!
//! Hosts that cannot carry a Rust error across their boundary (an FFI or
//! JNI shim, a scripting bridge) get one [`DumpStatus`] per call instead.
//! The numeric values are stable.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::error;

use crate::formats::ncm::Ncm;
use crate::{Error, Section};

/// Outcome of one decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DumpStatus {
    Success = 0,
    /// The input could not be opened, or failed on its first read.
    InvalidInputStream = 1,
    /// The output folder does not exist and could not be created.
    InvalidOutputFolder = 2,
    /// Bad magic, or a key blob that does not decrypt.
    InvalidHeader = 3,
    /// The metadata names no audio format.
    UnknownFormat = 4,
    CannotReadMusicInfo = 5,
    CannotReadMusicCover = 6,
    CannotReadMusicData = 7,
    CannotSaveOutput = 8,
}

impl DumpStatus {
    /// Numeric code handed to the host.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == DumpStatus::Success
    }
}

impl From<&Error> for DumpStatus {
    fn from(e: &Error) -> Self {
        match e.section() {
            Some(Section::Header) => match e.root() {
                Error::Io(_) => DumpStatus::InvalidInputStream,
                _ => DumpStatus::InvalidHeader,
            },
            // A short key blob leaves nothing for the metadata read.
            Some(Section::Key) => match e.root() {
                Error::Io(_) | Error::UnexpectedEof => DumpStatus::CannotReadMusicInfo,
                _ => DumpStatus::InvalidHeader,
            },
            Some(Section::Metadata) => match e.root() {
                Error::UnknownFormat => DumpStatus::UnknownFormat,
                _ => DumpStatus::CannotReadMusicInfo,
            },
            Some(Section::Cover) => DumpStatus::CannotReadMusicCover,
            Some(Section::Audio) => DumpStatus::CannotReadMusicData,
            Some(Section::Output) => DumpStatus::CannotSaveOutput,
            Some(Section::OutputFolder) => DumpStatus::InvalidOutputFolder,
            None => match e {
                Error::BadMagic => DumpStatus::InvalidHeader,
                Error::UnknownFormat => DumpStatus::UnknownFormat,
                Error::Io(_) | Error::UnexpectedEof => DumpStatus::InvalidInputStream,
                _ => DumpStatus::CannotReadMusicInfo,
            },
        }
    }
}

/// Decode the NCM stream `input` into `output_folder`.
pub fn dump<R: Read>(input: &mut R, output_folder: &Path) -> DumpStatus {
    match Ncm::dump(input, output_folder) {
        Ok(_) => DumpStatus::Success,
        Err(e) => {
            error!("{e}");
            DumpStatus::from(&e)
        }
    }
}

/// Open `input` and decode it into `output_folder`.
pub fn dump_file(input: &Path, output_folder: &Path) -> DumpStatus {
    match File::open(input) {
        Ok(mut f) => dump(&mut f, output_folder),
        Err(e) => {
            error!("{}: {e}", input.display());
            DumpStatus::InvalidInputStream
        }
    }
}
