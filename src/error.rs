//! Library-wide error and result types.

use std::fmt;
use std::io;

/// Result alias used throughout ncmkit.
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the NCM container in which an error occurred.
///
/// Used by [`crate::dump::DumpStatus`] to pick the outcome code reported to
/// the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Magic signature and reserved bytes.
    Header,
    /// Encrypted key blob that seeds the keystream table.
    Key,
    /// Encrypted JSON metadata blob.
    Metadata,
    /// Checksum gap and cover image.
    Cover,
    /// Obfuscated audio payload.
    Audio,
    /// Destination file.
    Output,
    /// Destination directory.
    OutputFolder,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Header => "header",
            Section::Key => "key blob",
            Section::Metadata => "metadata",
            Section::Cover => "cover",
            Section::Audio => "audio data",
            Section::Output => "output file",
            Section::OutputFolder => "output folder",
        })
    }
}

/// All errors the library can produce.
///
/// Error messages are kept intentionally terse; callers that need richer
/// context should wrap `Error` in their own type.
#[derive(Debug)]
pub enum Error {
    /// A magic/signature field did not match the expected value.
    BadMagic,
    /// The stream ended before all expected bytes could be read.
    UnexpectedEof,
    /// Block-mode input whose length is not a multiple of 16.
    Length(usize),
    /// Cipher key of the wrong size for the selected key length.
    InvalidKeyLength { expected: usize, actual: usize },
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// The decrypted metadata carries no audio format.
    UnknownFormat,
    /// The metadata blob is not valid base64.
    Base64(base64::DecodeError),
    /// The decrypted metadata is not the expected JSON object.
    Json(serde_json::Error),
    /// An underlying I/O operation failed.
    Io(io::Error),
    /// An error raised while processing one section of the container.
    Section(Section, Box<Error>),
}

impl Error {
    /// Section this error was raised in, if it was tagged with one.
    pub fn section(&self) -> Option<Section> {
        match self {
            Error::Section(s, _) => Some(*s),
            _ => None,
        }
    }

    /// The innermost error, with all section tags removed.
    pub fn root(&self) -> &Error {
        let mut e = self;
        while let Error::Section(_, inner) = e {
            e = inner;
        }
        e
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadMagic => write!(f, "bad magic value"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::Length(n) => write!(f, "input length {n} is not a multiple of 16"),
            Error::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {expected} bytes, got {actual}")
            }
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::UnknownFormat => write!(f, "unknown audio format"),
            Error::Base64(e) => write!(f, "base64 error: {e}"),
            Error::Json(e) => write!(f, "json error: {e}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Section(s, e) => write!(f, "{s}: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Base64(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Section(_, e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Base64(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// Tag the error of a fallible stage with the container section it belongs
/// to.
pub(crate) trait SectionExt<T> {
    fn section(self, section: Section) -> Result<T>;
}

impl<T, E: Into<Error>> SectionExt<T> for std::result::Result<T, E> {
    fn section(self, section: Section) -> Result<T> {
        self.map_err(|e| Error::Section(section, Box::new(e.into())))
    }
}
