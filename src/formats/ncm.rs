//! NCM - NetEase Cloud Music protected audio container.
//!
//! An MP3 or FLAC file wrapped in three layers of obfuscation by the
//! NetEase Cloud Music client. See [`crate::keys`] for the byte layout and
//! the fixed keys.
//!
//! ## Decoding stages
//!
//! 1. **Header** - 8-byte magic `CTENFDAM`, then 2 reserved bytes.
//! 2. **Key blob** - length-prefixed, XOR `0x64`, AES-128-ECB with the core
//!    key. Dropping the `neteasecloudmusic` prefix leaves the secret; it is
//!    copied into a 256-byte key box that is zeroed from the first `\r`
//!    onward and fed to the RC4 key schedule
//!    ([`KeystreamTable`]).
//! 3. **Metadata** - length-prefixed, XOR `0x63`, drop
//!    `163 key(Don't modify):`, base64, AES-128-ECB with the meta key, drop
//!    `music:`, parse JSON ([`NcmMetadata`]).
//! 4. **Cover** - 9-byte CRC/gap, then a length-prefixed image which is
//!    skipped.
//! 5. **Audio** - everything that is left, XORed with the positional
//!    keystream.
//!
//! [`Ncm::parse`] runs stages 1-4 and leaves the reader at the first audio
//! byte; [`Ncm::decode_audio`] streams stage 5. [`Ncm::dump`] does both and
//! writes `"<artists> - <title>.<format>"` into an output folder.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};

use crate::crypto::aes::{Aes, BLOCK_LEN, KeyLength};
use crate::crypto::keystream::KeystreamTable;
use crate::error::SectionExt;
use crate::keys::{
    CORE_KEY, COVER_GAP_LEN, JSON_PREFIX, KEY_BOX_LEN, KEY_PREFIX, KEY_XOR, MAGIC, META_KEY,
    META_PREFIX, META_XOR, RESERVED_LEN,
};
use crate::utils::{le_u32, length_prefixed, magic, skip, xor_in_place};
use crate::{Error, Result, Section};

/// Chunk size used by [`Ncm::dump`] when streaming audio data.
pub const READ_BUFFER_SIZE: usize = 8192;

/// Track information carried in the metadata blob.
///
/// Only the fields needed to name the output file are required; unknown
/// keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NcmMetadata {
    /// Audio container of the payload (`mp3`, `flac`), lowercased.
    #[serde(default)]
    pub format: String,
    /// Track title.
    #[serde(rename = "musicName", default)]
    pub title: String,
    /// Album title.
    #[serde(default)]
    pub album: String,
    /// Artist names in credit order.
    ///
    /// Stored in the file as `[["Name", id], ...]`; only the string members
    /// are kept.
    #[serde(rename = "artist", default, deserialize_with = "artist_names")]
    pub artists: Vec<String>,
    /// NetEase track id.
    #[serde(rename = "musicId", default)]
    pub music_id: Option<u64>,
    /// Bitrate in bits per second.
    #[serde(default)]
    pub bitrate: Option<u64>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// URL of the album artwork.
    #[serde(rename = "albumPic", default)]
    pub album_pic: Option<String>,
}

fn artist_names<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    let groups = Vec::<Vec<serde_json::Value>>::deserialize(d)?;
    Ok(groups
        .into_iter()
        .flatten()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

impl NcmMetadata {
    /// Output file name: `"<artist1> <artist2> ... - <title>.<format>"`.
    ///
    /// Names are used verbatim; nothing is escaped. [`Ncm::dump`] refuses
    /// names that are not a single plain path component.
    pub fn file_name(&self) -> String {
        format!("{} - {}.{}", self.artists.join(" "), self.title, self.format)
    }
}

// A name that is absolute, contains a separator, or is `..` would escape the
// output folder once joined.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}

/// Parsed NCM container (everything up to the audio data).
#[derive(Debug)]
pub struct Ncm {
    /// Decrypted track information.
    pub metadata: NcmMetadata,
    /// Size in bytes of the cover image that was skipped.
    pub cover_len: u32,
    keystream: KeystreamTable,
}

impl Ncm {
    /// Parse the container headers from `r`.
    ///
    /// The reader must be positioned at the magic. On success it is left at
    /// the first byte of the audio data. Errors are tagged with the
    /// [`Section`] they occurred in.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        magic(r, MAGIC).section(Section::Header)?;
        skip(r, RESERVED_LEN).section(Section::Header)?;

        let keystream = length_prefixed(r)
            .and_then(|blob| {
                debug!("key blob: {} bytes", blob.len());
                decrypt_key_blob(blob)
            })
            .section(Section::Key)?;

        let metadata = length_prefixed(r)
            .and_then(|blob| {
                debug!("metadata blob: {} bytes", blob.len());
                decrypt_metadata(blob)
            })
            .section(Section::Metadata)?;
        debug!(
            "format: {}, title: {:?}, album: {:?}",
            metadata.format, metadata.title, metadata.album
        );

        skip(r, COVER_GAP_LEN).section(Section::Cover)?;
        let cover_len = le_u32(r).section(Section::Cover)?;
        skip(r, u64::from(cover_len)).section(Section::Cover)?;
        debug!("cover: {cover_len} bytes skipped");

        Ok(Self {
            metadata,
            cover_len,
            keystream,
        })
    }

    /// Keystream table derived from the key blob.
    pub fn keystream(&self) -> &KeystreamTable {
        &self.keystream
    }

    /// Decode the audio data from `r` into `w`, `chunk_size` bytes at a
    /// time.
    ///
    /// The output does not depend on `chunk_size`. Returns the number of
    /// bytes written. Read failures are tagged [`Section::Audio`], write
    /// failures [`Section::Output`]; bytes already written stay written.
    pub fn decode_audio<R: Read, W: Write>(
        &self,
        r: &mut R,
        w: &mut W,
        chunk_size: usize,
    ) -> Result<u64> {
        let mut buf = vec![0u8; chunk_size.max(1)];
        let mut offset = 0u64;
        loop {
            let n = match r.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).section(Section::Audio),
            };
            self.keystream.apply(offset, &mut buf[..n]);
            w.write_all(&buf[..n]).section(Section::Output)?;
            offset += n as u64;
        }
        w.flush().section(Section::Output)?;
        Ok(offset)
    }

    /// Decode a whole NCM stream into `output_folder`.
    ///
    /// The folder is created if missing. The output file is only created
    /// once the headers and metadata have been validated. Returns the path
    /// of the written file.
    pub fn dump<R: Read>(r: &mut R, output_folder: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_folder).section(Section::OutputFolder)?;

        let ncm = Self::parse(r)?;
        let name = ncm.metadata.file_name();
        if !is_plain_file_name(&name) {
            return Err(Error::Parse("output file name is not a plain file name"))
                .section(Section::Output);
        }
        let path = output_folder.join(name);
        let mut out = File::create(&path).section(Section::Output)?;
        let written = ncm.decode_audio(r, &mut out, READ_BUFFER_SIZE)?;

        info!("wrote {} ({written} bytes)", path.display());
        Ok(path)
    }
}

fn decrypt_key_blob(mut blob: Vec<u8>) -> Result<KeystreamTable> {
    xor_in_place(&mut blob, KEY_XOR);
    let plain = Aes::new(KeyLength::Aes128).decrypt_ecb(&blob, &CORE_KEY)?;
    if !plain.starts_with(KEY_PREFIX) {
        warn!("key blob does not start with the expected prefix");
    }
    let secret = plain
        .get(KEY_PREFIX.len()..)
        .ok_or(Error::Parse("key blob shorter than its prefix"))?;
    KeystreamTable::from_key_box(&key_box(secret))
}

// Copy the secret into a zero-padded 256-byte box and blank everything from
// the first carriage return, which is where the producer's padding starts.
fn key_box(secret: &[u8]) -> [u8; KEY_BOX_LEN] {
    let mut key_box = [0u8; KEY_BOX_LEN];
    let n = secret.len().min(KEY_BOX_LEN);
    key_box[..n].copy_from_slice(&secret[..n]);
    if let Some(cr) = key_box.iter().position(|&b| b == b'\r') {
        key_box[cr..].fill(0);
    }
    key_box
}

fn decrypt_metadata(mut blob: Vec<u8>) -> Result<NcmMetadata> {
    xor_in_place(&mut blob, META_XOR);
    if !blob.starts_with(META_PREFIX) {
        warn!("metadata blob does not start with the expected prefix");
    }
    let encoded = blob
        .get(META_PREFIX.len()..)
        .ok_or(Error::Parse("metadata blob shorter than its prefix"))?;
    let encrypted = STANDARD.decode(encoded.trim_ascii())?;

    let mut plain = Aes::new(KeyLength::Aes128).decrypt_ecb(&encrypted, &META_KEY)?;
    if !strip_pkcs7(&mut plain) {
        warn!("metadata has no PKCS#7 padding");
    }
    let json = plain
        .get(JSON_PREFIX.len()..)
        .ok_or(Error::Parse("metadata shorter than its prefix"))?;

    let mut metadata: NcmMetadata = serde_json::from_slice(json)?;
    metadata.format.make_ascii_lowercase();
    if metadata.format.is_empty() {
        return Err(Error::UnknownFormat);
    }
    Ok(metadata)
}

/// Remove well-formed PKCS#7 padding. Returns `false` and leaves `buf`
/// alone otherwise.
fn strip_pkcs7(buf: &mut Vec<u8>) -> bool {
    let Some(&pad) = buf.last() else {
        return false;
    };
    let n = pad as usize;
    if n == 0 || n > BLOCK_LEN || n > buf.len() {
        return false;
    }
    if !buf[buf.len() - n..].iter().all(|&b| b == pad) {
        return false;
    }
    buf.truncate(buf.len() - n);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_joins_artists() {
        let meta: NcmMetadata = serde_json::from_str(
            r#"{"format":"flac","musicName":"Song","album":"Album","artist":[["A",1],["B",2]]}"#,
        )
        .unwrap();
        assert_eq!(meta.artists, ["A", "B"]);
        assert_eq!(meta.file_name(), "A B - Song.flac");
    }

    #[test]
    fn artist_ids_are_ignored() {
        let meta: NcmMetadata =
            serde_json::from_str(r#"{"format":"mp3","artist":[[12,"Solo",null]]}"#).unwrap();
        assert_eq!(meta.artists, ["Solo"]);
        assert_eq!(meta.file_name(), "Solo - .mp3");
    }

    #[test]
    fn optional_fields() {
        let meta: NcmMetadata = serde_json::from_str(
            r#"{"format":"mp3","musicName":"x","bitrate":320000,"duration":1000,"albumPic":"http://p","extra":true}"#,
        )
        .unwrap();
        assert_eq!(meta.music_id, None);
        assert_eq!(meta.bitrate, Some(320000));
        assert_eq!(meta.duration, Some(1000));
        assert_eq!(meta.album_pic.as_deref(), Some("http://p"));
        assert!(meta.artists.is_empty());
    }

    #[test]
    fn music_id_is_kept() {
        let meta: NcmMetadata =
            serde_json::from_str(r#"{"format":"flac","musicId":1234567}"#).unwrap();
        assert_eq!(meta.music_id, Some(1234567));
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("Artist - Song.mp3"));
        assert!(is_plain_file_name(" - .mp3"));
        assert!(!is_plain_file_name("/tmp/evil - Song.mp3"));
        assert!(!is_plain_file_name("a/b - Song.mp3"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("./x.mp3"));
        assert!(!is_plain_file_name("dir/"));
    }

    #[test]
    fn key_box_truncates_at_carriage_return() {
        let b = key_box(b"abc\rdef");
        assert_eq!(&b[..3], b"abc");
        assert!(b[3..].iter().all(|&x| x == 0));

        let long = [b'x'; 300];
        assert_eq!(key_box(&long), [b'x'; KEY_BOX_LEN]);
    }

    #[test]
    fn pkcs7() {
        let mut v = b"hello\x03\x03\x03".to_vec();
        assert!(strip_pkcs7(&mut v));
        assert_eq!(v, b"hello");

        let mut v = b"hello\x03\x02\x03".to_vec();
        assert!(!strip_pkcs7(&mut v));
        assert_eq!(v.len(), 8);

        let mut v = b"x\x00".to_vec();
        assert!(!strip_pkcs7(&mut v));
    }

    #[test]
    fn metadata_round_trip() {
        let json = br#"music:{"format":"MP3","musicName":"Song","album":"Album","artist":[["Artist",1]]}"#;
        let mut padded = json.to_vec();
        let pad = BLOCK_LEN - padded.len() % BLOCK_LEN;
        padded.extend(std::iter::repeat_n(pad as u8, pad));
        let encrypted = Aes::new(KeyLength::Aes128)
            .encrypt_ecb(&padded, &META_KEY)
            .unwrap();

        let mut blob = META_PREFIX.to_vec();
        blob.extend_from_slice(STANDARD.encode(encrypted).as_bytes());
        xor_in_place(&mut blob, META_XOR);

        let meta = decrypt_metadata(blob).unwrap();
        assert_eq!(meta.format, "mp3");
        assert_eq!(meta.file_name(), "Artist - Song.mp3");
    }

    #[test]
    fn metadata_without_format() {
        let mut padded = br#"music:{"format":"","musicName":"Song"}"#.to_vec();
        let pad = BLOCK_LEN - padded.len() % BLOCK_LEN;
        padded.extend(std::iter::repeat_n(pad as u8, pad));
        let encrypted = Aes::new(KeyLength::Aes128)
            .encrypt_ecb(&padded, &META_KEY)
            .unwrap();

        let mut blob = META_PREFIX.to_vec();
        blob.extend_from_slice(STANDARD.encode(encrypted).as_bytes());
        xor_in_place(&mut blob, META_XOR);

        assert!(matches!(decrypt_metadata(blob), Err(Error::UnknownFormat)));
    }

    #[test]
    fn short_key_blob() {
        let mut blob = Aes::new(KeyLength::Aes128)
            .encrypt_ecb(b"neteasecloudmus\x01", &CORE_KEY)
            .unwrap();
        xor_in_place(&mut blob, KEY_XOR);
        assert!(matches!(decrypt_key_blob(blob), Err(Error::Parse(_))));
    }

    #[test]
    fn unaligned_key_blob() {
        assert!(matches!(decrypt_key_blob(vec![0u8; 20]), Err(Error::Length(20))));
    }
}
