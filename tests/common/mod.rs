//! Synthetic NCM container builder shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ncmkit::crypto::aes::{Aes, BLOCK_LEN, KeyLength};
use ncmkit::crypto::keystream::KeystreamTable;
use ncmkit::keys::{
    CORE_KEY, JSON_PREFIX, KEY_PREFIX, KEY_XOR, MAGIC, META_KEY, META_PREFIX, META_XOR,
};

pub const SONG_JSON: &str =
    r#"{"format":"mp3","musicName":"Song","album":"Album","artist":[["Artist",1]]}"#;

/// 114 ASCII digits. With the 17-byte prefix the key plaintext is 131 bytes,
/// so PKCS#7 pads it with thirteen `\r` bytes, as in real files.
pub fn secret() -> Vec<u8> {
    (0..114u8).map(|i| b'0' + i % 10).collect()
}

pub fn audio(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + i / 7) as u8).collect()
}

fn pkcs7(buf: &mut Vec<u8>) {
    let pad = BLOCK_LEN - buf.len() % BLOCK_LEN;
    buf.extend(std::iter::repeat_n(pad as u8, pad));
}

fn length_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

pub struct NcmBuilder {
    pub magic: [u8; 8],
    pub secret: Vec<u8>,
    pub meta_json: String,
    pub cover: Vec<u8>,
    pub audio: Vec<u8>,
}

impl NcmBuilder {
    pub fn new(meta_json: &str, audio: &[u8]) -> Self {
        Self {
            magic: *MAGIC,
            secret: secret(),
            meta_json: meta_json.to_owned(),
            cover: b"\x89PNG fake cover".to_vec(),
            audio: audio.to_vec(),
        }
    }

    /// Keystream the decoder is expected to derive.
    pub fn keystream(&self) -> KeystreamTable {
        KeystreamTable::new(&self.secret).unwrap()
    }

    pub fn key_blob(&self) -> Vec<u8> {
        assert_eq!((KEY_PREFIX.len() + self.secret.len()) % BLOCK_LEN, 3);
        let mut plain = KEY_PREFIX.to_vec();
        plain.extend_from_slice(&self.secret);
        pkcs7(&mut plain);
        let mut blob = Aes::new(KeyLength::Aes128)
            .encrypt_ecb(&plain, &CORE_KEY)
            .unwrap();
        blob.iter_mut().for_each(|b| *b ^= KEY_XOR);
        blob
    }

    pub fn meta_blob(&self) -> Vec<u8> {
        let mut plain = JSON_PREFIX.to_vec();
        plain.extend_from_slice(self.meta_json.as_bytes());
        pkcs7(&mut plain);
        let encrypted = Aes::new(KeyLength::Aes128)
            .encrypt_ecb(&plain, &META_KEY)
            .unwrap();
        let mut blob = META_PREFIX.to_vec();
        blob.extend_from_slice(STANDARD.encode(encrypted).as_bytes());
        blob.iter_mut().for_each(|b| *b ^= META_XOR);
        blob
    }

    /// Everything in front of the audio data.
    pub fn header(&self) -> Vec<u8> {
        let mut out = self.magic.to_vec();
        out.extend_from_slice(&[0, 0]);
        length_prefixed(&mut out, &self.key_blob());
        length_prefixed(&mut out, &self.meta_blob());
        out.extend_from_slice(&[0u8; 9]);
        length_prefixed(&mut out, &self.cover);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.header();
        let mut audio = self.audio.clone();
        self.keystream().apply(0, &mut audio);
        out.extend_from_slice(&audio);
        out
    }
}

/// Scratch directory under the system temp dir, removed on drop.
///
/// The directory itself is not created, so tests also cover the decoder
/// creating its output folder.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("ncmkit-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Names of the files currently in the directory.
    pub fn files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.0) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}
