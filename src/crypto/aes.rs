//! Pure-Rust AES (Rijndael with a 128-bit block) and three block modes.
//!
//! ## Key lengths
//!
//! | Variant | Key bytes | Key columns (`Nk`) | Rounds (`Nr`) |
//! |---------|-----------|--------------------|---------------|
//! | [`KeyLength::Aes128`] | 16 | 4 | 10 |
//! | [`KeyLength::Aes192`] | 24 | 6 | 12 |
//! | [`KeyLength::Aes256`] | 32 | 8 | 14 |
//!
//! ## Modes
//!
//! * **ECB** - every 16-byte block is transformed on its own.
//! * **CBC** - each plaintext block is XORed with the previous ciphertext
//!   block (the IV for the first one) before encryption.
//! * **CFB** (128-bit segments) - a running register is encrypted and XORed
//!   with the data; the register is then replaced by the *ciphertext* block
//!   in both directions.
//!
//! All modes require the input length to be a multiple of 16 and fail with
//! [`Error::Length`] before touching the key otherwise. The round-key
//! schedule is expanded again on every call and never cached: NCM decoding
//! uses each key exactly once per file.
//!
//! ## Implementation note
//!
//! The S-boxes and the GF(2^8) multiplication table are compile-time
//! constants. Lookups are data dependent, so this is not constant-time and
//! is only meant for offline file-format work.

use crate::{Error, Result};

/// Block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Number of 32-bit columns in the state. Fixed at 4 regardless of key size.
const NB: usize = 4;

type Block = [u8; BLOCK_LEN];

// https://en.wikipedia.org/wiki/Rijndael_S-box
const SBOX: [u8; 256] = [
    0x63, 0x7C, 0x77, 0x7B, 0xF2, 0x6B, 0x6F, 0xC5, 0x30, 0x01, 0x67, 0x2B, 0xFE, 0xD7, 0xAB, 0x76,
    0xCA, 0x82, 0xC9, 0x7D, 0xFA, 0x59, 0x47, 0xF0, 0xAD, 0xD4, 0xA2, 0xAF, 0x9C, 0xA4, 0x72, 0xC0,
    0xB7, 0xFD, 0x93, 0x26, 0x36, 0x3F, 0xF7, 0xCC, 0x34, 0xA5, 0xE5, 0xF1, 0x71, 0xD8, 0x31, 0x15,
    0x04, 0xC7, 0x23, 0xC3, 0x18, 0x96, 0x05, 0x9A, 0x07, 0x12, 0x80, 0xE2, 0xEB, 0x27, 0xB2, 0x75,
    0x09, 0x83, 0x2C, 0x1A, 0x1B, 0x6E, 0x5A, 0xA0, 0x52, 0x3B, 0xD6, 0xB3, 0x29, 0xE3, 0x2F, 0x84,
    0x53, 0xD1, 0x00, 0xED, 0x20, 0xFC, 0xB1, 0x5B, 0x6A, 0xCB, 0xBE, 0x39, 0x4A, 0x4C, 0x58, 0xCF,
    0xD0, 0xEF, 0xAA, 0xFB, 0x43, 0x4D, 0x33, 0x85, 0x45, 0xF9, 0x02, 0x7F, 0x50, 0x3C, 0x9F, 0xA8,
    0x51, 0xA3, 0x40, 0x8F, 0x92, 0x9D, 0x38, 0xF5, 0xBC, 0xB6, 0xDA, 0x21, 0x10, 0xFF, 0xF3, 0xD2,
    0xCD, 0x0C, 0x13, 0xEC, 0x5F, 0x97, 0x44, 0x17, 0xC4, 0xA7, 0x7E, 0x3D, 0x64, 0x5D, 0x19, 0x73,
    0x60, 0x81, 0x4F, 0xDC, 0x22, 0x2A, 0x90, 0x88, 0x46, 0xEE, 0xB8, 0x14, 0xDE, 0x5E, 0x0B, 0xDB,
    0xE0, 0x32, 0x3A, 0x0A, 0x49, 0x06, 0x24, 0x5C, 0xC2, 0xD3, 0xAC, 0x62, 0x91, 0x95, 0xE4, 0x79,
    0xE7, 0xC8, 0x37, 0x6D, 0x8D, 0xD5, 0x4E, 0xA9, 0x6C, 0x56, 0xF4, 0xEA, 0x65, 0x7A, 0xAE, 0x08,
    0xBA, 0x78, 0x25, 0x2E, 0x1C, 0xA6, 0xB4, 0xC6, 0xE8, 0xDD, 0x74, 0x1F, 0x4B, 0xBD, 0x8B, 0x8A,
    0x70, 0x3E, 0xB5, 0x66, 0x48, 0x03, 0xF6, 0x0E, 0x61, 0x35, 0x57, 0xB9, 0x86, 0xC1, 0x1D, 0x9E,
    0xE1, 0xF8, 0x98, 0x11, 0x69, 0xD9, 0x8E, 0x94, 0x9B, 0x1E, 0x87, 0xE9, 0xCE, 0x55, 0x28, 0xDF,
    0x8C, 0xA1, 0x89, 0x0D, 0xBF, 0xE6, 0x42, 0x68, 0x41, 0x99, 0x2D, 0x0F, 0xB0, 0x54, 0xBB, 0x16,
];

// https://en.wikipedia.org/wiki/Rijndael_S-box#Inverse_S-box
const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6A, 0xD5, 0x30, 0x36, 0xA5, 0x38, 0xBF, 0x40, 0xA3, 0x9E, 0x81, 0xF3, 0xD7, 0xFB,
    0x7C, 0xE3, 0x39, 0x82, 0x9B, 0x2F, 0xFF, 0x87, 0x34, 0x8E, 0x43, 0x44, 0xC4, 0xDE, 0xE9, 0xCB,
    0x54, 0x7B, 0x94, 0x32, 0xA6, 0xC2, 0x23, 0x3D, 0xEE, 0x4C, 0x95, 0x0B, 0x42, 0xFA, 0xC3, 0x4E,
    0x08, 0x2E, 0xA1, 0x66, 0x28, 0xD9, 0x24, 0xB2, 0x76, 0x5B, 0xA2, 0x49, 0x6D, 0x8B, 0xD1, 0x25,
    0x72, 0xF8, 0xF6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xD4, 0xA4, 0x5C, 0xCC, 0x5D, 0x65, 0xB6, 0x92,
    0x6C, 0x70, 0x48, 0x50, 0xFD, 0xED, 0xB9, 0xDA, 0x5E, 0x15, 0x46, 0x57, 0xA7, 0x8D, 0x9D, 0x84,
    0x90, 0xD8, 0xAB, 0x00, 0x8C, 0xBC, 0xD3, 0x0A, 0xF7, 0xE4, 0x58, 0x05, 0xB8, 0xB3, 0x45, 0x06,
    0xD0, 0x2C, 0x1E, 0x8F, 0xCA, 0x3F, 0x0F, 0x02, 0xC1, 0xAF, 0xBD, 0x03, 0x01, 0x13, 0x8A, 0x6B,
    0x3A, 0x91, 0x11, 0x41, 0x4F, 0x67, 0xDC, 0xEA, 0x97, 0xF2, 0xCF, 0xCE, 0xF0, 0xB4, 0xE6, 0x73,
    0x96, 0xAC, 0x74, 0x22, 0xE7, 0xAD, 0x35, 0x85, 0xE2, 0xF9, 0x37, 0xE8, 0x1C, 0x75, 0xDF, 0x6E,
    0x47, 0xF1, 0x1A, 0x71, 0x1D, 0x29, 0xC5, 0x89, 0x6F, 0xB7, 0x62, 0x0E, 0xAA, 0x18, 0xBE, 0x1B,
    0xFC, 0x56, 0x3E, 0x4B, 0xC6, 0xD2, 0x79, 0x20, 0x9A, 0xDB, 0xC0, 0xFE, 0x78, 0xCD, 0x5A, 0xF4,
    0x1F, 0xDD, 0xA8, 0x33, 0x88, 0x07, 0xC7, 0x31, 0xB1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xEC, 0x5F,
    0x60, 0x51, 0x7F, 0xA9, 0x19, 0xB5, 0x4A, 0x0D, 0x2D, 0xE5, 0x7A, 0x9F, 0x93, 0xC9, 0x9C, 0xEF,
    0xA0, 0xE0, 0x3B, 0x4D, 0xAE, 0x2A, 0xF5, 0xB0, 0xC8, 0xEB, 0xBB, 0x3C, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2B, 0x04, 0x7E, 0xBA, 0x77, 0xD6, 0x26, 0xE1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0C, 0x7D,
];

// MixColumns coefficients: rows are cyclic shifts of [2, 3, 1, 1].
// https://en.wikipedia.org/wiki/Rijndael_MixColumns
const MIX: [[u8; 4]; 4] = [[2, 3, 1, 1], [1, 2, 3, 1], [1, 1, 2, 3], [3, 1, 1, 2]];

// InvMixColumns coefficients: rows are cyclic shifts of [0x0E, 0x0B, 0x0D, 0x09].
const INV_MIX: [[u8; 4]; 4] = [
    [0x0E, 0x0B, 0x0D, 0x09],
    [0x09, 0x0E, 0x0B, 0x0D],
    [0x0D, 0x09, 0x0E, 0x0B],
    [0x0B, 0x0D, 0x09, 0x0E],
];

// Multiply two bytes in GF(2^8) modulo x^8+x^4+x^3+x+1 (0x11B).
// Only evaluated at compile time to fill GF_MUL.
const fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            p ^= a;
        }
        let hi = a & 0x80 != 0;
        a <<= 1;
        if hi {
            a ^= 0x1B;
        }
        b >>= 1;
        i += 1;
    }
    p
}

const fn gf_mul_table() -> [[u8; 256]; 15] {
    let mut t = [[0u8; 256]; 15];
    let mut c = 0;
    while c < 15 {
        let mut x = 0;
        while x < 256 {
            t[c][x] = gmul(c as u8, x as u8);
            x += 1;
        }
        c += 1;
    }
    t
}

/// `GF_MUL[c][x]` is `c * x` in GF(2^8) for every coefficient used by the
/// (inverse) column mix.
static GF_MUL: [[u8; 256]; 15] = gf_mul_table();

/// Key-length variant of the cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyLength {
    Aes128,
    Aes192,
    Aes256,
}

impl KeyLength {
    /// Number of 32-bit key columns (`Nk`).
    pub const fn key_columns(self) -> usize {
        match self {
            KeyLength::Aes128 => 4,
            KeyLength::Aes192 => 6,
            KeyLength::Aes256 => 8,
        }
    }

    /// Number of rounds (`Nr`).
    pub const fn rounds(self) -> usize {
        match self {
            KeyLength::Aes128 => 10,
            KeyLength::Aes192 => 12,
            KeyLength::Aes256 => 14,
        }
    }

    /// Raw key size in bytes.
    pub const fn key_len(self) -> usize {
        4 * self.key_columns()
    }

    /// Size of the expanded round-key schedule in bytes: `16 * (Nr + 1)`.
    pub const fn schedule_len(self) -> usize {
        4 * NB * (self.rounds() + 1)
    }
}

/// AES engine for one key-length variant.
///
/// Holds no key material; every operation takes the raw key and expands it
/// for the duration of that call only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aes {
    key_length: KeyLength,
}

impl Aes {
    pub const fn new(key_length: KeyLength) -> Self {
        Self { key_length }
    }

    pub const fn key_length(&self) -> KeyLength {
        self.key_length
    }

    /// Encrypt `input` block by block with no chaining (ECB).
    pub fn encrypt_ecb(&self, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        check_length(input)?;
        let rk = self.expand_key(key)?;
        let mut out = Vec::with_capacity(input.len());
        for chunk in input.chunks_exact(BLOCK_LEN) {
            out.extend_from_slice(&self.encrypt_block(&to_block(chunk), &rk));
        }
        Ok(out)
    }

    /// Decrypt `input` block by block with no chaining (ECB).
    pub fn decrypt_ecb(&self, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        check_length(input)?;
        let rk = self.expand_key(key)?;
        let mut out = Vec::with_capacity(input.len());
        for chunk in input.chunks_exact(BLOCK_LEN) {
            out.extend_from_slice(&self.decrypt_block(&to_block(chunk), &rk));
        }
        Ok(out)
    }

    /// Encrypt `input` in CBC mode.
    pub fn encrypt_cbc(&self, input: &[u8], key: &[u8], iv: &[u8; BLOCK_LEN]) -> Result<Vec<u8>> {
        check_length(input)?;
        let rk = self.expand_key(key)?;
        let mut out = Vec::with_capacity(input.len());
        let mut prev = *iv;
        for chunk in input.chunks_exact(BLOCK_LEN) {
            let mut block = to_block(chunk);
            xor_block(&mut block, &prev);
            prev = self.encrypt_block(&block, &rk);
            out.extend_from_slice(&prev);
        }
        Ok(out)
    }

    /// Decrypt `input` in CBC mode.
    pub fn decrypt_cbc(&self, input: &[u8], key: &[u8], iv: &[u8; BLOCK_LEN]) -> Result<Vec<u8>> {
        check_length(input)?;
        let rk = self.expand_key(key)?;
        let mut out = Vec::with_capacity(input.len());
        let mut prev = *iv;
        for chunk in input.chunks_exact(BLOCK_LEN) {
            let cipher = to_block(chunk);
            let mut block = self.decrypt_block(&cipher, &rk);
            xor_block(&mut block, &prev);
            out.extend_from_slice(&block);
            prev = cipher;
        }
        Ok(out)
    }

    /// Encrypt `input` in CFB mode with 128-bit segments.
    pub fn encrypt_cfb(&self, input: &[u8], key: &[u8], iv: &[u8; BLOCK_LEN]) -> Result<Vec<u8>> {
        check_length(input)?;
        let rk = self.expand_key(key)?;
        let mut out = Vec::with_capacity(input.len());
        let mut register = *iv;
        for chunk in input.chunks_exact(BLOCK_LEN) {
            let mut block = self.encrypt_block(&register, &rk);
            xor_block(&mut block, &to_block(chunk));
            out.extend_from_slice(&block);
            register = block;
        }
        Ok(out)
    }

    /// Decrypt `input` in CFB mode with 128-bit segments.
    ///
    /// The register is fed from the ciphertext input, the same as during
    /// encryption; the block cipher itself is only ever run forwards.
    pub fn decrypt_cfb(&self, input: &[u8], key: &[u8], iv: &[u8; BLOCK_LEN]) -> Result<Vec<u8>> {
        check_length(input)?;
        let rk = self.expand_key(key)?;
        let mut out = Vec::with_capacity(input.len());
        let mut register = *iv;
        for chunk in input.chunks_exact(BLOCK_LEN) {
            let cipher = to_block(chunk);
            let mut block = self.encrypt_block(&register, &rk);
            xor_block(&mut block, &cipher);
            out.extend_from_slice(&block);
            register = cipher;
        }
        Ok(out)
    }

    // Expand a raw key into `16 * (Nr + 1)` bytes of round keys.
    // The first Nk words are the key itself. Every later word is the word Nk
    // positions back XORed with the previous word, which is first put through
    // RotWord + SubWord + Rcon at every Nk-th position, and through SubWord
    // alone at position 4 of each cycle when Nk > 6 (AES-256 only).
    // https://en.wikipedia.org/wiki/AES_key_schedule
    fn expand_key(&self, key: &[u8]) -> Result<Vec<u8>> {
        let nk = self.key_length.key_columns();
        if key.len() != 4 * nk {
            return Err(Error::InvalidKeyLength {
                expected: 4 * nk,
                actual: key.len(),
            });
        }

        let words = NB * (self.key_length.rounds() + 1);
        let mut w = vec![0u8; 4 * words];
        w[..4 * nk].copy_from_slice(key);

        let mut rcon = 0x01u8;
        for i in nk..words {
            let mut t = [w[4 * i - 4], w[4 * i - 3], w[4 * i - 2], w[4 * i - 1]];
            if i % nk == 0 {
                t = [
                    SBOX[t[1] as usize] ^ rcon,
                    SBOX[t[2] as usize],
                    SBOX[t[3] as usize],
                    SBOX[t[0] as usize],
                ];
                rcon = GF_MUL[2][rcon as usize];
            } else if nk > 6 && i % nk == 4 {
                t = t.map(|b| SBOX[b as usize]);
            }
            for j in 0..4 {
                w[4 * i + j] = w[4 * (i - nk) + j] ^ t[j];
            }
        }
        Ok(w)
    }

    // Initial AddRoundKey, Nr-1 full rounds, final round without MixColumns.
    fn encrypt_block(&self, block: &Block, rk: &[u8]) -> Block {
        let nr = self.key_length.rounds();
        let mut s = *block;
        add_round_key(&mut s, round_key(rk, 0));
        for round in 1..nr {
            sub_bytes(&mut s, &SBOX);
            shift_rows(&mut s);
            mix_columns(&mut s, &MIX);
            add_round_key(&mut s, round_key(rk, round));
        }
        sub_bytes(&mut s, &SBOX);
        shift_rows(&mut s);
        add_round_key(&mut s, round_key(rk, nr));
        s
    }

    // Inverse cipher; round keys are consumed from the end of the schedule.
    fn decrypt_block(&self, block: &Block, rk: &[u8]) -> Block {
        let nr = self.key_length.rounds();
        let mut s = *block;
        add_round_key(&mut s, round_key(rk, nr));
        for round in (1..nr).rev() {
            inv_shift_rows(&mut s);
            sub_bytes(&mut s, &INV_SBOX);
            add_round_key(&mut s, round_key(rk, round));
            mix_columns(&mut s, &INV_MIX);
        }
        inv_shift_rows(&mut s);
        sub_bytes(&mut s, &INV_SBOX);
        add_round_key(&mut s, round_key(rk, 0));
        s
    }
}

fn check_length(input: &[u8]) -> Result<()> {
    if input.len() % BLOCK_LEN != 0 {
        return Err(Error::Length(input.len()));
    }
    Ok(())
}

#[inline]
fn to_block(chunk: &[u8]) -> Block {
    let mut b = [0u8; BLOCK_LEN];
    b.copy_from_slice(chunk);
    b
}

#[inline]
fn xor_block(dst: &mut Block, src: &Block) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

#[inline]
fn round_key(rk: &[u8], round: usize) -> &[u8] {
    &rk[round * BLOCK_LEN..(round + 1) * BLOCK_LEN]
}

// The state is a 4x4 grid stored column-major: byte `r + 4*c` is row r,
// column c.

fn add_round_key(s: &mut Block, rk: &[u8]) {
    for (b, k) in s.iter_mut().zip(rk) {
        *b ^= k;
    }
}

fn sub_bytes(s: &mut Block, table: &[u8; 256]) {
    for b in s.iter_mut() {
        *b = table[*b as usize];
    }
}

// Row r is rotated left by r positions.
fn shift_rows(s: &mut Block) {
    let old = *s;
    for r in 1..4 {
        for c in 0..4 {
            s[r + 4 * c] = old[r + 4 * ((c + r) % 4)];
        }
    }
}

// Row r is rotated right by r positions.
fn inv_shift_rows(s: &mut Block) {
    let old = *s;
    for r in 1..4 {
        for c in 0..4 {
            s[r + 4 * ((c + r) % 4)] = old[r + 4 * c];
        }
    }
}

// Multiply every column by `matrix` over GF(2^8).
fn mix_columns(s: &mut Block, matrix: &[[u8; 4]; 4]) {
    for col in s.chunks_exact_mut(4) {
        let v = [col[0], col[1], col[2], col[3]];
        for (row, out) in matrix.iter().zip(col.iter_mut()) {
            *out = row
                .iter()
                .zip(v)
                .fold(0u8, |acc, (&k, b)| acc ^ GF_MUL[k as usize][b as usize]);
        }
    }
}
