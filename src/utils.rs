//! Low-level I/O primitives shared by the container parser.
//!
//! Each function reads exactly the bytes it promises or returns an error -
//! there is no partial-read ambiguity.

use std::io::{self, Read};

use crate::{Error, Result};

/// Read a little-endian `u32`.
///
/// The value is assembled byte by byte, so the result does not depend on the
/// host's native byte order.
#[inline]
pub(crate) fn le_u32<R: Read>(r: &mut R) -> Result<u32> {
    let b = bytesa::<4>(r)?;
    Ok(u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16 | u32::from(b[3]) << 24)
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Read exactly `len` bytes into a `Vec`.
///
/// The buffer grows with the data actually read, so a corrupt length field
/// cannot force a huge up-front allocation.
#[inline]
pub(crate) fn bytesv<R: Read>(r: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut b = Vec::with_capacity(len.min(1 << 20));
    let got = r.by_ref().take(len as u64).read_to_end(&mut b)?;
    if got != len {
        return Err(Error::UnexpectedEof);
    }
    Ok(b)
}

/// Read a little-endian `u32` length prefix followed by that many bytes.
#[inline]
pub(crate) fn length_prefixed<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let len = le_u32(r)?;
    bytesv(r, len as usize)
}

/// Discard exactly `len` bytes.
///
/// Works on plain [`Read`] streams; no seeking is required.
#[inline]
pub(crate) fn skip<R: Read>(r: &mut R, len: u64) -> Result<()> {
    let skipped = io::copy(&mut r.by_ref().take(len), &mut io::sink())?;
    if skipped != len {
        return Err(Error::UnexpectedEof);
    }
    Ok(())
}

/// Verify that the next `N` bytes in the stream match `expected`.
///
/// Returns [`Error::BadMagic`] on mismatch.
#[inline]
pub(crate) fn magic<R: Read, const N: usize>(r: &mut R, expected: &[u8; N]) -> Result<()> {
    let got = bytesa::<N>(r)?;
    if &got != expected {
        return Err(Error::BadMagic);
    }
    Ok(())
}

/// XOR every byte of `data` with a single-byte mask.
#[inline]
pub(crate) fn xor_in_place(data: &mut [u8], mask: u8) {
    for b in data.iter_mut() {
        *b ^= mask;
    }
}
