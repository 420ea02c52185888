//! Unpacking of 2-bit packed buffers.
//!
//! The packed format carries no length, so every entry point takes the number
//! of codes to recover from the caller.

use std::io::{self, Read};

use super::pack::{packed_len, CODES_PER_BYTE};
use crate::error::{PackError, Result};

#[inline]
fn shift_for(index: usize) -> usize {
    6 - 2 * (index % CODES_PER_BYTE)
}

/// Returns code `index` of a packed buffer, or `None` if the byte holding it
/// is past the end of `bytes`.
#[inline]
pub fn code_at(bytes: &[u8], index: usize) -> Option<u8> {
    bytes
        .get(index / CODES_PER_BYTE)
        .map(|&byte| (byte >> shift_for(index)) & 0b11)
}

/// Checks that `bytes` can hold `count` codes.
pub fn check_len(bytes: &[u8], count: usize) -> Result<()> {
    let needed = packed_len(count);
    if bytes.len() < needed {
        return Err(PackError::OutOfBounds {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// Unpacks exactly `count` codes from `bytes`.
pub fn unpack(bytes: &[u8], count: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    unpack_into(bytes, count, &mut out)?;
    Ok(out)
}

/// Appends `count` unpacked codes to `out`.
pub fn unpack_into(bytes: &[u8], count: usize, out: &mut Vec<u8>) -> Result<()> {
    check_len(bytes, count)?;
    out.reserve(count);

    let full = count / CODES_PER_BYTE;
    for &byte in &bytes[..full] {
        out.extend_from_slice(&expand(byte));
    }

    let rest = count % CODES_PER_BYTE;
    if rest > 0 {
        out.extend_from_slice(&expand(bytes[full])[..rest]);
    }
    Ok(())
}

/// Splits a byte into its four codes, highest bits first.
#[inline]
pub fn expand(byte: u8) -> [u8; 4] {
    [
        (byte >> 6) & 0b11,
        (byte >> 4) & 0b11,
        (byte >> 2) & 0b11,
        byte & 0b11,
    ]
}

/// Forward-only streaming unpacker.
///
/// Reads one byte at a time from the source and yields exactly `count` codes.
/// A source that ends early yields a single `OutOfBounds` error and then
/// stops.
pub struct PackReader<R: Read> {
    inner: R,
    current: u8,
    bit_pos: u8,
    remaining: usize,
    consumed: usize,
    failed: bool,
}

impl<R: Read> PackReader<R> {
    pub fn new(inner: R, count: usize) -> Self {
        Self {
            inner,
            current: 0,
            bit_pos: 0,
            remaining: count,
            consumed: 0,
            failed: false,
        }
    }

    /// Codes not yet yielded.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn fill(&mut self) -> Result<()> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => {
                    let needed = self.consumed + packed_len(self.remaining);
                    return Err(PackError::OutOfBounds {
                        needed,
                        available: self.consumed,
                    });
                }
                Ok(_) => {
                    self.current = buf[0];
                    self.consumed += 1;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Reads the next code, `Ok(None)` once `count` codes have been produced.
    pub fn read_code(&mut self) -> Result<Option<u8>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        if self.bit_pos == 0 {
            self.fill()?;
        }

        let code = (self.current >> (6 - self.bit_pos)) & 0b11;
        self.bit_pos = (self.bit_pos + 2) % 8;
        self.remaining -= 1;
        Ok(Some(code))
    }
}

impl<R: Read> Iterator for PackReader<R> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_code() {
            Ok(Some(code)) => Some(Ok(code)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining))
        }
    }
}
