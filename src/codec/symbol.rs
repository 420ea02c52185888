//! Base <-> 2-bit code mapping.
//!
//! Only uppercase `A`, `C`, `G` and `T` are valid. Lowercase bases and
//! ambiguity codes such as `N` are rejected rather than folded, so callers
//! with soft-masked input must uppercase it themselves.

use crate::error::{PackError, Result};

/// A nucleotide base with its fixed 2-bit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Base {
    A = 0,
    C = 1,
    G = 2,
    T = 3,
}

const INVALID: u8 = 0xFF;

/// ASCII byte -> code, `INVALID` for anything outside `ACGT`.
static ENCODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    table[b'A' as usize] = 0;
    table[b'C' as usize] = 1;
    table[b'G' as usize] = 2;
    table[b'T' as usize] = 3;
    table
};

const DECODE_TABLE: [u8; 4] = *b"ACGT";

impl Base {
    pub const ALL: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

    /// Looks up the base for an ASCII byte.
    #[inline]
    pub fn from_ascii(byte: u8) -> Option<Self> {
        match ENCODE_TABLE[byte as usize] {
            INVALID => None,
            code => Self::from_code(code),
        }
    }

    /// Returns the base for a code in `0..=3`.
    #[inline]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Base::A),
            1 => Some(Base::C),
            2 => Some(Base::G),
            3 => Some(Base::T),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn to_ascii(self) -> u8 {
        DECODE_TABLE[self as usize]
    }

    #[inline]
    pub fn to_char(self) -> char {
        self.to_ascii() as char
    }
}

/// Encodes one base character. Returns `None` for anything but `A`, `C`, `G`, `T`.
#[inline]
pub fn encode_symbol(c: char) -> Option<u8> {
    if !c.is_ascii() {
        return None;
    }
    Base::from_ascii(c as u8).map(Base::code)
}

/// Decodes a 2-bit code back to its base letter. Only the low two bits are used.
#[inline]
pub fn decode_code(code: u8) -> char {
    DECODE_TABLE[(code & 0b11) as usize] as char
}

/// Encodes a run of ASCII bases into codes, failing on the first invalid byte.
pub fn encode_sequence(seq: &[u8]) -> Result<Vec<u8>> {
    let mut codes = Vec::with_capacity(seq.len());
    encode_into(seq, &mut codes)?;
    Ok(codes)
}

/// Appends the codes for `seq` to `out`.
///
/// On error `out` is left exactly as it was before the call.
pub fn encode_into(seq: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    for (position, &byte) in seq.iter().enumerate() {
        match ENCODE_TABLE[byte as usize] {
            INVALID => {
                out.truncate(start);
                return Err(PackError::InvalidSymbol {
                    position,
                    base: byte as char,
                });
            }
            code => out.push(code),
        }
    }
    Ok(())
}

/// Decodes codes back into an ASCII string.
pub fn decode_sequence(codes: &[u8]) -> Result<String> {
    codes
        .iter()
        .map(|&code| {
            Base::from_code(code)
                .map(Base::to_char)
                .ok_or(PackError::InvalidCode(code))
        })
        .collect()
}

/// True if every byte in `seq` is one of `ACGT`.
#[inline]
pub fn is_valid_sequence(seq: &[u8]) -> bool {
    seq.iter().all(|&b| ENCODE_TABLE[b as usize] != INVALID)
}
