//! Streaming decode of a packed artifact back to base letters.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::info;

use crate::codec::symbol::decode_code;
use crate::codec::unpack::PackReader;
use crate::error::Result;

/// Pending output is flushed to the sink once it reaches this many bytes.
const FLUSH_AT: usize = 1 << 16;

/// Writes `count` bases unpacked from `reader` as text.
///
/// With `width` set, a newline follows every `width` bases (one line per
/// window); otherwise all bases go on a single line.
pub fn decode_stream<R: Read, W: Write>(
    reader: R,
    count: usize,
    width: Option<usize>,
    mut out: W,
) -> Result<u64> {
    let width = width.filter(|&w| w > 0);
    let mut line = Vec::with_capacity(width.map_or(FLUSH_AT, |w| w + 1).min(FLUSH_AT));
    let mut written = 0u64;

    for code in PackReader::new(reader, count) {
        line.push(decode_code(code?) as u8);
        written += 1;

        match width {
            Some(w) if line.len() == w => {
                line.push(b'\n');
                out.write_all(&line)?;
                line.clear();
            }
            None if line.len() >= FLUSH_AT => {
                out.write_all(&line)?;
                line.clear();
            }
            _ => {}
        }
    }

    if !line.is_empty() || (width.is_none() && count > 0) {
        line.push(b'\n');
        out.write_all(&line)?;
    }
    out.flush()?;
    Ok(written)
}

/// Decodes `count` bases from the artifact at `input` into `out`.
pub fn decode_file<W: Write>(input: &Path, count: usize, width: Option<usize>, out: W) -> Result<u64> {
    let reader = BufReader::new(File::open(input)?);
    let written = decode_stream(reader, count, width, out)?;
    info!("Decoded {} bases from {}", written, input.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::pack::pack;
    use crate::error::PackError;

    #[test]
    fn test_decode_single_line() {
        let bytes = pack(&[0, 1, 2, 3, 3, 2]);
        let mut out = Vec::new();
        assert_eq!(decode_stream(&bytes[..], 6, None, &mut out).unwrap(), 6);
        assert_eq!(out, b"ACGTTG\n");
    }

    #[test]
    fn test_decode_wrapped_windows() {
        let bytes = pack(&[0, 1, 2, 3, 3, 2, 1, 0, 0]);
        let mut out = Vec::new();
        decode_stream(&bytes[..], 9, Some(4), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ACGT\nTGCA\nA\n");
    }

    #[test]
    fn test_decode_empty() {
        let mut out = Vec::new();
        assert_eq!(decode_stream(std::io::empty(), 0, None, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_short_input() {
        let mut out = Vec::new();
        let err = decode_stream(&[0x1Bu8][..], 8, None, &mut out).unwrap_err();
        assert!(matches!(err, PackError::OutOfBounds { .. }));
    }
}
