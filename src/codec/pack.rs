//! 2-bit packing: four codes per byte, first code in the high bits.

use std::io::{self, Write};

use crate::error::{PackError, Result};

/// Number of codes held by one packed byte.
pub const CODES_PER_BYTE: usize = 4;

/// Packed bytes staged on the stack by [`PackWriter::push_all`] per sink write.
const STAGE_BYTES: usize = 4096;

#[inline]
fn pack_quad(quad: &[u8]) -> u8 {
    ((quad[0] & 0b11) << 6)
        | ((quad[1] & 0b11) << 4)
        | ((quad[2] & 0b11) << 2)
        | (quad[3] & 0b11)
}

/// Fails with `InvalidCode` on the first value above 3.
pub fn check_codes(codes: &[u8]) -> Result<()> {
    match codes.iter().find(|&&code| code > 0b11) {
        Some(&code) => Err(PackError::InvalidCode(code)),
        None => Ok(()),
    }
}

/// Bytes needed to hold `count` codes.
#[inline]
pub fn packed_len(count: usize) -> usize {
    count.div_ceil(CODES_PER_BYTE)
}

/// Packs a full code slice into a new byte vector.
///
/// Trailing codes that do not fill a byte are left-aligned and the unused
/// low bits are zero. Codes are not checked: only their low two bits are
/// stored. Use [`try_pack`] for codes from an untrusted source.
pub fn pack(codes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed_len(codes.len()));
    let mut chunks = codes.chunks_exact(CODES_PER_BYTE);
    for chunk in &mut chunks {
        out.push(pack_quad(chunk));
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        let byte = rest
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &code)| acc | ((code & 0b11) << (6 - 2 * i)));
        out.push(byte);
    }
    out
}

/// Like [`pack`], but rejects any code above 3 with `InvalidCode`.
pub fn try_pack(codes: &[u8]) -> Result<Vec<u8>> {
    check_codes(codes)?;
    Ok(pack(codes))
}

/// Streaming packer over any byte sink.
///
/// Holds a single pending byte; complete bytes go straight to the sink, bulk
/// runs through a fixed stack buffer. Call [`PackWriter::finish`] to emit the
/// last partial byte.
pub struct PackWriter<W: Write> {
    inner: W,
    pending: u8,
    bit_pos: u8,
    codes: u64,
}

impl<W: Write> PackWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: 0,
            bit_pos: 0,
            codes: 0,
        }
    }

    /// Appends one code. Only the low two bits are used.
    #[inline]
    pub fn push(&mut self, code: u8) -> io::Result<()> {
        self.pending |= (code & 0b11) << (6 - self.bit_pos);
        self.bit_pos += 2;
        self.codes += 1;

        if self.bit_pos == 8 {
            self.inner.write_all(&[self.pending])?;
            self.pending = 0;
            self.bit_pos = 0;
        }
        Ok(())
    }

    /// Appends one code, rejecting values above 3.
    pub fn try_push(&mut self, code: u8) -> Result<()> {
        if code > 0b11 {
            return Err(PackError::InvalidCode(code));
        }
        Ok(self.push(code)?)
    }

    /// Appends a run of codes, writing whole bytes in one call where possible.
    pub fn push_all(&mut self, codes: &[u8]) -> io::Result<()> {
        let mut rest = codes;

        // Top up the pending byte first so the bulk path is byte aligned.
        while self.bit_pos != 0 {
            match rest.split_first() {
                Some((&code, tail)) => {
                    self.push(code)?;
                    rest = tail;
                }
                None => return Ok(()),
            }
        }

        let aligned = rest.len() - rest.len() % CODES_PER_BYTE;
        let mut stage = [0u8; STAGE_BYTES];
        for block in rest[..aligned].chunks(STAGE_BYTES * CODES_PER_BYTE) {
            let n = block.len() / CODES_PER_BYTE;
            for (byte, quad) in stage.iter_mut().zip(block.chunks_exact(CODES_PER_BYTE)) {
                *byte = pack_quad(quad);
            }
            self.inner.write_all(&stage[..n])?;
        }
        self.codes += aligned as u64;

        for &code in &rest[aligned..] {
            self.push(code)?;
        }
        Ok(())
    }

    /// Codes pushed so far, including those still pending.
    pub fn codes_written(&self) -> u64 {
        self.codes
    }

    /// Bit offset already filled in the pending byte, one of 0, 2, 4 or 6.
    pub fn bit_position(&self) -> u8 {
        self.bit_pos
    }

    /// Emits the partial byte, if any, flushes and returns the sink.
    pub fn finish(mut self) -> io::Result<W> {
        if self.bit_pos > 0 {
            self.inner.write_all(&[self.pending])?;
            self.pending = 0;
            self.bit_pos = 0;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        assert_eq!(pack(&[0, 1, 2, 3]), vec![0x1B]);
        assert_eq!(pack(&[3]), vec![0xC0]);
        assert_eq!(pack(&[]), Vec::<u8>::new());
        assert_eq!(pack(&[3, 3, 3, 3, 1, 2]), vec![0xFF, 0b0110_0000]);
    }

    #[test]
    fn test_try_pack_rejects_out_of_range() {
        assert_eq!(try_pack(&[0, 1, 2, 3, 3]).unwrap(), vec![0x1B, 0xC0]);
        assert!(matches!(try_pack(&[4, 5, 6, 255]), Err(PackError::InvalidCode(4))));
        assert!(matches!(try_pack(&[0, 1, 2, 3, 9]), Err(PackError::InvalidCode(9))));
        assert!(check_codes(&[]).is_ok());
    }

    #[test]
    fn test_try_push_leaves_writer_untouched_on_error() {
        let mut writer = PackWriter::new(Vec::new());
        writer.try_push(3).unwrap();
        assert!(matches!(writer.try_push(4), Err(PackError::InvalidCode(4))));
        assert_eq!(writer.codes_written(), 1);
        assert_eq!(writer.bit_position(), 2);
        assert_eq!(writer.finish().unwrap(), vec![0xC0]);
    }

    /// Sink that records the size of every write.
    #[derive(Default)]
    struct WriteSizes(Vec<usize>);

    impl Write for WriteSizes {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.push(buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_push_all_stages_bounded_writes() {
        let codes: Vec<u8> = (0..STAGE_BYTES * CODES_PER_BYTE * 3 + 6)
            .map(|i| (i % 4) as u8)
            .collect();

        let mut writer = PackWriter::new(WriteSizes::default());
        writer.push_all(&codes[..1]).unwrap();
        writer.push_all(&codes[1..]).unwrap();
        let sizes = writer.finish().unwrap().0;

        assert!(sizes.iter().all(|&n| n <= STAGE_BYTES));
        assert_eq!(sizes.iter().sum::<usize>(), packed_len(codes.len()));

        let mut writer = PackWriter::new(Vec::new());
        writer.push_all(&codes).unwrap();
        assert_eq!(writer.finish().unwrap(), pack(&codes));
    }

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(0), 0);
        assert_eq!(packed_len(1), 1);
        assert_eq!(packed_len(4), 1);
        assert_eq!(packed_len(5), 2);
        assert_eq!(packed_len(32), 8);
    }

    #[test]
    fn test_writer_matches_pack() {
        let codes: Vec<u8> = (0..37).map(|i| (i * 7 % 4) as u8).collect();

        let mut writer = PackWriter::new(Vec::new());
        for &c in &codes {
            writer.push(c).unwrap();
        }
        assert_eq!(writer.codes_written(), 37);
        assert_eq!(writer.bit_position(), 2);
        let streamed = writer.finish().unwrap();

        assert_eq!(streamed, pack(&codes));
    }

    #[test]
    fn test_push_all_unaligned_segments() {
        let codes: Vec<u8> = (0..50).map(|i| (i % 4) as u8).collect();

        let mut writer = PackWriter::new(Vec::new());
        writer.push_all(&codes[..3]).unwrap();
        writer.push_all(&codes[3..4]).unwrap();
        writer.push_all(&codes[4..23]).unwrap();
        writer.push_all(&[]).unwrap();
        writer.push_all(&codes[23..]).unwrap();
        assert_eq!(writer.codes_written(), 50);

        assert_eq!(writer.finish().unwrap(), pack(&codes));
    }

    #[test]
    fn test_finish_without_pending_emits_nothing() {
        let mut writer = PackWriter::new(Vec::new());
        writer.push_all(&[0, 1, 2, 3]).unwrap();
        assert_eq!(writer.bit_position(), 0);
        assert_eq!(writer.finish().unwrap(), vec![0x1B]);

        let empty = PackWriter::new(Vec::new()).finish().unwrap();
        assert!(empty.is_empty());
    }
}
