//! Random access over a packed artifact.
//!
//! Code `i` lives in byte `i / 4` at shift `6 - 2 * (i % 4)`, so single codes
//! and contiguous slices can be read without unpacking the whole file.

use memmap2::Mmap;
use std::fs::File;
use std::ops::Range;
use std::path::Path;

use super::pack::packed_len;
use super::unpack::{check_len, code_at, unpack_into};
use crate::error::{PackError, Result};

enum Storage {
    Mapped { _file: File, mmap: Mmap },
    Owned(Vec<u8>),
}

impl Storage {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Mapped { mmap, .. } => &mmap[..],
            Storage::Owned(bytes) => &bytes[..],
        }
    }
}

/// Read-only view of `len` codes stored 2 bits each.
pub struct PackedArray {
    storage: Storage,
    len: usize,
}

impl PackedArray {
    /// Memory-maps `path` as a packed array of `len` codes.
    ///
    /// Fails with `OutOfBounds` if the file is too small for `len` codes.
    /// The file must not be modified while the array is alive.
    pub fn open(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PackError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        // Zero-length files cannot be mapped on every platform.
        if file.metadata()?.len() == 0 {
            check_len(&[], len)?;
            return Ok(Self {
                storage: Storage::Owned(Vec::new()),
                len,
            });
        }

        // SAFETY: the File is kept alive alongside the mapping, and packed
        // artifacts are write-once.
        let mmap = unsafe { Mmap::map(&file) }?;
        check_len(&mmap, len)?;
        Ok(Self {
            storage: Storage::Mapped { _file: file, mmap },
            len,
        })
    }

    /// Wraps an in-memory packed buffer.
    pub fn from_bytes(bytes: Vec<u8>, len: usize) -> Result<Self> {
        check_len(&bytes, len)?;
        Ok(Self {
            storage: Storage::Owned(bytes),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The packed bytes backing the array, trimmed to `len` codes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.bytes()[..packed_len(self.len)]
    }

    /// Code at `index`, `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index >= self.len {
            return None;
        }
        code_at(self.storage.bytes(), index)
    }

    /// Unpacks the codes in `range`.
    pub fn slice(&self, range: Range<usize>) -> Result<Vec<u8>> {
        if range.start > range.end || range.end > self.len {
            return Err(PackError::OutOfBounds {
                needed: packed_len(range.end),
                available: packed_len(self.len),
            });
        }

        let first_byte = range.start / 4;
        let skip = range.start % 4;
        let span = range.end - range.start;

        let mut out = Vec::with_capacity(span + skip);
        unpack_into(&self.storage.bytes()[first_byte..], span + skip, &mut out)?;
        out.drain(..skip);
        Ok(out)
    }

    /// Unpacks every code.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.slice(0..self.len)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let bytes = self.storage.bytes();
        (0..self.len).filter_map(move |i| code_at(bytes, i))
    }

    /// Occurrences of each code, indexed by code.
    pub fn composition(&self) -> [u64; 4] {
        let mut counts = [0u64; 4];
        for code in self.iter() {
            counts[code as usize] += 1;
        }
        counts
    }
}
