//! Dense 2-bit packing of nucleotide sequences.
//!
//! Bases are mapped `A=0, C=1, G=2, T=3` and packed four to a byte, first
//! base in the two most significant bits. Packed artifacts carry no header
//! or length; the base count is tracked by the caller (for batches, in the
//! manifest).

pub mod codec;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod stats;

pub use codec::{pack, unpack, Base, PackReader, PackWriter, PackedArray};
pub use error::{PackError, Result};
