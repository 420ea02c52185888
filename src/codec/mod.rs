//! 2-bit nucleotide codec: base mapping, packing and unpacking.

pub mod pack;
pub mod packed_array;
pub mod symbol;
pub mod unpack;

pub use pack::{check_codes, pack, packed_len, try_pack, PackWriter, CODES_PER_BYTE};
pub use packed_array::PackedArray;
pub use symbol::{decode_code, encode_sequence, encode_symbol, Base};
pub use unpack::{code_at, unpack, PackReader};
