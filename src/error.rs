use thiserror::Error;

/// Common `Result` type for packing, unpacking and FASTQ extraction.
pub type Result<T, E = PackError> = core::result::Result<T, E>;

/// Errors raised by the codec, the FASTQ reader and the encode driver.
#[derive(Debug, Error)]
pub enum PackError {
    /// A byte outside `A`/`C`/`G`/`T` reached the encoder.
    #[error("invalid base {base:?} at position {position}")]
    InvalidSymbol { position: usize, base: char },

    /// A code value above 3.
    #[error("invalid 2-bit code {0}")]
    InvalidCode(u8),

    /// The packed buffer holds fewer bytes than the requested code count needs.
    #[error("packed buffer too short: need {needed} bytes, have {available}")]
    OutOfBounds { needed: usize, available: usize },

    /// A FASTQ line exceeded the configured maximum length.
    #[error("line {line} exceeds the maximum length of {limit} bytes")]
    LineTooLong { line: usize, limit: usize },

    /// Input ended in the middle of a 4-line record.
    #[error("truncated FASTQ record starting at line {line}")]
    TruncatedRecord { line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
