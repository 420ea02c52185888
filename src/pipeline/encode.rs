//! FASTQ window extraction and packing.
//!
//! Each accepted record contributes exactly its first `window` bases to one
//! in-memory code buffer, which is packed once and written as the artifact.

use std::fs;
use std::io::{BufWriter, ErrorKind};
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::codec::pack::{packed_len, PackWriter};
use crate::codec::symbol::{encode_into, is_valid_sequence};
use crate::error::{PackError, Result};
use crate::io::fastq::{open_fastq, FastqRecord, FastqStreamParser, MAX_LINE_LENGTH};

/// Upper bound on the up-front allocation for the code buffer.
const MAX_PREALLOC: usize = 256 << 20;

/// Records seen between progress lines.
const PROGRESS_EVERY: u64 = 100_000;

/// Which part of a record's sequence the alphabet pre-filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WindowFilter {
    /// Skip records whose whole line contains `N`. Any other invalid base
    /// inside the window is then a hard error for the source.
    #[default]
    FullLine,
    /// Skip records with any non-`ACGT` base inside the window; bases after
    /// the window are never looked at.
    Window,
}

/// Parameters for one encode run.
#[derive(Debug, Clone, Serialize)]
pub struct EncodeConfig {
    /// Bases kept per record (K).
    pub window: usize,
    /// Stop after this many accepted records (N).
    pub max_records: usize,
    pub filter: WindowFilter,
    /// Longest FASTQ line accepted before the source is rejected.
    pub max_line_length: usize,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            window: 32,
            max_records: 1_000_000,
            filter: WindowFilter::FullLine,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}

impl EncodeConfig {
    fn capacity_hint(&self) -> usize {
        self.window
            .saturating_mul(self.max_records)
            .min(MAX_PREALLOC)
    }
}

/// Counters from one encode run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodeStats {
    pub records_seen: u64,
    pub records_accepted: u64,
    pub skipped_short: u64,
    pub skipped_invalid: u64,
    pub total_bases: u64,
    pub packed_bytes: u64,
}

/// Result of [`process_fastq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The artifact already existed; nothing was read or written.
    Skipped,
    Written(EncodeStats),
}

impl EncodeOutcome {
    /// Bases packed by this run, zero when skipped.
    pub fn total_bases(&self) -> u64 {
        match self {
            EncodeOutcome::Skipped => 0,
            EncodeOutcome::Written(stats) => stats.total_bases,
        }
    }
}

/// Window-filter verdict for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCheck {
    Accept,
    TooShort,
    Invalid,
}

/// Applies the length and alphabet pre-filter to one sequence line.
pub fn check_window(sequence: &[u8], window: usize, filter: WindowFilter) -> WindowCheck {
    if sequence.len() < window {
        return WindowCheck::TooShort;
    }
    let rejected = match filter {
        WindowFilter::FullLine => sequence.contains(&b'N'),
        WindowFilter::Window => !is_valid_sequence(&sequence[..window]),
    };
    if rejected {
        WindowCheck::Invalid
    } else {
        WindowCheck::Accept
    }
}

/// Extracts and encodes windows from a record stream into a code buffer.
///
/// Stops after `max_records` accepted records or at end of input. An invalid
/// base that gets past the filter aborts the run with `InvalidSymbol`, its
/// position reported relative to the start of the window.
pub fn encode_records<I>(records: I, config: &EncodeConfig) -> Result<(Vec<u8>, EncodeStats)>
where
    I: IntoIterator<Item = Result<FastqRecord>>,
{
    let mut codes = Vec::with_capacity(config.capacity_hint());
    let mut stats = EncodeStats::default();
    let mut records = records.into_iter();

    while stats.records_accepted < config.max_records as u64 {
        let record = match records.next() {
            Some(record) => record?,
            None => break,
        };
        stats.records_seen += 1;
        if stats.records_seen % PROGRESS_EVERY == 0 {
            info!(
                "Processed {} records, {} accepted",
                stats.records_seen, stats.records_accepted
            );
        }

        let sequence = record.sequence.as_slice();
        match check_window(sequence, config.window, config.filter) {
            WindowCheck::TooShort => {
                stats.skipped_short += 1;
                continue;
            }
            WindowCheck::Invalid => {
                stats.skipped_invalid += 1;
                continue;
            }
            WindowCheck::Accept => {}
        }

        encode_into(&sequence[..config.window], &mut codes).map_err(|e| {
            debug!("Rejecting record {}: {}", record.name(), e);
            e
        })?;
        stats.records_accepted += 1;
    }

    stats.total_bases = codes.len() as u64;
    stats.packed_bytes = packed_len(codes.len()) as u64;
    Ok((codes, stats))
}

/// Packs `codes` into a new artifact at `path`.
///
/// Bytes go to a temporary file in the destination directory that is only
/// linked into place once fully written, so a failure never leaves a partial
/// artifact behind. An existing file at `path` is never replaced: if one
/// appears while encoding, the temporary file is dropped and `Ok(None)` is
/// returned.
pub fn write_artifact(path: &Path, codes: &[u8]) -> Result<Option<u64>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;

    let mut writer = PackWriter::new(BufWriter::new(tmp.as_file_mut()));
    writer.push_all(codes)?;
    let written = writer.codes_written();
    drop(writer.finish()?);

    tmp.as_file().sync_all()?;
    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(Some(written)),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            warn!("{} was created by another writer, keeping it", path.display());
            Ok(None)
        }
        Err(e) => Err(PackError::Io(e.error)),
    }
}

/// Encodes one FASTQ source into a packed artifact.
///
/// Returns [`EncodeOutcome::Skipped`] without touching anything if `output`
/// already exists, or if another writer creates it before this one finishes.
pub fn process_fastq(input: &Path, output: &Path, config: &EncodeConfig) -> Result<EncodeOutcome> {
    if output.exists() {
        info!("Output file {} exists, skipping", output.display());
        return Ok(EncodeOutcome::Skipped);
    }

    info!(
        "Encoding {} -> {} (k = {}, n = {}, filter = {:?})",
        input.display(),
        output.display(),
        config.window,
        config.max_records,
        config.filter
    );
    let start = Instant::now();

    let reader = open_fastq(input)?;
    let records = FastqStreamParser::new(reader, config.max_line_length);
    let (codes, stats) = encode_records(records, config)?;

    if write_artifact(output, &codes)?.is_none() {
        return Ok(EncodeOutcome::Skipped);
    }

    info!(
        "Packed {} bases from {}/{} records into {} bytes in {:.2?}",
        stats.total_bases,
        stats.records_accepted,
        stats.records_seen,
        stats.packed_bytes,
        start.elapsed()
    );
    Ok(EncodeOutcome::Written(stats))
}

/// Removes a stale artifact so the next run re-encodes it.
pub fn remove_artifact(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
