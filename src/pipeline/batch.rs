//! Manifest-driven batch encoding.
//!
//! Sources are independent, so they are encoded in parallel on a rayon pool,
//! each into its own artifact. The manifest lists them in source-list order;
//! each row is written and flushed as soon as it and every row before it are
//! known, so an interrupted batch keeps the rows it finished.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{error, info, warn};

use super::encode::{process_fastq, EncodeConfig, EncodeOutcome};
use crate::error::{PackError, Result};
use crate::io::manifest::{artifact_name, ManifestEntry, ManifestWriter};

/// Totals for one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub sources: usize,
    pub encoded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_bases: u64,
    pub entries: Vec<ManifestEntry>,
}

impl BatchSummary {
    fn record(
        &mut self,
        source: &Path,
        artifact: &Path,
        outcome: Result<EncodeOutcome>,
    ) -> &ManifestEntry {
        let total_bases = match outcome {
            Ok(EncodeOutcome::Written(stats)) => {
                self.encoded += 1;
                stats.total_bases
            }
            Ok(EncodeOutcome::Skipped) => {
                self.skipped += 1;
                0
            }
            Err(e) => {
                error!("Failed to encode {}: {}", source.display(), e);
                self.failed += 1;
                0
            }
        };
        self.total_bases += total_bases;
        self.entries.push(ManifestEntry {
            artifact: artifact.to_path_buf(),
            total_bases,
        });
        &self.entries[self.entries.len() - 1]
    }
}

/// Reorders results that arrive in any order back into index order.
struct InOrder<T> {
    slots: Vec<Option<T>>,
    next: usize,
}

impl<T> InOrder<T> {
    fn new(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            next: 0,
        }
    }

    fn insert(&mut self, index: usize, item: T) {
        self.slots[index] = Some(item);
    }

    /// Next item in index order, once it and all earlier ones have arrived.
    fn pop_ready(&mut self) -> Option<T> {
        let item = self.slots.get_mut(self.next)?.take()?;
        self.next += 1;
        Some(item)
    }
}

/// Marks every source whose artifact path was already claimed by an earlier
/// source in the list.
fn duplicate_artifacts(artifacts: &[PathBuf]) -> Vec<bool> {
    let mut claimed = HashSet::new();
    artifacts.iter().map(|a| !claimed.insert(a)).collect()
}

/// Encodes every source into `out_dir` and writes the manifest.
///
/// Returns `Ok(None)` if the manifest already exists, in which case nothing
/// is done. A source that cannot be read or encoded is logged, recorded with
/// zero bases and does not stop the batch. When two sources map to the same
/// artifact name, the first one in the list is encoded and the later ones
/// are skipped with zero bases.
pub fn run_batch(
    sources: &[PathBuf],
    out_dir: &Path,
    manifest: &Path,
    config: &EncodeConfig,
    threads: usize,
) -> Result<Option<BatchSummary>> {
    if manifest.exists() {
        info!("Manifest {} exists, nothing to do", manifest.display());
        return Ok(None);
    }

    std::fs::create_dir_all(out_dir)?;
    let mut writer = ManifestWriter::create(manifest)?;

    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| PackError::Io(std::io::Error::other(e)))?;

    let artifacts: Vec<PathBuf> = sources
        .iter()
        .map(|source| out_dir.join(artifact_name(source)))
        .collect();
    let duplicates = duplicate_artifacts(&artifacts);
    for ((source, artifact), _) in sources
        .iter()
        .zip(&artifacts)
        .zip(&duplicates)
        .filter(|(_, &dup)| dup)
    {
        warn!(
            "{} maps to {}, which an earlier source already claimed; skipping",
            source.display(),
            artifact.display()
        );
    }

    info!(
        "Encoding {} sources into {} with {} threads",
        sources.len(),
        out_dir.display(),
        pool.current_num_threads()
    );
    let start = Instant::now();

    let mut summary = BatchSummary {
        sources: sources.len(),
        ..Default::default()
    };
    let mut pending = InOrder::new(sources.len());
    let (tx, rx) = mpsc::channel();
    let (artifact_refs, duplicate_refs) = (&artifacts, &duplicates);

    pool.in_place_scope(|scope| -> Result<()> {
        scope.spawn(move |_| {
            sources
                .par_iter()
                .zip(artifact_refs)
                .zip(duplicate_refs)
                .enumerate()
                .for_each_with(tx, |tx, (index, ((source, artifact), &dup))| {
                    let outcome = if dup {
                        Ok(EncodeOutcome::Skipped)
                    } else {
                        process_fastq(source, artifact, config)
                    };
                    // The receiver only goes away if the manifest failed.
                    let _ = tx.send((index, outcome));
                });
        });

        for (index, outcome) in rx.iter() {
            pending.insert(index, outcome);
            while let Some(outcome) = pending.pop_ready() {
                let row = summary.entries.len();
                let entry = summary.record(&sources[row], &artifacts[row], outcome);
                writer.write_entry(entry)?;
            }
        }
        Ok(())
    })?;

    if summary.failed > 0 {
        warn!("{} of {} sources failed", summary.failed, summary.sources);
    }
    info!(
        "Batch complete: {} encoded, {} skipped, {} failed, {} bases in {:.2?}",
        summary.encoded,
        summary.skipped,
        summary.failed,
        summary.total_bases,
        start.elapsed()
    );

    Ok(Some(summary))
}
