use crate::codec::packed_array::PackedArray;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Stats {
    pub file_bytes: usize,
    pub total_bases: usize,
    pub count_a: u64,
    pub count_c: u64,
    pub count_g: u64,
    pub count_t: u64,
    pub gc_content: f64,
}

/// Base composition of a packed array.
pub fn array_stats(array: &PackedArray) -> Stats {
    let [a, c, g, t] = array.composition();
    let total = array.len();
    let gc_content = if total > 0 {
        (c + g) as f64 / total as f64
    } else {
        0.0
    };

    Stats {
        file_bytes: array.as_bytes().len(),
        total_bases: total,
        count_a: a,
        count_c: c,
        count_g: g,
        count_t: t,
        gc_content,
    }
}

/// Opens a packed artifact holding `total_bases` codes and computes its stats.
pub fn calculate_stats(path: &Path, total_bases: usize) -> Result<Stats> {
    let array = PackedArray::open(path, total_bases)?;
    Ok(array_stats(&array))
}

/// Tab-separated header plus one data row.
pub fn format_tsv(stats: &Stats) -> String {
    format!(
        "bytes\tbases\tA\tC\tG\tT\tgc\n{}\t{}\t{}\t{}\t{}\t{}\t{:.4}",
        stats.file_bytes,
        stats.total_bases,
        stats.count_a,
        stats.count_c,
        stats.count_g,
        stats.count_t,
        stats.gc_content
    )
}
