//! Batch manifest (`file_path,total_base`) and source list handling.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

pub const MANIFEST_HEADER: &str = "file_path,total_base";

/// One manifest row: the artifact path and the number of bases packed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub artifact: PathBuf,
    pub total_bases: u64,
}

/// Line-flushed CSV writer for the batch manifest.
pub struct ManifestWriter<W: Write> {
    inner: W,
}

impl ManifestWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> ManifestWriter<W> {
    /// Writes the header line.
    pub fn new(mut inner: W) -> Result<Self> {
        writeln!(inner, "{}", MANIFEST_HEADER)?;
        inner.flush()?;
        Ok(Self { inner })
    }

    /// Appends a row and flushes, so a killed batch leaves a usable manifest.
    pub fn write_entry(&mut self, entry: &ManifestEntry) -> Result<()> {
        let path = entry.artifact.display().to_string().replace('"', "\"\"");
        writeln!(self.inner, "\"{}\",{}", path, entry.total_bases)?;
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads a manifest back into entries. Lines that do not parse are skipped.
pub fn read_manifest<R: BufRead>(reader: R) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        let Some((path, count)) = line.rsplit_once(',') else {
            continue;
        };
        let Ok(total_bases) = count.trim().parse::<u64>() else {
            continue;
        };
        let path = path
            .strip_prefix('"')
            .and_then(|p| p.strip_suffix('"'))
            .unwrap_or(path)
            .replace("\"\"", "\"");
        entries.push(ManifestEntry {
            artifact: PathBuf::from(path),
            total_bases,
        });
    }
    Ok(entries)
}

/// Reads a source list: one path per line, blank lines and `#` comments ignored.
pub fn read_source_list(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("unable to open source list {}: {}", path.display(), e),
        )
    })?;

    let mut sources = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        sources.push(PathBuf::from(trimmed));
    }
    Ok(sources)
}

/// Output artifact name for a source: its file name with `.bin` appended.
pub fn artifact_name(source: &Path) -> PathBuf {
    let mut name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| source.as_os_str().to_os_string());
    name.push(".bin");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_manifest_format() {
        let mut writer = ManifestWriter::new(Vec::new()).unwrap();
        writer
            .write_entry(&ManifestEntry {
                artifact: PathBuf::from("a.fastq.gz.bin"),
                total_bases: 64,
            })
            .unwrap();
        writer
            .write_entry(&ManifestEntry {
                artifact: PathBuf::from("b.fastq.bin"),
                total_bases: 0,
            })
            .unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "file_path,total_base\n\"a.fastq.gz.bin\",64\n\"b.fastq.bin\",0\n"
        );
    }

    #[test]
    fn test_read_manifest() {
        let text = "file_path,total_base\n\"x,y.bin\",12\n\"z.bin\",3\nbroken\n";
        let entries = read_manifest(Cursor::new(text)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].artifact, PathBuf::from("x,y.bin"));
        assert_eq!(entries[0].total_bases, 12);
        assert_eq!(entries[1].total_bases, 3);
    }

    #[test]
    fn test_read_source_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "/data/a.fastq.gz").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# skipped").unwrap();
        writeln!(file, "  /data/b.fastq  ").unwrap();
        file.flush().unwrap();

        let sources = read_source_list(file.path()).unwrap();
        assert_eq!(
            sources,
            vec![PathBuf::from("/data/a.fastq.gz"), PathBuf::from("/data/b.fastq")]
        );
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(
            artifact_name(Path::new("/data/run1/sample.fastq.gz")),
            PathBuf::from("sample.fastq.gz.bin")
        );
        assert_eq!(artifact_name(Path::new("reads.fq")), PathBuf::from("reads.fq.bin"));
    }
}
