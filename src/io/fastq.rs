// src/io/fastq.rs
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{PackError, Result};

/// Longest line accepted by default, in bytes (excluding the line ending).
pub const MAX_LINE_LENGTH: usize = 1 << 20;

/// One 4-line record. Lines are kept as raw bytes without their line ending;
/// nothing requires them to be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub header: Vec<u8>,
    pub sequence: Vec<u8>,
    pub plus: Vec<u8>,
    pub quality: Vec<u8>,
}

impl FastqRecord {
    /// Header line for log messages, with invalid UTF-8 replaced.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.header)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Opens a FASTQ file, transparently decompressing `.gz` input.
pub fn open_fastq(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        PackError::Io(io::Error::new(
            e.kind(),
            format!("unable to open FASTQ file {}: {}", path.display(), e),
        ))
    })?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Stream FASTQ records with the default line length limit.
pub fn stream_fastq_records<R: BufRead>(reader: R) -> FastqStreamParser<R> {
    FastqStreamParser::new(reader, MAX_LINE_LENGTH)
}

/// Streaming 4-line FASTQ parser.
///
/// Each line is read with a cap of `max_line_length` bytes; a longer
/// line is reported as `LineTooLong` instead of being truncated. Blank lines
/// between records are skipped. The line buffer is kept across reads, so its
/// capacity settles at the longest line seen.
pub struct FastqStreamParser<R> {
    reader: R,
    max_line_length: usize,
    line_no: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> FastqStreamParser<R> {
    pub fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            reader,
            max_line_length,
            line_no: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.buf.clear();
        // Allow room for "\r\n" on top of the content limit.
        let cap = self.max_line_length as u64 + 2;
        let n = self
            .reader
            .by_ref()
            .take(cap)
            .read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let terminated = self.buf.last() == Some(&b'\n');
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        if self.buf.len() > self.max_line_length || (!terminated && n as u64 == cap) {
            return Err(PackError::LineTooLong {
                line: self.line_no,
                limit: self.max_line_length,
            });
        }

        Ok(Some(self.buf.to_vec()))
    }

    fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        let header = loop {
            match self.read_line()? {
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
                None => return Ok(None),
            }
        };
        let start = self.line_no;

        let mut rest = [Vec::new(), Vec::new(), Vec::new()];
        for slot in rest.iter_mut() {
            *slot = self
                .read_line()?
                .ok_or(PackError::TruncatedRecord { line: start })?;
        }
        let [sequence, plus, quality] = rest;

        Ok(Some(FastqRecord {
            header,
            sequence,
            plus,
            quality,
        }))
    }
}

impl<R: BufRead> Iterator for FastqStreamParser<R> {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub enum FastqWriter {
    Plain(BufWriter<File>),
    Compressed(BufWriter<GzEncoder<File>>),
}

impl FastqWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        if is_gzip(path) {
            let encoder = GzEncoder::new(file, Compression::default());
            Ok(FastqWriter::Compressed(BufWriter::new(encoder)))
        } else {
            Ok(FastqWriter::Plain(BufWriter::new(file)))
        }
    }

    fn sink(&mut self) -> &mut dyn Write {
        match self {
            FastqWriter::Plain(writer) => writer,
            FastqWriter::Compressed(writer) => writer,
        }
    }

    pub fn write_record(&mut self, record: &FastqRecord) -> io::Result<()> {
        let w = self.sink();
        for line in [&record.header, &record.sequence, &record.plus, &record.quality] {
            w.write_all(line)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Flushes buffered data and, for gzip output, writes the trailer.
    pub fn finish(self) -> io::Result<()> {
        match self {
            FastqWriter::Plain(mut writer) => writer.flush(),
            FastqWriter::Compressed(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
                Ok(())
            }
        }
    }
}
