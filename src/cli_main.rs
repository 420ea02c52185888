use clap::{Parser, Subcommand, ValueEnum};
use dnapack::pipeline::encode::WindowFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dnapack", version, about = "Pack FASTQ read windows into 2-bit nucleotide arrays", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode the first K bases of up to N reads from one FASTQ(.gz) file
    Encode {
        /// Input FASTQ(.gz) file
        #[arg(short = 'q', long)]
        fastq: PathBuf,

        /// Output packed file
        #[arg(short, long)]
        output: PathBuf,

        /// Bases kept per read
        #[arg(short = 'k', long, default_value_t = 32)]
        kmer_length: usize,

        /// Maximum number of reads to encode
        #[arg(short = 'n', long, default_value_t = 1_000_000)]
        num_reads: usize,

        /// Which bases the N/alphabet filter looks at
        #[arg(long, value_enum, default_value_t = WindowFilter::FullLine)]
        filter: WindowFilter,

        /// Reject input lines longer than this many bytes
        #[arg(long, default_value_t = dnapack::io::fastq::MAX_LINE_LENGTH)]
        max_line_length: usize,

        /// Re-encode even if the output file exists
        #[arg(long)]
        force: bool,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode every FASTQ file listed in a text file and write a CSV manifest
    Batch {
        /// Text file listing FASTQ files, one per line
        #[arg(short, long)]
        input: PathBuf,

        /// Manifest (log) file; the batch is skipped if it exists
        #[arg(short, long)]
        log: PathBuf,

        /// Directory for the packed files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Bases kept per read
        #[arg(short = 'k', long, default_value_t = 32)]
        kmer_length: usize,

        /// Maximum number of reads to encode per file
        #[arg(short = 'n', long, default_value_t = 1_000_000)]
        num_reads: usize,

        /// Which bases the N/alphabet filter looks at
        #[arg(long, value_enum, default_value_t = WindowFilter::FullLine)]
        filter: WindowFilter,

        /// Reject input lines longer than this many bytes
        #[arg(long, default_value_t = dnapack::io::fastq::MAX_LINE_LENGTH)]
        max_line_length: usize,

        /// Number of threads
        #[arg(long, default_value_t = num_cpus::get())]
        threads: usize,
    },

    /// Unpack a packed file back into base letters
    Decode {
        /// Packed input file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of bases stored in the file
        #[arg(short, long)]
        count: usize,

        /// Output text file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bases per output line, e.g. the K used when encoding
        #[arg(long)]
        width: Option<usize>,
    },

    /// Report size and base composition of a packed file
    Inspect {
        /// Packed input file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of bases stored in the file
        #[arg(short, long)]
        count: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Tsv)]
        format: ReportFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Tsv,
}
