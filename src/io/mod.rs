pub mod fastq;
pub mod manifest;
