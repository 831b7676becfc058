//! Counters for each supported content format and the dispatcher that picks one.
//!
//! | Format | Counter | Result |
//! |--------|---------|--------|
//! | FASTA  | [`SequenceCounter`](sequence::SequenceCounter) (`>` lines) | scalar |
//! | FASTQ  | [`SequenceCounter`](sequence::SequenceCounter) (`@` lines) | scalar |
//! | FastQC | [`FastqcCounter`](fastqc::FastqcCounter) (`Total Sequences`) | scalar |
//! | BAM    | [`AlignmentCounter`](alignment::AlignmentCounter) | per contig |
//!
//! SAM input is recognized but not counted.

pub mod alignment;
pub mod context;
pub mod dispatch;
pub mod fastqc;
pub mod sequence;

use thiserror::Error;

use crate::core::types::FormatError;

#[derive(Error, Debug)]
pub enum CountError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed FastQC report: {0}")]
    MalformedReport(String),

    #[error("{tool} failed: {detail}")]
    ExternalToolFailure { tool: String, detail: String },

    #[error("Alignment file is not coordinate-sorted: {0}")]
    UnsortedInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("noodles error: {0}")]
    Noodles(String),
}

impl From<FormatError> for CountError {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::UnsupportedFormat(suffix) => Self::UnsupportedFormat(suffix),
            other @ FormatError::UnknownToken { .. } => Self::UnsupportedFormat(other.to_string()),
        }
    }
}
