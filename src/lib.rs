//! # readcounter
//!
//! Uniform read counts across sequencing file formats.
//!
//! Each input is classified by its content format (FASTA, FASTQ, FastQC
//! report, BAM) and compression wrapper (none, gzip, bzip2, zip), then routed
//! to the counter for that format:
//!
//! - **FASTA/FASTQ**: number of record header lines (`>` or `@`)
//! - **FastQC report**: the `Total Sequences` value, from a folder or a zip
//! - **BAM**: per-contig counts of alignments passing the filters, with
//!   automatic sort-and-reindex recovery for unsorted input
//!
//! ## Example
//!
//! ```rust,no_run
//! use readcounter::{dispatch, AlignmentConfig, InputArtifact};
//!
//! let artifact = InputArtifact::resolve("reads/sample.fq.gz", None, None).unwrap();
//! let result = dispatch(&artifact, &AlignmentConfig::default()).unwrap();
//! print!("{}", result.to_text());
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Format/compression classification, inputs and results
//! - [`counting`]: The per-format counters and the dispatcher
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod counting;

pub use core::artifact::InputArtifact;
pub use core::contig::{ContigCount, ReferenceSequence};
pub use core::result::CountResult;
pub use core::types::*;
pub use counting::alignment::{AlignmentConfig, AlignmentFilterPolicy};
pub use counting::dispatch::{dispatch, Counter};
pub use counting::CountError;
