//! Core value types for read counting.
//!
//! - [`CompressionKind`](types::CompressionKind): compression wrapper derived from a suffix
//! - [`ContentFormat`](types::ContentFormat): what the file contains
//! - [`InputArtifact`](artifact::InputArtifact): a path with its resolved format and compression
//! - [`CountResult`](result::CountResult): scalar or per-contig counts
//!
//! ## Suffix tables
//!
//! | Suffix | Resolves to |
//! |--------|-------------|
//! | `gz`, `gzip` | Gzip |
//! | `bz2`, `bzip2` | Bzip2 |
//! | `zip` | Zip |
//! | `fa`, `fas`, `fasta`, `fna`, `faa` | Fasta |
//! | `fq`, `fastq` | Fastq |
//! | `bam` | Bam |
//! | path contains `fastqc` | FastQC report |
//!
//! A compressed name such as `sample.fastq.gz` takes its format from the
//! second-to-last suffix.

pub mod artifact;
pub mod contig;
pub mod result;
pub mod types;
