//! Command-line interface for readcounter.
//!
//! One subcommand per input format, plus a generic `count` that infers the
//! format from the file name:
//!
//! - **fasta**, **fastq**: count `>` / `@` header lines (plain, gz, bz2 or zip)
//! - **fastqc**: read `Total Sequences` from a FastQC report folder or zip
//! - **bam**: per-contig counts of filtered alignments
//! - **sam**: recognized, not supported yet
//! - **count**: any of the above, with `--format`/`--compression` inference
//!
//! ## Usage
//!
//! ```text
//! readcounter fasta test.fasta -o counts/
//! readcounter fastq sample.fq.gz --prefix sample -f
//! readcounter fastqc sample1_fastqc.zip
//! readcounter bam aln.bam --min-map-qual 20 --min-read-len 30
//! readcounter count reads.fastq.bz2 --output-format json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::counting::alignment::{
    AlignmentConfig, AlignmentFilterPolicy, BAMCOV_PROGRAM, DEFAULT_BAMCOV_MEMORY,
};

pub mod count;
pub mod output;

#[derive(Parser)]
#[command(name = "readcounter")]
#[command(version)]
#[command(about = "Count reads in FASTA, FASTQ, FastQC and BAM files")]
#[command(
    long_about = "readcounter gives one uniform read count across sequencing file formats.\n\nFASTA/FASTQ files (optionally gzip, bzip2 or zip compressed) and FastQC reports produce a single `<name> : <count>` line. BAM files produce a per-contig table of reads passing the alignment filters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Minimum level of log messages
    #[arg(short, long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count sequences in a FASTA file
    Fasta(CommonArgs),

    /// Count reads in a FASTQ file
    Fastq(CommonArgs),

    /// Read the total sequence count from a FastQC report
    Fastqc(CommonArgs),

    /// Count filtered alignments per contig in a BAM file
    Bam(AlignmentArgs),

    /// SAM input (not supported yet)
    Sam(AlignmentArgs),

    /// Count reads in any supported file, inferring what is not given
    Count(count::CountArgs),
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Input file or FastQC report directory
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output prefix (default: input name without format/compression suffix)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "./")]
    pub output_dir: PathBuf,

    /// Overwrite an existing output file
    #[arg(short, long)]
    pub force: bool,
}

/// Alignment filters and accelerated-path settings
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Minimum read length
    #[arg(long, default_value = "0")]
    pub min_read_len: u32,

    /// Minimum number of aligned read bases
    #[arg(long, default_value = "0")]
    pub min_aln_len: u32,

    /// Minimum mapping quality
    #[arg(long, default_value = "0")]
    pub min_map_qual: u8,

    /// Minimum mean base quality
    #[arg(long, default_value = "0")]
    pub min_base_qual: u8,

    /// Try the external bamcov tool first, falling back on failure
    #[arg(long)]
    pub use_bamcov: bool,

    /// Memory budget handed to the accelerated path
    #[arg(long, default_value = DEFAULT_BAMCOV_MEMORY)]
    pub bamcov_mem: String,

    /// bamcov executable
    #[arg(long, default_value = BAMCOV_PROGRAM)]
    pub bamcov_path: PathBuf,
}

impl FilterArgs {
    #[must_use]
    pub fn to_config(&self) -> AlignmentConfig {
        AlignmentConfig {
            filter: AlignmentFilterPolicy {
                min_read_len: self.min_read_len,
                min_aln_len: self.min_aln_len,
                min_map_qual: self.min_map_qual,
                min_base_qual: self.min_base_qual,
            },
            use_bamcov: self.use_bamcov,
            bamcov_memory: self.bamcov_mem.clone(),
            bamcov_program: self.bamcov_path.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AlignmentArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            // tracing has no level above error
            Self::Critical | Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}
