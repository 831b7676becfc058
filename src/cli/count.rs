use clap::Args;
use tracing::info;

use crate::cli::output::{resolve_output, write_result};
use crate::cli::{CommonArgs, FilterArgs, OutputFormat};
use crate::core::artifact::InputArtifact;
use crate::core::types::{CompressionKind, ContentFormat};
use crate::counting::alignment::AlignmentConfig;
use crate::counting::dispatch::dispatch;

#[derive(Args, Debug, Clone)]
pub struct CountArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Content format
    #[arg(long, value_enum, default_value = "infer")]
    pub format: FormatToken,

    /// Compression wrapper
    #[arg(long, value_enum, default_value = "infer")]
    pub compression: CompressionToken,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatToken {
    Infer,
    Fasta,
    Fastq,
    Fastqc,
    Bam,
    Sam,
}

impl FormatToken {
    #[must_use]
    pub fn declared(self) -> Option<ContentFormat> {
        match self {
            Self::Infer => None,
            Self::Fasta => Some(ContentFormat::Fasta),
            Self::Fastq => Some(ContentFormat::Fastq),
            Self::Fastqc => Some(ContentFormat::FastqcReport),
            Self::Bam => Some(ContentFormat::Bam),
            Self::Sam => Some(ContentFormat::Sam),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CompressionToken {
    Infer,
    None,
    Gzip,
    Bzip2,
    Zip,
}

impl CompressionToken {
    #[must_use]
    pub fn declared(self) -> Option<CompressionKind> {
        match self {
            Self::Infer => None,
            Self::None => Some(CompressionKind::None),
            Self::Gzip => Some(CompressionKind::Gzip),
            Self::Bzip2 => Some(CompressionKind::Bzip2),
            Self::Zip => Some(CompressionKind::Zip),
        }
    }
}

/// Execute the generic count subcommand
///
/// # Errors
///
/// Returns an error if the format cannot be resolved, the output file exists,
/// or counting fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CountArgs, format: OutputFormat) -> anyhow::Result<()> {
    execute(
        &args.common,
        args.format.declared(),
        args.compression.declared(),
        &args.filters.to_config(),
        format,
    )
}

/// Execute a per-format subcommand: the format is fixed, compression inferred
///
/// # Errors
///
/// Returns an error if the output file exists or counting fails.
pub fn run_declared(
    common: &CommonArgs,
    content: ContentFormat,
    alignment: &AlignmentConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    execute(common, Some(content), None, alignment, format)
}

fn execute(
    common: &CommonArgs,
    declared_format: Option<ContentFormat>,
    declared_compression: Option<CompressionKind>,
    alignment: &AlignmentConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let artifact = InputArtifact::resolve(&common.input, declared_format, declared_compression)?;
    info!(
        format = %artifact.format(),
        compression = %artifact.compression(),
        "Resolved input"
    );

    let out_file = resolve_output(
        artifact.path(),
        common.prefix.as_deref(),
        &common.output_dir,
        common.force,
    )?;

    let result = dispatch(&artifact, alignment)?;
    write_result(&out_file, &result, format)?;
    info!(output = %out_file.display(), "Wrote read counts");

    Ok(())
}
