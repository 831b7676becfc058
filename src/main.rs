use clap::Parser;
use tracing_subscriber::EnvFilter;

use readcounter::cli::{self, count, Commands};
use readcounter::core::types::ContentFormat;
use readcounter::counting::alignment::AlignmentConfig;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("readcounter={}", cli.log_level.directive())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let format = cli.output_format;
    match cli.command {
        Commands::Fasta(args) => {
            count::run_declared(&args, ContentFormat::Fasta, &AlignmentConfig::default(), format)?;
        }
        Commands::Fastq(args) => {
            count::run_declared(&args, ContentFormat::Fastq, &AlignmentConfig::default(), format)?;
        }
        Commands::Fastqc(args) => {
            count::run_declared(
                &args,
                ContentFormat::FastqcReport,
                &AlignmentConfig::default(),
                format,
            )?;
        }
        Commands::Bam(args) => {
            count::run_declared(&args.common, ContentFormat::Bam, &args.filters.to_config(), format)?;
        }
        Commands::Sam(args) => {
            count::run_declared(&args.common, ContentFormat::Sam, &args.filters.to_config(), format)?;
        }
        Commands::Count(args) => {
            count::run(args, format)?;
        }
    }

    Ok(())
}
