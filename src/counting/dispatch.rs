use crate::core::artifact::InputArtifact;
use crate::core::result::CountResult;
use crate::core::types::ContentFormat;
use crate::counting::alignment::{AlignmentConfig, AlignmentCounter};
use crate::counting::context::CountContext;
use crate::counting::fastqc::FastqcCounter;
use crate::counting::sequence::SequenceCounter;
use crate::counting::CountError;

/// The counter selected for one input
pub enum Counter {
    Fasta(SequenceCounter),
    Fastq(SequenceCounter),
    FastqcReport(FastqcCounter),
    Bam(AlignmentCounter),
}

impl Counter {
    /// Select the counter for `format`
    ///
    /// # Errors
    ///
    /// Returns `CountError::UnsupportedFormat` for SAM, which has no counter.
    pub fn for_format(format: ContentFormat, alignment: &AlignmentConfig) -> Result<Self, CountError> {
        match format {
            ContentFormat::Fasta => Ok(Self::Fasta(SequenceCounter::fasta())),
            ContentFormat::Fastq => Ok(Self::Fastq(SequenceCounter::fastq())),
            ContentFormat::FastqcReport => Ok(Self::FastqcReport(FastqcCounter)),
            ContentFormat::Bam => Ok(Self::Bam(AlignmentCounter::new(alignment))),
            ContentFormat::Sam => Err(CountError::UnsupportedFormat(
                "sam (convert to BAM first)".to_string(),
            )),
        }
    }

    /// Run the counter on `artifact`, surfacing its result or error unchanged
    ///
    /// # Errors
    ///
    /// Returns whatever error the selected counter reports.
    pub fn run(&self, ctx: &CountContext, artifact: &InputArtifact) -> Result<CountResult, CountError> {
        let path = artifact.path();
        match self {
            Self::Fasta(counter) | Self::Fastq(counter) => {
                let count = counter.count(ctx, path, artifact.compression())?;
                Ok(CountResult::scalar(artifact.label(), count))
            }
            Self::FastqcReport(counter) => {
                let count = counter.count(ctx, path, artifact.compression())?;
                Ok(CountResult::scalar(artifact.label(), count))
            }
            Self::Bam(counter) => Ok(CountResult::Tabular(counter.count(ctx, path)?)),
        }
    }
}

/// Count reads in `artifact` with the counter its format calls for
///
/// # Errors
///
/// Returns `CountError::UnsupportedFormat` for SAM input, or the selected
/// counter's error.
pub fn dispatch(artifact: &InputArtifact, alignment: &AlignmentConfig) -> Result<CountResult, CountError> {
    let ctx = CountContext::new(artifact.path(), artifact.format(), artifact.compression());
    let counter = Counter::for_format(artifact.format(), alignment)?;
    counter.run(&ctx, artifact)
}
