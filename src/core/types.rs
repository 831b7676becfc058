use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Suffixes recognized as compression wrappers
pub const COMPRESSION_SUFFIXES: &[&str] = &["gz", "gzip", "bz2", "bzip2", "zip"];

/// Marker that identifies a FastQC report regardless of suffix
pub const FASTQC_MARKER: &str = "fastqc";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Unknown {kind} '{token}'")]
    UnknownToken { kind: &'static str, token: String },
}

/// Compression wrapper around an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    #[default]
    None,
    Gzip,
    Bzip2,
    Zip,
}

impl CompressionKind {
    /// Map a single suffix (without the dot) to a compression kind.
    ///
    /// Unrecognized suffixes are `None`, which is not an error.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.to_ascii_lowercase().as_str() {
            "gz" | "gzip" => Self::Gzip,
            "bz2" | "bzip2" => Self::Bzip2,
            "zip" => Self::Zip,
            _ => Self::None,
        }
    }

    /// Classify a path by its final suffix component
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        suffixes(path)
            .last()
            .map_or(Self::None, |suffix| Self::from_suffix(suffix))
    }

    #[must_use]
    pub fn is_compressed(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
            Self::Bzip2 => write!(f, "bzip2"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

impl FromStr for CompressionKind {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gz" | "gzip" => Ok(Self::Gzip),
            "bz2" | "bzip2" => Ok(Self::Bzip2),
            "zip" => Ok(Self::Zip),
            _ => Err(FormatError::UnknownToken {
                kind: "compression",
                token: s.to_string(),
            }),
        }
    }
}

/// Semantic content of an input artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Fasta,
    Fastq,
    FastqcReport,
    Bam,
    /// Declared but not countable yet
    Sam,
}

impl ContentFormat {
    /// Look up a content-format suffix (without the dot)
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "fa" | "fas" | "fasta" | "fna" | "faa" => Some(Self::Fasta),
            "fq" | "fastq" => Some(Self::Fastq),
            "bam" => Some(Self::Bam),
            "sam" => Some(Self::Sam),
            _ => None,
        }
    }

    /// Record-start marker for line-oriented sequence formats
    #[must_use]
    pub fn record_marker(self) -> Option<u8> {
        match self {
            Self::Fasta => Some(b'>'),
            Self::Fastq => Some(b'@'),
            _ => None,
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fasta => write!(f, "fasta"),
            Self::Fastq => write!(f, "fastq"),
            Self::FastqcReport => write!(f, "fastqc"),
            Self::Bam => write!(f, "bam"),
            Self::Sam => write!(f, "sam"),
        }
    }
}

impl FromStr for ContentFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fasta" => Ok(Self::Fasta),
            "fastq" => Ok(Self::Fastq),
            "fastqc" => Ok(Self::FastqcReport),
            "bam" => Ok(Self::Bam),
            "sam" => Ok(Self::Sam),
            _ => Err(FormatError::UnknownToken {
                kind: "format",
                token: s.to_string(),
            }),
        }
    }
}

/// Dot-separated suffix components of the path's final component.
///
/// `reads/sample.fastq.gz` yields `["fastq", "gz"]`; a name without a dot
/// yields nothing. Trailing separators are ignored, so `report_dir/` behaves
/// like `report_dir`.
pub(crate) fn suffixes(path: &Path) -> Vec<&str> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let mut parts = name.split('.');
    parts.next();
    parts.collect()
}

/// Resolve the content format and compression of an input.
///
/// `None` for either argument means "infer from the path". Declared values
/// pass through unchanged.
///
/// # Errors
///
/// Returns `FormatError::UnsupportedFormat` when the format must be inferred
/// and no suffix of the path maps to a known format.
pub fn resolve(
    path: &Path,
    declared_format: Option<ContentFormat>,
    declared_compression: Option<CompressionKind>,
) -> Result<(ContentFormat, CompressionKind), FormatError> {
    let compression = declared_compression.unwrap_or_else(|| CompressionKind::classify(path));
    let format = match declared_format {
        Some(format) => format,
        None => infer_format(path)?,
    };
    Ok((format, compression))
}

fn infer_format(path: &Path) -> Result<ContentFormat, FormatError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    // Report folders rarely carry a recognizable suffix
    if path.to_string_lossy().to_lowercase().contains(FASTQC_MARKER) {
        return Ok(ContentFormat::FastqcReport);
    }

    let parts = suffixes(path);
    let Some(last) = parts.last().copied() else {
        return Err(FormatError::UnsupportedFormat(name));
    };

    let format_suffix = if CompressionKind::from_suffix(last).is_compressed() {
        match parts.len().checked_sub(2).map(|i| parts[i]) {
            Some(inner) => inner,
            None => return Err(FormatError::UnsupportedFormat(last.to_string())),
        }
    } else {
        last
    };

    ContentFormat::from_suffix(format_suffix)
        .ok_or_else(|| FormatError::UnsupportedFormat(format_suffix.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_compression_suffixes() {
        let cases = [
            ("reads.fq.gz", CompressionKind::Gzip),
            ("reads.fq.gzip", CompressionKind::Gzip),
            ("reads.fq.bz2", CompressionKind::Bzip2),
            ("reads.fq.bzip2", CompressionKind::Bzip2),
            ("reads.fq.zip", CompressionKind::Zip),
            ("reads.fq", CompressionKind::None),
            ("reads.xz", CompressionKind::None),
            ("reads", CompressionKind::None),
        ];
        for (name, expected) in cases {
            assert_eq!(CompressionKind::classify(Path::new(name)), expected, "{name}");
        }
    }

    #[test]
    fn test_classify_ignores_dotted_directories() {
        assert_eq!(
            CompressionKind::classify(Path::new("run.gz/sample")),
            CompressionKind::None
        );
    }

    #[test]
    fn test_resolve_explicit_passthrough() {
        let resolved = resolve(
            Path::new("whatever.txt"),
            Some(ContentFormat::Fastq),
            Some(CompressionKind::Bzip2),
        )
        .unwrap();
        assert_eq!(resolved, (ContentFormat::Fastq, CompressionKind::Bzip2));
    }

    #[test]
    fn test_resolve_double_suffix() {
        let resolved = resolve(Path::new("sample.fastq.gz"), None, None).unwrap();
        assert_eq!(resolved, (ContentFormat::Fastq, CompressionKind::Gzip));

        let resolved = resolve(Path::new("/data/genome.fa.bz2"), None, None).unwrap();
        assert_eq!(resolved, (ContentFormat::Fasta, CompressionKind::Bzip2));
    }

    #[test]
    fn test_resolve_format_table() {
        for suffix in ["fa", "fas", "fasta", "fna", "faa"] {
            let path = format!("x.{suffix}");
            assert_eq!(infer_format(Path::new(&path)).unwrap(), ContentFormat::Fasta);
        }
        for suffix in ["fq", "fastq"] {
            let path = format!("x.{suffix}");
            assert_eq!(infer_format(Path::new(&path)).unwrap(), ContentFormat::Fastq);
        }
        assert_eq!(infer_format(Path::new("x.bam")).unwrap(), ContentFormat::Bam);
    }

    #[test]
    fn test_resolve_fastqc_marker_wins() {
        let resolved = resolve(Path::new("sample1_fastqc.zip"), None, None).unwrap();
        assert_eq!(resolved, (ContentFormat::FastqcReport, CompressionKind::Zip));

        let resolved = resolve(Path::new("out/sample2_fastqc/"), None, None).unwrap();
        assert_eq!(resolved, (ContentFormat::FastqcReport, CompressionKind::None));

        let resolved = resolve(Path::new("qc/fastqc_results/sample1"), None, None).unwrap();
        assert_eq!(resolved, (ContentFormat::FastqcReport, CompressionKind::None));
    }

    #[test]
    fn test_resolve_unsupported_suffix() {
        let err = resolve(Path::new("notes.txt"), None, None).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedFormat("txt".to_string()));

        let err = resolve(Path::new("table.csv.gz"), None, None).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedFormat("csv".to_string()));
    }

    #[test]
    fn test_resolve_bare_compression_suffix() {
        let err = resolve(Path::new("archive.gz"), None, None).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedFormat("gz".to_string()));
    }

    #[test]
    fn test_resolve_no_suffix() {
        let err = resolve(Path::new("reads"), None, None).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedFormat("reads".to_string()));
    }

    #[test]
    fn test_tokens_parse() {
        assert_eq!("gz".parse::<CompressionKind>().unwrap(), CompressionKind::Gzip);
        assert_eq!("NONE".parse::<CompressionKind>().unwrap(), CompressionKind::None);
        assert_eq!(
            "fastqc".parse::<ContentFormat>().unwrap(),
            ContentFormat::FastqcReport
        );
        assert!("xz".parse::<CompressionKind>().is_err());
        assert!("vcf".parse::<ContentFormat>().is_err());
    }
}
