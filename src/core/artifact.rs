use std::path::{Path, PathBuf};

use crate::core::types::{resolve, CompressionKind, ContentFormat, FormatError};

/// An input file or report directory with its resolved format and compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArtifact {
    path: PathBuf,
    format: ContentFormat,
    compression: CompressionKind,
}

impl InputArtifact {
    /// Resolve an artifact, inferring whatever was not declared.
    ///
    /// # Errors
    ///
    /// Returns `FormatError::UnsupportedFormat` if the format has to be inferred
    /// and the path carries no recognizable suffix.
    pub fn resolve(
        path: impl Into<PathBuf>,
        declared_format: Option<ContentFormat>,
        declared_compression: Option<CompressionKind>,
    ) -> Result<Self, FormatError> {
        let path = path.into();
        let (format, compression) = resolve(&path, declared_format, declared_compression)?;
        Ok(Self {
            path,
            format,
            compression,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn format(&self) -> ContentFormat {
        self.format
    }

    #[must_use]
    pub fn compression(&self) -> CompressionKind {
        self.compression
    }

    /// Label used in scalar output lines
    #[must_use]
    pub fn label(&self) -> String {
        display_label(&self.path)
    }
}

/// Derive the display label of an input path.
///
/// The final extension is always removed; when that extension was a
/// compression suffix one more extension is removed, so `test.fq.gz` and
/// `test.fasta` both become `test` and `sample1_fastqc.zip` becomes
/// `sample1_fastqc`. Names without a dot are returned as-is.
#[must_use]
pub fn display_label(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return path.to_string_lossy().into_owned();
    };
    let name = Path::new(name);

    let Some(stem) = name.file_stem() else {
        return name.to_string_lossy().into_owned();
    };
    let was_compressed = name
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CompressionKind::from_suffix(e).is_compressed());

    let stem = Path::new(stem);
    if was_compressed {
        if let Some(inner) = stem.file_stem() {
            return inner.to_string_lossy().into_owned();
        }
    }
    stem.to_string_lossy().into_owned()
}
