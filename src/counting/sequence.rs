//! Record counters for FASTA and FASTQ files.
//!
//! Records are counted structurally: every line whose first byte is the
//! format's record-start marker (`>` for FASTA, `@` for FASTQ) is one record.
//! Full record boundaries are not parsed.
//!
//! Compressed inputs are decoded on the fly:
//! - `none`: plain buffered read
//! - `gzip`: multi-member gzip stream (also covers bgzip)
//! - `bzip2`: multi-stream bzip2
//! - `zip`: the first file entry in the archive

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::core::types::{CompressionKind, ContentFormat};
use crate::counting::context::CountContext;
use crate::counting::CountError;

/// Capability that counts marker-prefixed lines in a possibly compressed file
pub trait LineCounter {
    /// Count lines whose first byte is `marker`
    ///
    /// # Errors
    ///
    /// Returns `CountError::Io` if the file cannot be opened or read, or
    /// `CountError::ExternalToolFailure` if decompression fails.
    fn count_marked_lines(
        &self,
        path: &Path,
        compression: CompressionKind,
        marker: u8,
    ) -> Result<u64, CountError>;
}

/// Line counter that decodes compressed input in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingLineCounter;

impl LineCounter for StreamingLineCounter {
    fn count_marked_lines(
        &self,
        path: &Path,
        compression: CompressionKind,
        marker: u8,
    ) -> Result<u64, CountError> {
        let file = File::open(path)?;
        let decode_failure = |e: io::Error| CountError::ExternalToolFailure {
            tool: compression.to_string(),
            detail: format!("{}: {e}", path.display()),
        };

        match compression {
            CompressionKind::None => Ok(count_marked(BufReader::new(file), marker)?),
            CompressionKind::Gzip => {
                count_marked(BufReader::new(MultiGzDecoder::new(file)), marker).map_err(decode_failure)
            }
            CompressionKind::Bzip2 => {
                count_marked(BufReader::new(MultiBzDecoder::new(file)), marker).map_err(decode_failure)
            }
            CompressionKind::Zip => {
                let mut archive = zip::ZipArchive::new(file).map_err(|e| {
                    CountError::ExternalToolFailure {
                        tool: compression.to_string(),
                        detail: format!("{}: {e}", path.display()),
                    }
                })?;
                let index = first_file_entry(&mut archive).ok_or_else(|| {
                    CountError::ExternalToolFailure {
                        tool: compression.to_string(),
                        detail: format!("{}: archive has no file entries", path.display()),
                    }
                })?;
                let entry = archive
                    .by_index(index)
                    .map_err(|e| decode_failure(io::Error::other(e)))?;
                debug!(entry = entry.name(), "Counting zip entry");
                count_marked(BufReader::new(entry), marker).map_err(decode_failure)
            }
        }
    }
}

fn first_file_entry<R: io::Read + io::Seek>(archive: &mut zip::ZipArchive<R>) -> Option<usize> {
    (0..archive.len()).find(|&i| archive.by_index(i).is_ok_and(|entry| !entry.is_dir()))
}

/// Count lines whose first byte is `marker`, streaming through the reader
///
/// # Errors
///
/// Returns any error raised by the underlying reader.
pub fn count_marked<R: BufRead>(mut reader: R, marker: u8) -> io::Result<u64> {
    let mut count = 0u64;
    let mut at_line_start = true;

    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        for &byte in buf {
            if at_line_start && byte == marker {
                count += 1;
            }
            at_line_start = byte == b'\n';
        }
        let len = buf.len();
        reader.consume(len);
    }

    Ok(count)
}

/// Counter for FASTA or FASTQ files
#[derive(Debug, Clone, Copy)]
pub struct SequenceCounter<L = StreamingLineCounter> {
    format: ContentFormat,
    lines: L,
}

impl SequenceCounter {
    #[must_use]
    pub fn fasta() -> Self {
        Self::with_line_counter(ContentFormat::Fasta, StreamingLineCounter)
    }

    #[must_use]
    pub fn fastq() -> Self {
        Self::with_line_counter(ContentFormat::Fastq, StreamingLineCounter)
    }
}

impl<L: LineCounter> SequenceCounter<L> {
    /// Build a counter with a custom line counter.
    ///
    /// # Panics
    ///
    /// Panics if `format` has no record-start marker.
    pub fn with_line_counter(format: ContentFormat, lines: L) -> Self {
        assert!(
            format.record_marker().is_some(),
            "{format} is not a line-oriented sequence format"
        );
        Self { format, lines }
    }

    #[must_use]
    pub fn format(&self) -> ContentFormat {
        self.format
    }

    /// Count records in `path`
    ///
    /// # Errors
    ///
    /// Propagates any error from the line counter; a failed scan is never
    /// reported as zero records.
    pub fn count(
        &self,
        ctx: &CountContext,
        path: &Path,
        compression: CompressionKind,
    ) -> Result<u64, CountError> {
        let marker = self
            .format
            .record_marker()
            .ok_or_else(|| CountError::UnsupportedFormat(self.format.to_string()))?;

        ctx.in_scope(|| {
            debug!(marker = %char::from(marker), "Scanning for record headers");
            let count = self.lines.count_marked_lines(path, compression, marker)?;
            debug!(count, "Scan complete");
            Ok(count)
        })
    }
}
