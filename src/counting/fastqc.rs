//! Counter for FastQC reports.
//!
//! FastQC writes the total number of reads it saw into `fastqc_data.txt`:
//!
//! ```text
//! >>Basic Statistics	pass
//! #Measure	Value
//! Filename	sample1.fastq.gz
//! File type	Conventional base calls
//! Total Sequences	12733986
//! ```
//!
//! The report is either an unpacked directory or the `.zip` bundle FastQC
//! produces. Zipped reports are unpacked next to the archive, read, and the
//! unpacked directory removed again.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::types::CompressionKind;
use crate::counting::context::CountContext;
use crate::counting::CountError;

/// Name of the data file inside a report directory
pub const FASTQC_DATA_FILE: &str = "fastqc_data.txt";

/// Prefix of the summary line holding the read count
pub const TOTAL_SEQUENCES: &str = "Total Sequences";

#[derive(Debug, Clone, Copy, Default)]
pub struct FastqcCounter;

impl FastqcCounter {
    /// Read the pre-computed read count from a FastQC report
    ///
    /// # Errors
    ///
    /// Returns `CountError::ExternalToolFailure` if a zipped report cannot be
    /// unpacked, or `CountError::MalformedReport` if the data file or its
    /// `Total Sequences` line is missing.
    pub fn count(
        &self,
        ctx: &CountContext,
        path: &Path,
        compression: CompressionKind,
    ) -> Result<u64, CountError> {
        ctx.in_scope(|| match compression {
            CompressionKind::Zip => count_zipped(path),
            CompressionKind::None => read_total_sequences(&path.join(FASTQC_DATA_FILE)),
            other => Err(CountError::UnsupportedFormat(format!(
                "FastQC report compressed with {other}"
            ))),
        })
    }
}

fn count_zipped(archive_path: &Path) -> Result<u64, CountError> {
    let report_dir = unpacked_dir(archive_path)?;
    let pre_existing = report_dir.exists();

    // Cleaned up below whether or not extraction completes
    let result = unpack(archive_path)
        .and_then(|()| read_total_sequences(&report_dir.join(FASTQC_DATA_FILE)));

    if pre_existing {
        debug!(dir = %report_dir.display(), "Report directory existed before unpacking, leaving it in place");
    } else if report_dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&report_dir) {
            warn!(dir = %report_dir.display(), error = %e, "Failed to remove unpacked report directory");
        }
    }

    result
}

/// Sibling directory a report archive unpacks into, e.g.
/// `out/sample1_fastqc.zip` -> `out/sample1_fastqc`
fn unpacked_dir(archive_path: &Path) -> Result<PathBuf, CountError> {
    let absolute = std::path::absolute(archive_path)?;
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".zip")
        .or_else(|| name.strip_suffix(".ZIP"))
        .unwrap_or(&name);
    let parent = absolute.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(stem))
}

fn unpack(archive_path: &Path) -> Result<(), CountError> {
    let failure = |detail: String| CountError::ExternalToolFailure {
        tool: "unzip".to_string(),
        detail: format!("{}: {detail}", archive_path.display()),
    };

    let absolute = std::path::absolute(archive_path)?;
    let target = absolute.parent().unwrap_or_else(|| Path::new("."));
    info!(target = %target.display(), "Unpacking FastQC report");

    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| failure(e.to_string()))?;
    archive.extract(target).map_err(|e| failure(e.to_string()))
}

/// Extract the read count from a `fastqc_data.txt` file
///
/// # Errors
///
/// Returns `CountError::MalformedReport` if the file cannot be opened or the
/// `Total Sequences` line is missing or not numeric.
pub fn read_total_sequences(data_file: &Path) -> Result<u64, CountError> {
    let file = File::open(data_file).map_err(|e| {
        CountError::MalformedReport(format!("cannot open {}: {e}", data_file.display()))
    })?;
    parse_total_sequences(BufReader::new(file)).map_err(|e| match e {
        CountError::MalformedReport(msg) => {
            CountError::MalformedReport(format!("{}: {msg}", data_file.display()))
        }
        other => other,
    })
}

/// Parse the `Total Sequences` value from report text
///
/// # Errors
///
/// Returns `CountError::MalformedReport` if no line starts with
/// `Total Sequences` or its final token is not a non-negative integer.
pub fn parse_total_sequences<R: BufRead>(reader: R) -> Result<u64, CountError> {
    for line in reader.lines() {
        let line = line?;
        if !line.starts_with(TOTAL_SEQUENCES) {
            continue;
        }
        let value = line.split_whitespace().last().unwrap_or_default();
        return value.parse().map_err(|_| {
            CountError::MalformedReport(format!("invalid {TOTAL_SEQUENCES} value '{value}'"))
        });
    }

    Err(CountError::MalformedReport(format!(
        "no '{TOTAL_SEQUENCES}' line found"
    )))
}
