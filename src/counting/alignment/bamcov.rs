//! Optional accelerated counting through the external `bamcov` tool.
//!
//! `bamcov` reports per-contig read numbers in a samtools-coverage style table:
//!
//! ```text
//! #rname	startpos	endpos	numreads	covbases	coverage	meandepth	meanbaseq	meanmapq
//! chr1	1	248956422	1523	...
//! ```
//!
//! It understands only read length, mapping quality and base quality
//! thresholds. Alignment length and the duplicate/secondary/supplementary
//! exclusions are not applied on this path.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::core::contig::ReferenceSequence;
use crate::counting::alignment::filter::AlignmentFilterPolicy;
use crate::counting::CountError;

/// Default program name, looked up on `PATH`
pub const BAMCOV_PROGRAM: &str = "bamcov";

/// A faster, narrower per-contig counter
pub trait AcceleratedCounter {
    /// Count reads per contig
    ///
    /// # Errors
    ///
    /// Any error; callers fall back to record-by-record counting.
    fn count(
        &self,
        path: &Path,
        policy: &AlignmentFilterPolicy,
    ) -> Result<Vec<(ReferenceSequence, u64)>, CountError>;
}

/// Runs `bamcov` as a subprocess
#[derive(Debug, Clone)]
pub struct Bamcov {
    program: PathBuf,
    memory: String,
}

impl Bamcov {
    pub fn new(program: impl Into<PathBuf>, memory: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            memory: memory.into(),
        }
    }

    /// Command line for counting `input` into `output`
    #[must_use]
    pub fn command(&self, input: &Path, output: &Path, policy: &AlignmentFilterPolicy) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--output")
            .arg(output)
            .arg("--min-read-len")
            .arg(policy.min_read_len.to_string())
            .arg("--min-MQ")
            .arg(policy.min_map_qual.to_string())
            .arg("--min-BQ")
            .arg(policy.min_base_qual.to_string())
            .arg(input);
        cmd
    }
}

impl AcceleratedCounter for Bamcov {
    fn count(
        &self,
        path: &Path,
        policy: &AlignmentFilterPolicy,
    ) -> Result<Vec<(ReferenceSequence, u64)>, CountError> {
        let scratch = tempfile::tempdir()?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = scratch.path().join(format!("{stem}_bamcov.tsv"));

        let mut cmd = self.command(path, &output, policy);
        info!(command = ?cmd, "Counting mapped reads with bamcov");
        debug!(memory = %self.memory, "bamcov memory budget");

        let out = cmd.output().map_err(|e| CountError::ExternalToolFailure {
            tool: self.program.display().to_string(),
            detail: e.to_string(),
        })?;
        if !out.status.success() {
            return Err(CountError::ExternalToolFailure {
                tool: self.program.display().to_string(),
                detail: format!(
                    "{}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            });
        }

        let table = std::fs::read_to_string(&output)?;
        parse_coverage_table(&table)
    }
}

/// Parse `#rname`, `endpos` and `numreads` columns from a coverage table
///
/// # Errors
///
/// Returns `CountError::ExternalToolFailure` if the header lacks a required
/// column or a row holds a non-numeric value.
pub fn parse_coverage_table(text: &str) -> Result<Vec<(ReferenceSequence, u64)>, CountError> {
    let malformed = |detail: String| CountError::ExternalToolFailure {
        tool: BAMCOV_PROGRAM.to_string(),
        detail,
    };

    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| malformed("empty output".to_string()))?
        .split('\t')
        .collect();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| malformed(format!("missing column '{name}'")))
    };
    let name_col = column("#rname")?;
    let end_col = column("endpos")?;
    let reads_col = column("numreads")?;

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        let field = |col: usize| {
            fields
                .get(col)
                .copied()
                .ok_or_else(|| malformed(format!("row {} has {} fields", i + 1, fields.len())))
        };
        let number = |col: usize| -> Result<u64, CountError> {
            let value = field(col)?;
            value
                .trim()
                .parse()
                .map_err(|_| malformed(format!("row {}: invalid number '{value}'", i + 1)))
        };

        let reference = ReferenceSequence::new(field(name_col)?, number(end_col)?);
        rows.push((reference, number(reads_col)?));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coverage_table() {
        let table = "#rname\tstartpos\tendpos\tnumreads\tcovbases\tcoverage\tmeandepth\tmeanbaseq\tmeanmapq\n\
chr1\t1\t1000\t12\t400\t40\t0.6\t36\t60\n\
chr2\t1\t800\t0\t0\t0\t0\t0\t0\n";

        let rows = parse_coverage_table(table).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, ReferenceSequence::new("chr1", 1000));
        assert_eq!(rows[0].1, 12);
        assert_eq!(rows[1].1, 0);
    }

    #[test]
    fn test_parse_coverage_table_missing_column() {
        let result = parse_coverage_table("#rname\tendpos\nchr1\t10\n");
        assert!(matches!(result, Err(CountError::ExternalToolFailure { .. })));
    }

    #[test]
    fn test_parse_coverage_table_bad_number() {
        let result = parse_coverage_table("#rname\tendpos\tnumreads\nchr1\t10\tlots\n");
        assert!(matches!(result, Err(CountError::ExternalToolFailure { .. })));
    }

    #[test]
    fn test_command_line() {
        let bamcov = Bamcov::new("bamcov", "10G");
        let policy = AlignmentFilterPolicy {
            min_read_len: 30,
            min_aln_len: 50,
            min_map_qual: 20,
            min_base_qual: 15,
        };
        let cmd = bamcov.command(Path::new("in.bam"), Path::new("out.tsv"), &policy);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--output",
                "out.tsv",
                "--min-read-len",
                "30",
                "--min-MQ",
                "20",
                "--min-BQ",
                "15",
                "in.bam"
            ]
        );
    }

    #[test]
    fn test_missing_program_is_tool_failure() {
        let bamcov = Bamcov::new("/nonexistent/bamcov", "1G");
        let result = bamcov.count(Path::new("in.bam"), &AlignmentFilterPolicy::default());
        assert!(matches!(result, Err(CountError::ExternalToolFailure { .. })));
    }
}
