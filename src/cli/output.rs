use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::artifact::display_label;
use crate::core::result::CountResult;
use crate::cli::OutputFormat;

/// Suffix of every output file
pub const OUTPUT_SUFFIX: &str = ".txt";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Output file {0} already exists, back it up or pass --force to overwrite")]
    OutputExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decide where the result for `input` is written.
///
/// Creates `output_dir` if needed. Without a prefix the input's display label
/// is used, so `reads/test.fq.gz` becomes `<output_dir>/test.txt`.
///
/// # Errors
///
/// Returns `OutputError::OutputExists` if the file exists and `force` is not
/// set, or `OutputError::Io` if the directory cannot be created.
pub fn resolve_output(
    input: &Path,
    prefix: Option<&str>,
    output_dir: &Path,
    force: bool,
) -> Result<PathBuf, OutputError> {
    if !output_dir.exists() {
        debug!(dir = %output_dir.display(), "Creating output directory");
        std::fs::create_dir_all(output_dir)?;
    }

    let prefix = prefix.map_or_else(|| display_label(input), str::to_string);
    info!(prefix = %prefix, "Output prefix");

    let out_file = output_dir.join(format!("{prefix}{OUTPUT_SUFFIX}"));
    info!(output = %out_file.display(), "Output file");

    if out_file.exists() {
        if force {
            warn!(output = %out_file.display(), "Output file exists, will be overwritten");
        } else {
            return Err(OutputError::OutputExists(out_file));
        }
    }

    Ok(out_file)
}

/// Render `result` in `format`
///
/// # Errors
///
/// Returns `OutputError::Json` if JSON serialization fails.
pub fn render(result: &CountResult, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(result.to_text()),
        OutputFormat::Json => Ok(result.to_json()?),
    }
}

/// Write a rendered result
///
/// # Errors
///
/// Returns `OutputError` if rendering or writing fails.
pub fn write_result(path: &Path, result: &CountResult, format: OutputFormat) -> Result<(), OutputError> {
    let content = render(result, format)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_default_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("nested/out");

        let out = resolve_output(Path::new("data/test.fq.gz"), None, &out_dir, false).unwrap();
        assert_eq!(out, out_dir.join("test.txt"));
        assert!(out_dir.is_dir());
    }

    #[test]
    fn test_resolve_output_explicit_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let out = resolve_output(Path::new("x.bam"), Some("run1"), tmp.path(), false).unwrap();
        assert_eq!(out, tmp.path().join("run1.txt"));
    }

    #[test]
    fn test_resolve_output_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("test.txt"), "old").unwrap();

        let result = resolve_output(Path::new("test.fasta"), None, tmp.path(), false);
        assert!(matches!(result, Err(OutputError::OutputExists(_))));

        let forced = resolve_output(Path::new("test.fasta"), None, tmp.path(), true).unwrap();
        assert_eq!(forced, tmp.path().join("test.txt"));
    }

    #[test]
    fn test_write_result_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.txt");
        write_result(&path, &CountResult::scalar("test", 250), OutputFormat::Text).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "test : 250\n");
    }
}
