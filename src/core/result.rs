use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::core::contig::ContigCount;

/// Header row of the tabular alignment output
pub const TABULAR_HEADER: &str = "contig\tlength\tread_count";

/// Outcome of one counting operation.
///
/// The shape is fixed by the content format: sequence files and FastQC
/// reports give a scalar, alignment files give one row per contig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountResult {
    Scalar { label: String, count: u64 },
    Tabular(Vec<ContigCount>),
}

impl CountResult {
    pub fn scalar(label: impl Into<String>, count: u64) -> Self {
        Self::Scalar {
            label: label.into(),
            count,
        }
    }

    /// Render as `<label> : <count>` or as a tab-separated table
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Scalar { label, count } => format!("{label} : {count}\n"),
            Self::Tabular(rows) => {
                let mut out = String::with_capacity(32 * (rows.len() + 1));
                out.push_str(TABULAR_HEADER);
                out.push('\n');
                for row in rows {
                    // Writing to a String cannot fail
                    let _ = writeln!(out, "{}\t{}\t{}", row.contig, row.length, row.read_count);
                }
                out
            }
        }
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_text() {
        let result = CountResult::scalar("test", 250);
        assert_eq!(result.to_text(), "test : 250\n");
    }

    #[test]
    fn test_tabular_text() {
        let result = CountResult::Tabular(vec![
            ContigCount {
                contig: "chr1".to_string(),
                length: 1000,
                read_count: 12,
            },
            ContigCount {
                contig: "chrM".to_string(),
                length: 16569,
                read_count: 3,
            },
        ]);
        assert_eq!(
            result.to_text(),
            "contig\tlength\tread_count\nchr1\t1000\t12\nchrM\t16569\t3\n"
        );
    }

    #[test]
    fn test_tabular_text_empty_has_header() {
        let result = CountResult::Tabular(Vec::new());
        assert_eq!(result.to_text(), "contig\tlength\tread_count\n");
    }

    #[test]
    fn test_json_shapes() {
        let scalar: serde_json::Value =
            serde_json::from_str(&CountResult::scalar("s", 7).to_json().unwrap()).unwrap();
        assert_eq!(scalar["label"], "s");
        assert_eq!(scalar["count"], 7);

        let tabular = CountResult::Tabular(vec![ContigCount {
            contig: "c".to_string(),
            length: 10,
            read_count: 2,
        }]);
        let value: serde_json::Value = serde_json::from_str(&tabular.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["contig"], "c");
        assert_eq!(value[0]["read_count"], 2);
    }
}
