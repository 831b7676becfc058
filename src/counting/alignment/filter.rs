use std::io;

use noodles::bam;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::Flags;
use serde::{Deserialize, Serialize};

/// Mapping quality reported when a record carries none (SAM `MAPQ` 255)
pub const MISSING_MAPPING_QUALITY: u8 = 255;

/// Thresholds an alignment record must meet to be counted.
///
/// Unmapped, duplicate, QC-failed, secondary and supplementary records are
/// always excluded; every threshold is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignmentFilterPolicy {
    /// Minimum number of bases in the read
    pub min_read_len: u32,
    /// Minimum number of read bases inside the alignment (no clipping)
    pub min_aln_len: u32,
    /// Minimum mapping quality
    pub min_map_qual: u8,
    /// Minimum mean per-base quality over the whole read
    pub min_base_qual: u8,
}

impl AlignmentFilterPolicy {
    #[must_use]
    pub fn accepts(&self, facts: &AlignmentFacts) -> bool {
        !facts.flags.intersects(EXCLUDED_FLAGS)
            && facts.read_len >= self.min_read_len
            && facts.mapping_quality >= self.min_map_qual
            && facts.mean_base_quality >= f64::from(self.min_base_qual)
            && facts.aligned_len >= self.min_aln_len
    }
}

const EXCLUDED_FLAGS: Flags = Flags::UNMAPPED
    .union(Flags::DUPLICATE)
    .union(Flags::QC_FAIL)
    .union(Flags::SECONDARY)
    .union(Flags::SUPPLEMENTARY);

/// The properties of one alignment record the filter looks at
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentFacts {
    pub flags: Flags,
    pub read_len: u32,
    pub aligned_len: u32,
    pub mapping_quality: u8,
    pub mean_base_quality: f64,
}

impl AlignmentFacts {
    /// Extract filter inputs from a BAM record
    ///
    /// # Errors
    ///
    /// Returns an error if the record's CIGAR cannot be decoded.
    pub fn from_record(record: &bam::Record) -> io::Result<Self> {
        let mut aligned_len = 0u32;
        for result in record.cigar().iter() {
            let op = result?;
            if matches!(
                op.kind(),
                Kind::Match | Kind::Insertion | Kind::SequenceMatch | Kind::SequenceMismatch
            ) {
                aligned_len = aligned_len.saturating_add(saturating_u32(op.len()));
            }
        }

        Ok(Self {
            flags: record.flags(),
            read_len: saturating_u32(record.sequence().len()),
            aligned_len,
            mapping_quality: record
                .mapping_quality()
                .map_or(MISSING_MAPPING_QUALITY, |mq| mq.get()),
            mean_base_quality: mean_quality(record.quality_scores().as_ref()),
        })
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Arithmetic mean of raw Phred scores.
///
/// BAM stores missing qualities as a run of `0xFF`; those, and empty
/// slices, have a mean of 0.
#[must_use]
pub fn mean_quality(scores: &[u8]) -> f64 {
    if scores.is_empty() || scores.iter().all(|&q| q == 0xFF) {
        return 0.0;
    }
    let sum: u64 = scores.iter().map(|&q| u64::from(q)).sum();
    #[allow(clippy::cast_precision_loss)]
    {
        sum as f64 / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_read() -> AlignmentFacts {
        AlignmentFacts {
            flags: Flags::empty(),
            read_len: 100,
            aligned_len: 90,
            mapping_quality: 40,
            mean_base_quality: 32.5,
        }
    }

    #[test]
    fn test_default_policy_accepts_mapped_read() {
        assert!(AlignmentFilterPolicy::default().accepts(&good_read()));
    }

    #[test]
    fn test_fixed_exclusions() {
        let policy = AlignmentFilterPolicy::default();
        for flag in [
            Flags::UNMAPPED,
            Flags::DUPLICATE,
            Flags::QC_FAIL,
            Flags::SECONDARY,
            Flags::SUPPLEMENTARY,
        ] {
            let facts = AlignmentFacts {
                flags: flag,
                ..good_read()
            };
            assert!(!policy.accepts(&facts), "{flag:?} should be excluded");
        }

        let paired = AlignmentFacts {
            flags: Flags::SEGMENTED | Flags::FIRST_SEGMENT,
            ..good_read()
        };
        assert!(policy.accepts(&paired));
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let policy = AlignmentFilterPolicy {
            min_read_len: 100,
            min_aln_len: 90,
            min_map_qual: 40,
            min_base_qual: 32,
        };
        assert!(policy.accepts(&good_read()));

        let policy = AlignmentFilterPolicy {
            min_base_qual: 33,
            ..policy
        };
        assert!(!policy.accepts(&good_read()));
    }

    #[test]
    fn test_each_threshold_rejects() {
        let facts = good_read();
        let base = AlignmentFilterPolicy::default();
        assert!(!AlignmentFilterPolicy { min_read_len: 101, ..base }.accepts(&facts));
        assert!(!AlignmentFilterPolicy { min_aln_len: 91, ..base }.accepts(&facts));
        assert!(!AlignmentFilterPolicy { min_map_qual: 41, ..base }.accepts(&facts));
        assert!(!AlignmentFilterPolicy { min_base_qual: 33, ..base }.accepts(&facts));
    }

    #[test]
    fn test_mean_quality() {
        assert!((mean_quality(&[30, 40]) - 35.0).abs() < f64::EPSILON);
        assert!((mean_quality(&[]) - 0.0).abs() < f64::EPSILON);
        assert!((mean_quality(&[0xFF, 0xFF, 0xFF]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_mapping_quality_passes_any_threshold() {
        let facts = AlignmentFacts {
            mapping_quality: MISSING_MAPPING_QUALITY,
            ..good_read()
        };
        let policy = AlignmentFilterPolicy {
            min_map_qual: 60,
            ..AlignmentFilterPolicy::default()
        };
        assert!(policy.accepts(&facts));
    }
}
