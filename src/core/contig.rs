use serde::{Deserialize, Serialize};

/// A reference sequence from an alignment header (`@SQ` line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSequence {
    /// Sequence name (SN tag in SAM)
    pub name: String,

    /// Sequence length (LN tag in SAM)
    pub length: u64,
}

impl ReferenceSequence {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Number of reads counted on one contig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContigCount {
    pub contig: String,
    pub length: u64,
    pub read_count: u64,
}

impl ContigCount {
    pub fn new(reference: &ReferenceSequence, read_count: u64) -> Self {
        Self {
            contig: reference.name.clone(),
            length: reference.length,
            read_count,
        }
    }
}

/// Pair each reference with its count, keeping header order and dropping
/// contigs with no reads.
pub fn non_zero_rows<I>(counts: I) -> Vec<ContigCount>
where
    I: IntoIterator<Item = (ReferenceSequence, u64)>,
{
    counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(reference, count)| ContigCount::new(&reference, count))
        .collect()
}
