//! Per-contig read counts for BAM files.
//!
//! Counting runs as two small state machines:
//!
//! ```text
//! index if missing --> accelerated (optional) --fail--> record-by-record
//!
//! record-by-record: AsIs --fail--> sort + reindex --> Sorted --fail--> fatal
//! ```
//!
//! The accelerated path never fails a count; it only falls back. The
//! record-by-record path sorts the input at most once.

pub mod bamcov;
pub mod filter;
pub mod store;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::contig::{non_zero_rows, ContigCount, ReferenceSequence};
use crate::counting::context::CountContext;
use crate::counting::CountError;

pub use bamcov::{AcceleratedCounter, Bamcov, BAMCOV_PROGRAM};
pub use filter::AlignmentFilterPolicy;
pub use store::{AlignmentStore, BamStore};

/// Default memory hint handed to the accelerated path
pub const DEFAULT_BAMCOV_MEMORY: &str = "10G";

/// Settings for the alignment counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    pub filter: AlignmentFilterPolicy,
    /// Try the external `bamcov` tool first
    pub use_bamcov: bool,
    /// Memory budget for the accelerated path, passed through untouched
    pub bamcov_memory: String,
    pub bamcov_program: PathBuf,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            filter: AlignmentFilterPolicy::default(),
            use_bamcov: false,
            bamcov_memory: DEFAULT_BAMCOV_MEMORY.to_string(),
            bamcov_program: PathBuf::from(BAMCOV_PROGRAM),
        }
    }
}

/// Where the record-by-record path is in its recovery sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AsIs,
    Sorted,
}

pub struct AlignmentCounter<S = BamStore, A = Bamcov> {
    store: S,
    accelerated: Option<A>,
    filter: AlignmentFilterPolicy,
}

impl AlignmentCounter {
    #[must_use]
    pub fn new(config: &AlignmentConfig) -> Self {
        let accelerated = config
            .use_bamcov
            .then(|| Bamcov::new(&config.bamcov_program, &config.bamcov_memory));
        Self::with_parts(BamStore, accelerated, config.filter)
    }
}

impl<S: AlignmentStore, A: AcceleratedCounter> AlignmentCounter<S, A> {
    pub fn with_parts(store: S, accelerated: Option<A>, filter: AlignmentFilterPolicy) -> Self {
        Self {
            store,
            accelerated,
            filter,
        }
    }

    /// Count filtered reads per contig.
    ///
    /// Rows follow the header's reference order; contigs without reads are
    /// left out.
    ///
    /// # Errors
    ///
    /// Returns the error of the second indexed attempt if counting still fails
    /// after sorting, or the error of the sort/reindex step itself.
    pub fn count(&self, ctx: &CountContext, path: &Path) -> Result<Vec<ContigCount>, CountError> {
        ctx.in_scope(|| {
            if let Some(accelerated) = &self.accelerated {
                let attempt = self
                    .ensure_index(path)
                    .and_then(|()| accelerated.count(path, &self.filter));
                match attempt {
                    Ok(rows) => return Ok(non_zero_rows(rows)),
                    Err(e) => warn!(error = %e, "Accelerated counting failed, counting record by record"),
                }
            }

            self.count_with_recovery(path).map(non_zero_rows)
        })
    }

    fn count_with_recovery(&self, path: &Path) -> Result<Vec<(ReferenceSequence, u64)>, CountError> {
        let mut stage = Stage::AsIs;
        loop {
            match (stage, self.indexed_count(path)) {
                (_, Ok(rows)) => return Ok(rows),
                (Stage::AsIs, Err(e)) => {
                    warn!(error = %e, "Indexed counting failed, sorting input and retrying once");
                    self.store.sort_in_place(path)?;
                    self.store.build_index(path)?;
                    stage = Stage::Sorted;
                }
                (Stage::Sorted, Err(e)) => return Err(e),
            }
        }
    }

    fn ensure_index(&self, path: &Path) -> Result<(), CountError> {
        if !self.store.has_index(path) {
            info!("No index found, building one");
            self.store.build_index(path)?;
        }
        Ok(())
    }

    fn indexed_count(&self, path: &Path) -> Result<Vec<(ReferenceSequence, u64)>, CountError> {
        self.ensure_index(path)?;

        let references = self.store.reference_sequences(path)?;
        let counts = self.store.count_regions(path, &references, &self.filter)?;
        Ok(references.into_iter().zip(counts).collect())
    }
}
