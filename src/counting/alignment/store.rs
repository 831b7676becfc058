//! Indexed access to coordinate-sorted BAM files.
//!
//! The counter only needs a handful of operations on the alignment file:
//! check for and build a `.bai` sidecar, read the reference dictionary, count
//! filtered records per contig through the index, and sort the file in place.
//! [`AlignmentStore`] names that boundary; [`BamStore`] implements it with
//! noodles.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use noodles::bam::{self, bai};
use noodles::core::{Position, Region};
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::csi::binning_index::Indexer;
use noodles::sam;
use noodles::sam::alignment::Record as _;
use noodles::sam::header::record::value::map::header::tag::SORT_ORDER;
use tracing::{debug, info};

use crate::core::contig::ReferenceSequence;
use crate::counting::alignment::filter::{AlignmentFacts, AlignmentFilterPolicy};
use crate::counting::CountError;

/// `@HD SO` value of a coordinate-sorted file
pub const COORDINATE: &str = "coordinate";

/// Operations the alignment counter performs on an alignment file
pub trait AlignmentStore {
    /// Whether an index sidecar exists for `path`
    fn has_index(&self, path: &Path) -> bool;

    /// Build (or rebuild) the index sidecar for `path`
    ///
    /// # Errors
    ///
    /// Returns `CountError::UnsortedInput` if the records are not in
    /// coordinate order. The header's sort order tag is not consulted.
    fn build_index(&self, path: &Path) -> Result<(), CountError>;

    /// Reference sequences in header order
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be read.
    fn reference_sequences(&self, path: &Path) -> Result<Vec<ReferenceSequence>, CountError>;

    /// Count records on each reference, over its full length, that pass `policy`.
    /// Results are in the same order as `references`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or records cannot be read.
    fn count_regions(
        &self,
        path: &Path,
        references: &[ReferenceSequence],
        policy: &AlignmentFilterPolicy,
    ) -> Result<Vec<u64>, CountError>;

    /// Coordinate-sort `path`, replacing it atomically
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the sorted copy cannot be
    /// written or moved into place.
    fn sort_in_place(&self, path: &Path) -> Result<(), CountError>;
}

/// Sidecar index path: `sample.bam` -> `sample.bam.bai`
#[must_use]
pub fn index_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bai");
    PathBuf::from(name)
}

/// Whether the header declares `SO:coordinate`
#[must_use]
pub fn is_coordinate_sorted(header: &sam::Header) -> bool {
    header
        .header()
        .and_then(|hd| hd.other_fields().get(&SORT_ORDER))
        .is_some_and(|sort_order| &sort_order[..] == COORDINATE.as_bytes())
}

/// [`AlignmentStore`] backed by noodles BAM readers and writers
#[derive(Debug, Clone, Copy, Default)]
pub struct BamStore;

impl BamStore {
    fn read_header(path: &Path) -> Result<sam::Header, CountError> {
        let mut reader = File::open(path).map(bam::io::Reader::new)?;
        reader.read_header().map_err(noodles_error)
    }
}

impl AlignmentStore for BamStore {
    fn has_index(&self, path: &Path) -> bool {
        index_path(path).is_file()
    }

    fn build_index(&self, path: &Path) -> Result<(), CountError> {
        let mut reader = File::open(path).map(bam::io::Reader::new)?;
        let header = reader.read_header().map_err(noodles_error)?;
        if !is_coordinate_sorted(&header) {
            debug!(path = %path.display(), "Header does not declare SO:coordinate, checking record order");
        }

        let mut record = bam::Record::default();
        let mut indexer = Indexer::default();
        let mut previous = None;
        let mut start_position = reader.get_ref().virtual_position();

        while reader.read_record(&mut record).map_err(noodles_error)? != 0 {
            let end_position = reader.get_ref().virtual_position();

            let key = sort_key(&record)?;
            if previous.is_some_and(|prev| key < prev) {
                return Err(CountError::UnsortedInput(path.display().to_string()));
            }
            previous = Some(key);

            let context = match alignment_context(&record)? {
                (Some(id), Some(start), Some(end)) => {
                    Some((id, start, end, !record.flags().is_unmapped()))
                }
                _ => None,
            };
            indexer
                .add_record(context, Chunk::new(start_position, end_position))
                .map_err(noodles_error)?;

            start_position = end_position;
        }

        let index: bai::Index = indexer.build(header.reference_sequences().len());

        let dst = index_path(path);
        info!(index = %dst.display(), "Writing alignment index");
        let mut writer = File::create(&dst).map(bai::io::Writer::new)?;
        writer.write_index(&index)?;
        Ok(())
    }

    fn reference_sequences(&self, path: &Path) -> Result<Vec<ReferenceSequence>, CountError> {
        let header = Self::read_header(path)?;
        Ok(references_from_header(&header))
    }

    fn count_regions(
        &self,
        path: &Path,
        references: &[ReferenceSequence],
        policy: &AlignmentFilterPolicy,
    ) -> Result<Vec<u64>, CountError> {
        let mut reader = bam::io::indexed_reader::Builder::default()
            .build_from_path(path)
            .map_err(noodles_error)?;
        let header = reader.read_header().map_err(noodles_error)?;

        let mut counts = Vec::with_capacity(references.len());
        for reference in references {
            let region = full_length_region(reference)?;
            let query = reader.query(&header, &region).map_err(noodles_error)?;

            let mut count = 0u64;
            for result in query {
                let record = result.map_err(noodles_error)?;
                if policy.accepts(&AlignmentFacts::from_record(&record)?) {
                    count += 1;
                }
            }

            debug!(contig = %reference.name, count, "Counted contig");
            counts.push(count);
        }

        Ok(counts)
    }

    fn sort_in_place(&self, path: &Path) -> Result<(), CountError> {
        let mut reader = File::open(path).map(bam::io::Reader::new)?;
        let header = reader.read_header().map_err(noodles_error)?;

        let mut keyed = Vec::new();
        for result in reader.records() {
            let record = result.map_err(noodles_error)?;
            keyed.push((sort_key(&record)?, record));
        }
        // Stable, so records sharing a position keep their input order
        keyed.sort_by_key(|(key, _)| *key);
        info!(records = keyed.len(), "Sorted alignment records by coordinate");

        let header = with_coordinate_sort_order(&header);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = tempfile::Builder::new()
            .prefix(".readcounter-sort-")
            .suffix(".bam")
            .tempfile_in(dir)?;

        {
            let mut writer = bam::io::Writer::new(temp.as_file());
            writer.write_header(&header)?;
            for (_, record) in &keyed {
                writer.write_record(&header, record)?;
            }
            writer.try_finish()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(path).map_err(|e| CountError::Io(e.error))?;
        debug!(path = %path.display(), "Replaced alignment file with sorted copy");
        Ok(())
    }
}

/// Reference dictionary of a header, in header order
#[must_use]
pub fn references_from_header(header: &sam::Header) -> Vec<ReferenceSequence> {
    header
        .reference_sequences()
        .iter()
        .map(|(name, map)| {
            ReferenceSequence::new(name.to_string(), map.length().get() as u64)
        })
        .collect()
}

fn full_length_region(reference: &ReferenceSequence) -> Result<Region, CountError> {
    let length = usize::try_from(reference.length).map_err(|_| {
        CountError::Noodles(format!("contig {} is too long", reference.name))
    })?;
    let end = Position::try_from(length).map_err(|_| {
        CountError::Noodles(format!("contig {} has zero length", reference.name))
    })?;
    Ok(Region::new(reference.name.as_str(), Position::MIN..=end))
}

type AlignmentContext = (Option<usize>, Option<Position>, Option<Position>);

fn alignment_context(record: &bam::Record) -> io::Result<AlignmentContext> {
    Ok((
        record.reference_sequence_id().transpose()?,
        record.alignment_start().transpose()?,
        record.alignment_end().transpose()?,
    ))
}

/// Placed records first by (reference, start); unplaced records last
fn sort_key(record: &bam::Record) -> io::Result<(usize, usize)> {
    let reference_id = record.reference_sequence_id().transpose()?;
    let start = record.alignment_start().transpose()?;
    Ok((
        reference_id.unwrap_or(usize::MAX),
        start.map_or(0, usize::from),
    ))
}

fn with_coordinate_sort_order(header: &sam::Header) -> sam::Header {
    let mut header = header.clone();
    let mut hd = header.header().cloned().unwrap_or_default();
    hd.other_fields_mut().insert(SORT_ORDER, COORDINATE.into());
    *header.header_mut() = Some(hd);
    header
}

fn noodles_error(e: io::Error) -> CountError {
    CountError::Noodles(e.to_string())
}
