#![deny(missing_docs)]

//! Roll records of a census store up into coarser zones.
//!
//! [`aggregate`] scans a range of a [`RecordStore`], maps each record's zone to a parent zone
//! with a caller supplied key function, and sums the measures of every group. Groups are emitted
//! in ascending key order with their rank as id, so the same input always produces the same
//! output bytes.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use census_error::{CensusResult, ResultExt};
use census_schema::{Record, Schema, ZoneCode};
use census_store::{ReadAt, RecordStore, RecordStoreWriter};

use crate::accumulator::Accumulator;

mod accumulator;
#[cfg(test)]
mod tests;

/// Counts describing one aggregation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    /// Input records scanned.
    pub records_read: u64,
    /// Distinct parent zones, which is the number of output records.
    pub groups: u64,
    /// Input records whose parent zone was [`ZoneCode::unmapped`].
    pub unmapped_records: u64,
}

impl Display for AggregationSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records into {} groups ({} unmapped)",
            self.records_read, self.groups, self.unmapped_records
        )
    }
}

/// The grouped records of an aggregation, in ascending key order.
#[derive(Clone, Debug)]
pub struct Aggregation {
    schema: Arc<Schema>,
    records: Vec<Record>,
    summary: AggregationSummary,
}

impl Aggregation {
    /// The schema shared by the input and output records.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// One record per group; record `i` has id `i`.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Counts describing the pass.
    pub fn summary(&self) -> AggregationSummary {
        self.summary
    }

    /// The output records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// The output record for `key`, if any input record mapped to it.
    pub fn group(&self, key: &ZoneCode) -> Option<&Record> {
        self.records
            .binary_search_by(|r| r.zone().cmp(key))
            .ok()
            .map(|idx| &self.records[idx])
    }
}

/// Group the records at positions `range` of `store` by `key_fn` of their zone and sum them.
///
/// An end past the store's count fails with `OutOfBounds` and nothing is read. Errors from
/// `key_fn` abort the pass.
pub fn aggregate<R, F>(
    store: &RecordStore<R>,
    range: Range<u64>,
    mut key_fn: F,
) -> CensusResult<Aggregation>
where
    R: ReadAt,
    F: FnMut(&ZoneCode) -> CensusResult<ZoneCode>,
{
    let schema = store.schema().clone();
    let (start, end) = (range.start, range.end);
    let mut groups: BTreeMap<ZoneCode, Accumulator> = BTreeMap::new();
    let mut summary = AggregationSummary::default();

    for (position, record) in (start..).zip(store.scan(range)?) {
        let record = record.with_context(|| format!("reading record {position}"))?;
        let key = key_fn(record.zone())
            .with_context(|| format!("mapping zone {} of record {}", record.zone(), position))?;
        if key.is_unmapped() {
            summary.unmapped_records += 1;
        }

        match groups.get_mut(&key) {
            Some(acc) => acc.add(&key, record.measures())?,
            None => {
                groups.insert(key, Accumulator::seed(record.measures()));
            }
        }
        summary.records_read += 1;
    }

    let records = (0u64..)
        .zip(groups)
        .map(|(rank, (key, acc))| {
            log::trace!("group {} ({}) from {} records", rank, key, acc.records());
            Record::new(rank, key, acc.into_totals())
        })
        .collect::<Vec<_>>();
    summary.groups = records.len() as u64;

    log::debug!(
        "Aggregated {} records [{}, {}): {}",
        schema.name(),
        start,
        end,
        summary
    );
    Ok(Aggregation {
        schema,
        records,
        summary,
    })
}

/// [`aggregate`], then write the groups to a new store at `out_path`.
///
/// The output file is truncated first and written in place. If the pass fails partway it holds
/// the whole records written so far.
pub fn aggregate_to_store<R, F>(
    store: &RecordStore<R>,
    range: Range<u64>,
    key_fn: F,
    out_path: impl AsRef<Path>,
) -> CensusResult<AggregationSummary>
where
    R: ReadAt,
    F: FnMut(&ZoneCode) -> CensusResult<ZoneCode>,
{
    let out_path = out_path.as_ref();
    let aggregation = aggregate(store, range, key_fn)?;

    let mut writer = RecordStoreWriter::create(out_path, aggregation.schema.clone())?;
    writer
        .write_all(aggregation.records())
        .with_context(|| format!("writing {}", out_path.display()))?;
    let written = writer.finish()?;

    log::info!(
        "Wrote {} {} groups to {}",
        written,
        aggregation.schema.name(),
        out_path.display()
    );
    Ok(aggregation.summary)
}
