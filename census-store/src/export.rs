use std::io::Write;

use census_error::CensusResult;
use census_schema::SENTINEL;

use crate::{ReadAt, RecordStore};

/// Write every record of `store` as CSV: `id,zone,<field names...>`.
///
/// Unset measures are written as empty cells, so they stay distinguishable from observed zeros.
/// Returns the number of records written.
pub fn export_csv<R: ReadAt, W: Write>(store: &RecordStore<R>, sink: W) -> CensusResult<u64> {
    let mut writer = csv::Writer::from_writer(sink);

    let header = ["id", "zone"]
        .into_iter()
        .chain(store.schema().fields().iter().map(|f| f.name()));
    writer.write_record(header)?;

    let mut written = 0u64;
    let mut row: Vec<String> = Vec::with_capacity(store.schema().nfields() + 2);
    for record in store.scan_all()? {
        let record = record?;
        row.clear();
        row.push(record.id().to_string());
        row.push(record.zone().to_string());
        row.extend(record.measures().iter().map(|m| {
            if *m == SENTINEL {
                String::new()
            } else {
                m.to_string()
            }
        }));
        writer.write_record(&row)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
