use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::BytesMut;
use census_error::{CensusResult, census_err};
use census_schema::{Record, Schema, ZoneCode};

use crate::record_count;

/// Appends records to a fixed-width record store.
///
/// Every written record is stamped with its target position as its id, so positional
/// addressing and the informational id agree for files produced by this writer. Writes are
/// buffered; call [`RecordStoreWriter::finish`] to flush and surface any final I/O error.
pub struct RecordStoreWriter<W: Write = BufWriter<File>> {
    sink: W,
    schema: Arc<Schema>,
    position: u64,
    buf: BytesMut,
}

impl RecordStoreWriter<BufWriter<File>> {
    /// Create an empty store at `path`, truncating any existing file.
    pub fn create(path: impl AsRef<Path>, schema: impl Into<Arc<Schema>>) -> CensusResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| census_err!(IOError: e).with_context(format!("creating {}", path.display())))?;
        let schema = schema.into();
        log::debug!(
            "Created {} store {} ({} byte records)",
            schema.name(),
            path.display(),
            schema.record_len()
        );
        Ok(Self::new(BufWriter::new(file), schema))
    }

    /// Open an existing store at `path` and continue appending after its last record.
    ///
    /// Fails if the existing file is not a whole number of records.
    pub fn open_append(
        path: impl AsRef<Path>,
        schema: impl Into<Arc<Schema>>,
    ) -> CensusResult<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| census_err!(IOError: e).with_context(format!("opening {}", path.display())))?;
        let schema = schema.into();
        let position = record_count(file.metadata()?.len(), schema.record_len())
            .map_err(|e| e.with_context(format!("appending to {}", path.display())))?;
        file.seek(SeekFrom::End(0))?;
        log::debug!(
            "Appending to {} store {} after {} records",
            schema.name(),
            path.display(),
            position
        );

        let mut writer = Self::new(BufWriter::new(file), schema);
        writer.position = position;
        Ok(writer)
    }
}

impl<W: Write> RecordStoreWriter<W> {
    /// A writer producing a new store on `sink`, starting at position zero.
    pub fn new(sink: W, schema: impl Into<Arc<Schema>>) -> Self {
        let schema = schema.into();
        let buf = BytesMut::with_capacity(schema.record_len());
        Self {
            sink,
            schema,
            position: 0,
            buf,
        }
    }

    /// The schema records are encoded with.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The position the next record will be written at, which is also the number of records
    /// in the store.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Append `record` under its own zone code, returning the position it was written at.
    pub fn append(&mut self, record: &Record) -> CensusResult<u64> {
        self.append_as(record.zone(), record)
    }

    /// Append the measures of `record` under the target zone `zone`.
    pub fn append_as(&mut self, zone: &ZoneCode, record: &Record) -> CensusResult<u64> {
        let position = self.position;
        if record.id() != position {
            log::warn!(
                "{} record for {} carries id {} but is written at position {}",
                self.schema.name(),
                zone,
                record.id(),
                position
            );
        }

        self.buf.clear();
        self.schema
            .encode_parts_into(position, zone, record.measures(), &mut self.buf)?;
        self.sink.write_all(&self.buf)?;
        self.position += 1;
        Ok(position)
    }

    /// Append every record in order, returning the number written.
    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> CensusResult<u64> {
        let start = self.position;
        for record in records {
            self.append(record)?;
        }
        Ok(self.position - start)
    }

    /// Flush buffered records, returning the number of records in the store.
    pub fn finish(mut self) -> CensusResult<u64> {
        self.sink.flush()?;
        Ok(self.position)
    }

    /// Flush buffered records and return the underlying sink.
    pub fn into_inner(mut self) -> CensusResult<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}
