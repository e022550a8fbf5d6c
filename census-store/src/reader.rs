use std::fmt::{Debug, Formatter};
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use census_error::{CensusResult, census_bail, census_err};
use census_schema::{Record, Schema};

use crate::{ReadAt, record_count};

/// Records decoded per positional read while scanning.
const SCAN_BATCH: usize = 1024;

/// A read-only view over a fixed-width record store.
pub struct RecordStore<R = File> {
    read: R,
    schema: Arc<Schema>,
    path: Option<PathBuf>,
}

impl<R> Debug for RecordStore<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("schema", &self.schema)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RecordStore<File> {
    /// Open the store at `path` for reading.
    ///
    /// Fails if the file length is not a whole number of `schema` records.
    pub fn open(path: impl AsRef<Path>, schema: impl Into<Arc<Schema>>) -> CensusResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| census_err!(IOError: e).with_context(format!("opening {}", path.display())))?;
        let store = Self {
            read: file,
            schema: schema.into(),
            path: Some(path.to_path_buf()),
        };
        let count = store
            .count()
            .map_err(|e| e.with_context(format!("opening {}", path.display())))?;
        log::debug!(
            "Opened {} store {} ({} byte records, {} records)",
            store.schema.name(),
            path.display(),
            store.schema.record_len(),
            count
        );
        Ok(store)
    }
}

impl RecordStore<Bytes> {
    /// A store over an in-memory buffer.
    pub fn in_memory(bytes: impl Into<Bytes>, schema: impl Into<Arc<Schema>>) -> CensusResult<Self> {
        let store = Self {
            read: bytes.into(),
            schema: schema.into(),
            path: None,
        };
        store.count()?;
        Ok(store)
    }
}

impl<R: ReadAt> RecordStore<R> {
    /// The schema every record of this store is encoded with.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The size of the store in bytes.
    pub fn byte_len(&self) -> CensusResult<u64> {
        Ok(self.read.size()?)
    }

    /// The number of records currently in the store.
    pub fn count(&self) -> CensusResult<u64> {
        record_count(self.read.size()?, self.schema.record_len())
    }

    /// Read the record at position `id`.
    pub fn get(&self, id: u64) -> CensusResult<Record> {
        let count = self.count()?;
        if id >= count {
            census_bail!(OutOfBounds: id, 0, count);
        }

        let mut buf = vec![0u8; self.schema.record_len()];
        self.read
            .read_exact_at(&mut buf, id * self.record_len())?;
        self.schema.decode(&buf)
    }

    /// Iterate the records in positions `range`, in order.
    pub fn scan(&self, range: Range<u64>) -> CensusResult<RecordScan<'_, R>> {
        let count = self.count()?;
        if range.start > range.end {
            census_bail!(
                "scan range start {} is after its end {}",
                range.start,
                range.end
            );
        }
        if range.end > count {
            census_bail!(OutOfBounds: range.end, 0, count);
        }
        Ok(RecordScan {
            store: self,
            next: range.start,
            end: range.end,
            batch: Vec::new(),
            offset: 0,
        })
    }

    /// Iterate every record in the store.
    pub fn scan_all(&self) -> CensusResult<RecordScan<'_, R>> {
        self.scan(0..self.count()?)
    }

    /// Positions whose stored id differs from the position, paired with the stored id.
    ///
    /// Addressing is always positional; a divergent id only means the writer of the file did
    /// not stamp it.
    pub fn audit_ids(&self) -> CensusResult<Vec<(u64, u64)>> {
        let mut divergent = Vec::new();
        for (position, record) in (0u64..).zip(self.scan_all()?) {
            let record = record?;
            if record.id() != position {
                divergent.push((position, record.id()));
            }
        }
        Ok(divergent)
    }

    fn record_len(&self) -> u64 {
        self.schema.record_len() as u64
    }
}

/// A sequential scan over a range of a [`RecordStore`], reading in batches.
pub struct RecordScan<'a, R> {
    store: &'a RecordStore<R>,
    next: u64,
    end: u64,
    batch: Vec<u8>,
    offset: usize,
}

impl<R: ReadAt> RecordScan<'_, R> {
    fn fill(&mut self) -> CensusResult<()> {
        let record_len = self.store.schema.record_len();
        let remaining = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        let nrecords = remaining.min(SCAN_BATCH);
        self.batch.resize(nrecords * record_len, 0);
        self.store
            .read
            .read_exact_at(&mut self.batch, self.next * self.store.record_len())?;
        self.offset = 0;
        Ok(())
    }
}

impl<R: ReadAt> Iterator for RecordScan<'_, R> {
    type Item = CensusResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        if self.offset >= self.batch.len() {
            if let Err(e) = self.fill() {
                // A failed read ends the scan.
                self.next = self.end;
                return Some(Err(e));
            }
        }

        let record_len = self.store.schema.record_len();
        let record = self
            .store
            .schema
            .decode(&self.batch[self.offset..self.offset + record_len]);
        self.offset += record_len;
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
