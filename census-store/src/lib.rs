#![deny(missing_docs)]

//! Fixed-width record stores.
//!
//! A store is a file of back-to-back records of one schema with no header: the record with id
//! `i` occupies bytes `[i * L, (i + 1) * L)` where `L` is [`Schema::record_len`]. The file
//! length must always be an exact multiple of `L`; anything else is reported as corruption
//! rather than rounded away.
//!
//! Stores are read through [`RecordStore`], which holds a read-only handle, and written through
//! [`RecordStoreWriter`], which holds its own read-write handle. Nothing arbitrates between the
//! two; callers must not read a file while another handle is writing it.
//!
//! [`Schema::record_len`]: census_schema::Schema::record_len

pub use export::*;
pub use read::*;
pub use reader::*;
pub use writer::*;

mod export;
mod read;
mod reader;
mod writer;

use census_error::{CensusResult, census_bail};

/// The number of whole records in `byte_len` bytes, failing if a partial record is present.
pub fn record_count(byte_len: u64, record_len: usize) -> CensusResult<u64> {
    let record_len = record_len as u64;
    if record_len == 0 {
        census_bail!("record length must be positive");
    }
    if byte_len % record_len != 0 {
        census_bail!(
            Corrupt: "store length {} is not a multiple of the record length {} ({} trailing bytes)",
            byte_len,
            record_len,
            byte_len % record_len
        );
    }
    Ok(byte_len / record_len)
}
