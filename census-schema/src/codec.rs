//! Fixed-width binary encoding of records.
//!
//! ```text
//! | id: u64 | zone: [u16; 10] | measure_0: i32 | ... | measure_n-1: i32 |
//! ```
//!
//! Every value is big-endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use census_error::{CensusResult, census_bail};

use crate::{Record, Schema, ZONE_CODE_WIDTH, ZoneCode};

impl Schema {
    /// Append the encoding of `record` to `buf`, writing exactly [`Schema::record_len`] bytes.
    pub fn encode_into<B: BufMut>(&self, record: &Record, buf: &mut B) -> CensusResult<()> {
        self.encode_parts_into(record.id(), record.zone(), record.measures(), buf)
    }

    /// Encode a record from its parts, so writers can stamp a target id and zone without
    /// rebuilding the record.
    pub fn encode_parts_into<B: BufMut>(
        &self,
        id: u64,
        zone: &ZoneCode,
        measures: &[i32],
        buf: &mut B,
    ) -> CensusResult<()> {
        if measures.len() != self.nfields() {
            census_bail!(
                SchemaMismatch: "record for zone {} has {} measures but {} expects {}",
                zone,
                measures.len(),
                self.name(),
                self.nfields()
            );
        }
        if buf.remaining_mut() < self.record_len() {
            census_bail!(
                "buffer has room for {} bytes but a {} record needs {}",
                buf.remaining_mut(),
                self.name(),
                self.record_len()
            );
        }

        buf.put_u64(id);
        for unit in zone.to_units() {
            buf.put_u16(unit);
        }
        for measure in measures {
            buf.put_i32(*measure);
        }
        Ok(())
    }

    /// Encode `record` into a new buffer of [`Schema::record_len`] bytes.
    pub fn encode(&self, record: &Record) -> CensusResult<Bytes> {
        let mut buf = BytesMut::with_capacity(self.record_len());
        self.encode_into(record, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode one record from exactly [`Schema::record_len`] bytes.
    pub fn decode(&self, mut bytes: &[u8]) -> CensusResult<Record> {
        if bytes.len() != self.record_len() {
            census_bail!(
                Corrupt: "{} records are {} bytes, got {}",
                self.name(),
                self.record_len(),
                bytes.len()
            );
        }

        let id = bytes.get_u64();
        let mut units = [0u16; ZONE_CODE_WIDTH];
        for unit in units.iter_mut() {
            *unit = bytes.get_u16();
        }
        let zone = ZoneCode::from_units(&units)?;
        let measures = (0..self.nfields()).map(|_| bytes.get_i32()).collect();
        Ok(Record::new(id, zone, measures))
    }
}
