//! Geographic zone identifiers.

use std::cmp::min;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use census_error::{CensusError, CensusExpect, CensusResult, census_bail, census_err};

/// The number of characters a zone code occupies in an encoded record.
pub const ZONE_CODE_WIDTH: usize = 10;

/// The number of characters of an Output Area code that identify its Ward.
pub const WARD_PREFIX_WIDTH: usize = 6;

const UNMAPPED: &[u8; ZONE_CODE_WIDTH] = b"ZZUNMAPPED";

/// An immutable zone identifier of at most [`ZONE_CODE_WIDTH`] ASCII characters.
///
/// Codes are hierarchical by convention: a fixed-width prefix of a fine zone identifies the
/// coarser zone containing it. Ordering is plain lexicographic ordering of the characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneCode {
    // Zero-filled after `len`, so the derived ordering matches string ordering.
    bytes: [u8; ZONE_CODE_WIDTH],
    len: u8,
}

impl ZoneCode {
    /// Create a zone code, validating that it is 1 to 10 printable ASCII characters.
    pub fn new(code: &str) -> CensusResult<Self> {
        if code.is_empty() {
            census_bail!("zone code must not be empty");
        }
        if code.len() > ZONE_CODE_WIDTH {
            census_bail!(
                "zone code {} is longer than {} characters",
                code,
                ZONE_CODE_WIDTH
            );
        }
        if !code.bytes().all(|b| b.is_ascii_graphic()) {
            census_bail!("zone code {} contains non-printable or non-ASCII characters", code);
        }

        let mut bytes = [0u8; ZONE_CODE_WIDTH];
        bytes[..code.len()].copy_from_slice(code.as_bytes());
        Ok(Self {
            bytes,
            len: u8::try_from(code.len())
                .map_err(|_| census_err!("zone code {} is too long", code))?,
        })
    }

    /// The explicit key under which zones missing from a lookup table are grouped.
    #[allow(clippy::cast_possible_truncation)]
    pub fn unmapped() -> Self {
        Self {
            bytes: *UNMAPPED,
            len: ZONE_CODE_WIDTH as u8,
        }
    }

    /// Whether this is the [`ZoneCode::unmapped`] key.
    pub fn is_unmapped(&self) -> bool {
        *self == Self::unmapped()
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len()])
            .ok()
            .census_expect("zone codes only hold ASCII")
    }

    /// The number of characters in the code.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// The code made of at most the first `width` characters of this one.
    pub fn prefix(&self, width: usize) -> Self {
        let width = min(width.max(1), self.len());
        let mut bytes = [0u8; ZONE_CODE_WIDTH];
        bytes[..width].copy_from_slice(&self.bytes[..width]);
        Self {
            bytes,
            len: u8::try_from(width).unwrap_or(self.len),
        }
    }

    /// The fixed-width UTF-16 representation, zero-filled after the last character.
    pub fn to_units(&self) -> [u16; ZONE_CODE_WIDTH] {
        self.bytes.map(u16::from)
    }

    /// Rebuild a zone code from its fixed-width UTF-16 representation.
    pub fn from_units(units: &[u16; ZONE_CODE_WIDTH]) -> CensusResult<Self> {
        let len = units.iter().position(|u| *u == 0).unwrap_or(ZONE_CODE_WIDTH);
        if units[len..].iter().any(|u| *u != 0) {
            census_bail!(Corrupt: "zone code has characters after its terminating zero unit");
        }

        let mut bytes = [0u8; ZONE_CODE_WIDTH];
        for (byte, unit) in bytes.iter_mut().zip(&units[..len]) {
            *byte = u8::try_from(*unit)
                .ok()
                .filter(u8::is_ascii_graphic)
                .ok_or_else(|| census_err!(Corrupt: "zone code unit {:#06x} is not ASCII", unit))?;
        }
        if len == 0 {
            census_bail!(Corrupt: "encoded zone code is empty");
        }
        Ok(Self {
            bytes,
            len: u8::try_from(len).map_err(|_| census_err!(Corrupt: "zone code too long"))?,
        })
    }
}

impl FromStr for ZoneCode {
    type Err = CensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ZoneCode {
    type Error = CensusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ZoneCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for ZoneCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Debug for ZoneCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ZoneCode").field(&self.as_str()).finish()
    }
}
