use std::fmt::{self, Display, Formatter};

use census_error::{CensusResult, census_bail};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::ZONE_CODE_WIDTH;

/// Bytes taken by the record id at the start of every encoded record.
pub const ID_WIDTH: usize = 8;

/// Bytes taken by the zone code, one UTF-16 unit per character.
pub const ZONE_WIDTH: usize = 2 * ZONE_CODE_WIDTH;

/// Bytes taken by each measure.
pub const MEASURE_WIDTH: usize = 4;

/// Describes one numeric measure of a table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
}

impl FieldDescriptor {
    /// Create a descriptor for the named measure.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name of the measure.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The ordered numeric fields of a census table.
///
/// Field order is the on-disk order: reordering, adding or removing a field silently changes
/// the meaning of every existing file of this table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Create a schema, rejecting empty or duplicated field lists.
    pub fn try_new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> CensusResult<Self> {
        let schema = Self {
            name: name.into(),
            fields,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Create a schema from a list of field names.
    pub fn from_names(name: impl Into<String>, names: &[&str]) -> CensusResult<Self> {
        Self::try_new(
            name,
            names.iter().map(|n| FieldDescriptor::new(*n)).collect(),
        )
    }

    pub(crate) fn validate(&self) -> CensusResult<()> {
        if self.name.is_empty() {
            census_bail!("schema name must not be empty");
        }
        if self.fields.is_empty() {
            census_bail!("schema {} has no fields", self.name);
        }
        if let Some(dup) = self.fields.iter().map(|f| f.name()).duplicates().next() {
            census_bail!("schema {} declares field {} more than once", self.name, dup);
        }
        Ok(())
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The measure descriptors, in on-disk order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The number of measures in each record.
    pub fn nfields(&self) -> usize {
        self.fields.len()
    }

    /// The position of the named measure.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// The fixed length in bytes of one encoded record.
    pub fn record_len(&self) -> usize {
        ID_WIDTH + ZONE_WIDTH + MEASURE_WIDTH * self.fields.len()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.name,
            self.fields.iter().map(FieldDescriptor::name).format(", ")
        )
    }
}
