use std::collections::BTreeMap;
use std::io::{Read, Write};

use census_error::{CensusResult, census_err};
use serde::{Deserialize, Serialize};

use crate::{Region, Schema, TextLayout};

/// A census table: its schema and the source layout published by each region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    schema: Schema,
    layouts: BTreeMap<Region, TextLayout>,
}

impl TableDef {
    /// Create a table definition, checking every layout against the schema.
    pub fn try_new(schema: Schema, layouts: BTreeMap<Region, TextLayout>) -> CensusResult<Self> {
        let table = Self { schema, layouts };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> CensusResult<()> {
        self.schema.validate()?;
        for (region, layout) in &self.layouts {
            layout.check_schema(&self.schema).map_err(|e| {
                e.with_context(format!("{} layout of {}", region, self.schema.name()))
            })?;
        }
        Ok(())
    }

    /// The table schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The table name.
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// The source layout used by `region`.
    pub fn layout(&self, region: Region) -> CensusResult<&TextLayout> {
        self.layouts.get(&region).ok_or_else(|| {
            census_err!(
                "table {} is not published for region {}",
                self.schema.name(),
                region
            )
        })
    }

    /// Every region layout of this table.
    pub fn layouts(&self) -> &BTreeMap<Region, TextLayout> {
        &self.layouts
    }

    /// Read a table definition from JSON, validating it.
    pub fn from_json_reader<R: Read>(reader: R) -> CensusResult<Self> {
        let table: Self = serde_json::from_reader(reader)?;
        table.validate()?;
        Ok(table)
    }

    /// Write this table definition as pretty-printed JSON.
    pub fn to_json_writer<W: Write>(&self, writer: W) -> CensusResult<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnSource;

    fn qs104() -> TableDef {
        let schema = Schema::from_names("QS104", &["all", "males", "females"]).unwrap();
        TableDef::try_new(
            schema,
            BTreeMap::from([
                (Region::EnglandWales, TextLayout::sequential(3)),
                (
                    Region::NorthernIreland,
                    TextLayout::new(vec![
                        ColumnSource::Sum(vec![1, 2]),
                        ColumnSource::Column(1),
                        ColumnSource::Column(2),
                    ]),
                ),
            ]),
        )
        .unwrap()
    }

    #[test]
    fn json_round_trip() {
        let table = qs104();
        let mut json = Vec::new();
        table.to_json_writer(&mut json).unwrap();
        assert_eq!(TableDef::from_json_reader(json.as_slice()).unwrap(), table);
    }

    #[test]
    fn missing_region_is_an_error() {
        assert!(qs104().layout(Region::Scotland).is_err());
        assert!(qs104().layout(Region::NorthernIreland).is_ok());
    }

    #[test]
    fn rejects_layouts_that_do_not_cover_schema() {
        let schema = Schema::from_names("QS104", &["all", "males", "females"]).unwrap();
        let result = TableDef::try_new(
            schema,
            BTreeMap::from([(Region::Scotland, TextLayout::sequential(2))]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn invalid_json_is_rejected_after_parsing() {
        let json = r#"{"schema":{"name":"T","fields":[{"name":"a"}]},
            "layouts":{"Scotland":{"zone_offset":1,"columns":["Unset","Unset"]}}}"#;
        assert!(TableDef::from_json_reader(json.as_bytes()).is_err());
    }
}
