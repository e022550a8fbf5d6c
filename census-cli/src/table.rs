use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use census::{TableDef, catalog};

/// Selects the table a command works on.
#[derive(Debug, clap::Args)]
pub struct TableArgs {
    /// Built-in table name, for example KS101.
    #[arg(short, long, required_unless_present = "table_def", conflicts_with = "table_def")]
    table: Option<String>,

    /// JSON table definition to use instead of a built-in table.
    #[arg(long, value_name = "JSON")]
    table_def: Option<PathBuf>,
}

impl TableArgs {
    pub fn resolve(&self) -> anyhow::Result<TableDef> {
        match (&self.table, &self.table_def) {
            (_, Some(path)) => {
                let file = File::open(path)
                    .with_context(|| format!("opening table definition {}", path.display()))?;
                TableDef::from_json_reader(BufReader::new(file))
                    .with_context(|| format!("reading table definition {}", path.display()))
            }
            (Some(name), None) => Ok(catalog::table(name)?),
            (None, None) => anyhow::bail!("either --table or --table-def is required"),
        }
    }
}
