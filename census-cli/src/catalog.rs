use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use census::catalog;
use itertools::Itertools;

/// List the built-in tables, or write one as a JSON table definition.
pub fn exec_catalog(name: Option<String>, out: Option<PathBuf>) -> anyhow::Result<()> {
    let Some(name) = name else {
        for table in catalog::all()? {
            println!(
                "{}\t{} fields\t{} byte records\t{}",
                table.name(),
                table.schema().nfields(),
                table.schema().record_len(),
                table.layouts().keys().join(", ")
            );
        }
        return Ok(());
    };

    let table = catalog::table(&name)?;
    match out {
        Some(path) => {
            let file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            table.to_json_writer(&mut writer)?;
            writer.flush()?;
            println!("{} written to {}", table.name(), path.display());
        }
        None => {
            table.to_json_writer(io::stdout().lock())?;
            println!();
        }
    }
    Ok(())
}
