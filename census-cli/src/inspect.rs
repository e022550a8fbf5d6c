use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use census::store::{RecordStore, export_csv};
use census::{SENTINEL, TableDef};
use humansize::{DECIMAL, format_size};

use crate::table::TableArgs;

/// Audit findings listed before the rest are only counted.
const AUDIT_LIST_LIMIT: usize = 20;

#[derive(Debug, clap::Args)]
pub struct StoreArgs {
    #[command(flatten)]
    table: TableArgs,

    /// Record store to read.
    file: PathBuf,
}

impl StoreArgs {
    fn open(&self) -> anyhow::Result<(TableDef, RecordStore)> {
        let table = self.table.resolve()?;
        let store = RecordStore::open(&self.file, table.schema().clone())?;
        Ok((table, store))
    }
}

pub fn exec_get(args: StoreArgs, id: u64) -> anyhow::Result<()> {
    let (table, store) = args.open()?;
    let record = store.get(id)?;

    println!("id\t{}", record.id());
    println!("zone\t{}", record.zone());
    for (field, value) in table.schema().fields().iter().zip(record.measures()) {
        if *value == SENTINEL {
            println!("{}\tunset", field.name());
        } else {
            println!("{}\t{}", field.name(), value);
        }
    }
    Ok(())
}

pub fn exec_info(args: StoreArgs) -> anyhow::Result<()> {
    let (table, store) = args.open()?;
    let bytes = store.byte_len()?;

    println!("file\t{}", args.file.display());
    println!("schema\t{}", table.schema());
    println!("record length\t{} bytes", table.schema().record_len());
    println!("records\t{}", store.count()?);
    println!("size\t{}", format_size(bytes, DECIMAL));
    Ok(())
}

pub fn exec_audit(args: StoreArgs) -> anyhow::Result<()> {
    let (_, store) = args.open()?;
    let divergent = store.audit_ids()?;

    if divergent.is_empty() {
        println!("all {} record ids match their positions", store.count()?);
        return Ok(());
    }
    for (position, id) in divergent.iter().take(AUDIT_LIST_LIMIT) {
        println!("position {position} holds id {id}");
    }
    if divergent.len() > AUDIT_LIST_LIMIT {
        println!("... and {} more", divergent.len() - AUDIT_LIST_LIMIT);
    }
    anyhow::bail!(
        "{} of {} record ids differ from their positions",
        divergent.len(),
        store.count()?
    )
}

pub fn exec_export(args: StoreArgs, out: Option<PathBuf>) -> anyhow::Result<()> {
    let (_, store) = args.open()?;
    let written = match &out {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            export_csv(&store, BufWriter::new(file))?
        }
        None => export_csv(&store, io::stdout().lock())?,
    };
    if let Some(path) = out {
        println!("{} records exported to {}", written, path.display());
    } else {
        io::stdout().flush()?;
    }
    Ok(())
}
