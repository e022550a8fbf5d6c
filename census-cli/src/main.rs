mod aggregate;
mod catalog;
mod ingest;
mod inspect;
mod logging;
mod table;

use std::path::PathBuf;

use clap::Parser;

use crate::aggregate::{AggregateArgs, exec_aggregate};
use crate::catalog::exec_catalog;
use crate::ingest::{IngestArgs, exec_ingest};
use crate::inspect::{StoreArgs, exec_audit, exec_export, exec_get, exec_info};
use crate::logging::{default_env_filter, setup_logger};

#[derive(clap::Parser)]
#[command(name = "cx", version, about = "Build, inspect and aggregate census record stores")]
struct Cli {
    /// Log everything, unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Parse census source files into a record store.
    Ingest(IngestArgs),
    /// Roll a store of Output Areas up into wards or MSOAs.
    Aggregate(AggregateArgs),
    /// Print one record.
    Get {
        #[command(flatten)]
        store: StoreArgs,

        /// Record id, which is its position in the store.
        id: u64,
    },
    /// Print the size and record count of a store.
    Info {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Check that every stored record id matches its position.
    Audit {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Write a store as CSV, with unset measures as empty cells.
    Export {
        #[command(flatten)]
        store: StoreArgs,

        /// CSV file to write. Defaults to stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List the built-in tables, or print one as a JSON table definition.
    Catalog {
        /// Table to print.
        name: Option<String>,

        /// JSON file to write the table definition to.
        #[arg(short, long, requires = "name")]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logger(default_env_filter(cli.verbose));

    match cli.command {
        Commands::Ingest(args) => exec_ingest(args)?,
        Commands::Aggregate(args) => exec_aggregate(args)?,
        Commands::Get { store, id } => exec_get(store, id)?,
        Commands::Info { store } => exec_info(store)?,
        Commands::Audit { store } => exec_audit(store)?,
        Commands::Export { store, out } => exec_export(store, out)?,
        Commands::Catalog { name, out } => exec_catalog(name, out)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("cx").chain(args.iter().copied()))?;
        match cli.command {
            Commands::Ingest(args) => exec_ingest(args),
            Commands::Info { store } => exec_info(store),
            Commands::Audit { store } => exec_audit(store),
            Commands::Export { store, out } => exec_export(store, out),
            _ => anyhow::bail!("not exercised here"),
        }
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sources_and_levels() {
        let cli = Cli::try_parse_from([
            "cx",
            "ingest",
            "--table",
            "KS101",
            "--out",
            "ks101.bin",
            "KS101EW.csv:ew",
            "KS101SC.csv:scotland",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Ingest(_)));

        assert!(
            Cli::try_parse_from([
                "cx", "aggregate", "-t", "KS101", "--in", "a.bin", "-o", "b.bin", "-l", "msoa",
            ])
            .is_err(),
            "msoa without a lookup table"
        );
        assert!(
            Cli::try_parse_from([
                "cx", "aggregate", "-t", "KS101", "--in", "a.bin", "-o", "b.bin", "-l", "ward",
            ])
            .is_ok()
        );
        assert!(Cli::try_parse_from(["cx", "get", "a.bin", "3"]).is_err());
    }

    #[test]
    fn ingest_then_inspect_a_store() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("KS101EW.csv");
        fs::write(
            &source,
            "GeographyCode,All,Males,Females,Household,Communal,Students\n\
             \"E00000001\",194,97,97,194,0,3\n\
             \"E00000003\",250,120,130,245,5,4\n",
        )
        .unwrap();
        let source = format!("{}:ew", source.display());
        let store = dir.path().join("ks101.bin");
        let store = store.to_str().unwrap();
        let csv = dir.path().join("ks101.csv");
        let csv = csv.to_str().unwrap();

        run(&["ingest", "-t", "KS101", "-o", store, &source]).unwrap();
        run(&["info", "-t", "KS101", store]).unwrap();
        run(&["audit", "-t", "KS101", store]).unwrap();
        run(&["export", "-t", "KS101", store, "-o", csv]).unwrap();

        let exported = fs::read_to_string(csv).unwrap();
        let rows = exported.lines().skip(1).collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec!["0,E00000001,194,97,97,194,0,3", "1,E00000003,250,120,130,245,5,4"]
        );

        // Appending the same source again continues the ids.
        run(&["ingest", "-t", "KS101", "-o", store, "--append", &source]).unwrap();
        run(&["export", "-t", "KS101", store, "-o", csv]).unwrap();
        assert_eq!(fs::read_to_string(csv).unwrap().lines().count(), 5);
    }
}
