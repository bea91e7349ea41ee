//! roster_sql - print the SQL that seeds the cameras table from the roster.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use webcam_indexer::roster::load_entries;
use webcam_indexer::store::{seed_sql, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_TABLE};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render INSERT statements for the camera roster")]
struct Args {
    /// Roster file (JSON array of camera objects).
    #[arg(long, env = "INDEXER_ROSTER_PATH", default_value = "cameras.json")]
    roster: PathBuf,

    /// Target table.
    #[arg(long, env = "INDEXER_STORE_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Length of the zero embedding each row starts with.
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSION)]
    dimension: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let entries = load_entries(&args.roster)?;
    if entries.is_empty() {
        return Err(anyhow!(
            "roster {} has no cameras with an id",
            args.roster.display()
        ));
    }
    log::info!("rendering {} rows for table {}", entries.len(), args.table);
    println!("{}", seed_sql(&args.table, &entries, args.dimension));
    Ok(())
}
