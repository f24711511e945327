//! Raw query command
//!
//! Usage: tabula query '<SQL>' [--config tabula.toml | --db store.db] [--arg VALUE]...

use std::path::PathBuf;

use clap::Args;
use rusqlite::params_from_iter;
use serde_json::Map;
use tabula_store::{sql, ExecutionQueue, StoreConfig};

use super::{parse_arg, to_json, CommandResult};

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// SQL statement with `?` placeholders
    pub sql: String,

    /// Store configuration file (TOML)
    #[arg(long, conflicts_with = "db")]
    pub config: Option<PathBuf>,

    /// Database file, opened with default settings
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Positional argument; JSON scalars keep their type
    #[arg(long = "arg", value_name = "VALUE")]
    pub args: Vec<String>,
}

pub fn execute(args: QueryArgs) -> CommandResult {
    let config = match (&args.config, &args.db) {
        (Some(path), _) => StoreConfig::load(path)?,
        (None, Some(db)) => StoreConfig::at_path(db),
        (None, None) => return Err("either --config or --db is required".into()),
    };
    let bindings: Vec<_> = args.args.iter().map(|a| sql::to_sql(&parse_arg(a))).collect();
    let statement = args.sql;

    let queue = ExecutionQueue::open(&config)?;
    let rows = queue.execute(move |conn| -> rusqlite::Result<Vec<Map<String, serde_json::Value>>> {
        let mut stmt = conn.prepare(&statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mapped = stmt.query_map(params_from_iter(bindings.iter()), |row| {
            let mut object = Map::new();
            for (i, column) in columns.iter().enumerate() {
                object.insert(column.clone(), to_json(&sql::from_sql(row.get_ref(i)?)));
            }
            Ok(object)
        })?;
        mapped.collect()
    })??;

    for row in rows {
        println!("{}", serde_json::Value::Object(row));
    }
    Ok(())
}
