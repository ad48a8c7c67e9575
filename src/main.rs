use clap::Parser;
use std::process;

use todoai::cli::commands::Cli;
use todoai::cli;
use todoai::config;
use todoai::db::Database;
use todoai::error::TodoError;
use tracing_subscriber::EnvFilter;

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn open_db(flag: Option<&str>) -> Result<Database, TodoError> {
    let path = config::db_path(flag)?;
    Database::open(&path)
}

fn main() {
    let cli_args = Cli::parse();
    let json_output = cli_args.json;

    if let Err(e) = init_logging() {
        eprintln!("warning: {e:#}");
    }

    let db = match open_db(cli_args.db.as_deref()) {
        Ok(db) => db,
        Err(e) => process::exit(cli::finish(Err(e), json_output)),
    };

    let exit_code = cli::run(cli_args.command, json_output, &db);

    if let Err(e) = db.close() {
        tracing::warn!(error = %e, "failed to close database");
    }
    process::exit(exit_code);
}
