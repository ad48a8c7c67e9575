pub mod chat;
pub mod commands;
pub mod stats;
pub mod task;

pub use commands::*;

use serde_json::Value;

use crate::db::Database;
use crate::error::TodoError;
use crate::output;

/// Run one subcommand against an open database and return the process exit code.
pub fn run(command: Commands, json_output: bool, db: &Database) -> i32 {
    let result = match command {
        Commands::Add {
            title,
            description,
            category,
            priority,
        } => task::add(db, &title, description, &category, &priority, json_output),
        Commands::List {
            status,
            category,
            sort,
        } => task::list(db, status.as_deref(), category.as_deref(), &sort, json_output),
        Commands::Show { id } => task::show(db, id, json_output),
        Commands::Complete { id, uncomplete } => task::complete(db, id, uncomplete, json_output),
        Commands::Delete { target, yes } => task::delete(db, &target, yes, json_output),
        Commands::Search { keyword } => task::search(db, &keyword, json_output),
        Commands::Stats => stats::run(db, json_output),
        Commands::Chat => chat::run(db),
    };
    finish(result, json_output)
}

pub(crate) fn print_json(value: &Value) {
    println!("{value:#}");
}

/// Turn a command result into an exit code, reporting errors in the requested format.
pub fn finish(result: Result<i32, TodoError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                print_json(&output::json::error(&e));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}
