use crate::cli::print_json;
use crate::db::{task_repo, Database};
use crate::error::TodoError;
use crate::output;

pub fn run(db: &Database, json_output: bool) -> Result<i32, TodoError> {
    let stats = task_repo::statistics(db.conn())?;
    if json_output {
        print_json(&output::json::success(output::json::statistics_json(&stats)));
    } else {
        output::text::print_statistics(&stats);
    }
    Ok(0)
}
