use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::cli::print_json;
use crate::db::task_repo::{self, SortField, TaskFilter};
use crate::db::Database;
use crate::error::{ErrorCode, TodoError};
use crate::models::{Priority, Task, TaskCategory, TaskStatus};
use crate::output;

pub(crate) fn add(
    db: &Database,
    title: &str,
    description: Option<String>,
    category: &str,
    priority: &str,
    json_output: bool,
) -> Result<i32, TodoError> {
    // Validate everything before touching the store.
    let category = TaskCategory::parse(category)?;
    let priority = Priority::parse(priority)?;
    let description = description.filter(|d| !d.trim().is_empty());

    let mut task = Task::new(title, description, category, priority);
    task_repo::add_task(db.conn(), &mut task)?;

    if json_output {
        print_json(&output::json::success(json!({
            "task": output::json::task_json(&task)
        })));
    } else {
        println!("Added task {}", task.id);
        output::text::print_task(&task);
    }
    Ok(0)
}

pub(crate) fn list(
    db: &Database,
    status: Option<&str>,
    category: Option<&str>,
    sort: &str,
    json_output: bool,
) -> Result<i32, TodoError> {
    let filter = TaskFilter {
        status: status.map(TaskStatus::parse).transpose()?,
        category: category.map(TaskCategory::parse).transpose()?,
        sort: SortField::parse(sort)?,
    };
    let tasks = task_repo::list_tasks(db.conn(), &filter)?;

    if json_output {
        print_json(&output::json::success(json!({
            "count": tasks.len(),
            "tasks": output::json::task_list_json(&tasks)
        })));
    } else {
        output::text::print_task_list(&tasks);
    }
    Ok(0)
}

pub(crate) fn show(db: &Database, id: i64, json_output: bool) -> Result<i32, TodoError> {
    let task = task_repo::require_task(db.conn(), id)?;
    if json_output {
        print_json(&output::json::success(json!({
            "task": output::json::task_json(&task)
        })));
    } else {
        output::text::print_task_detail(&task);
    }
    Ok(0)
}

pub(crate) fn complete(
    db: &Database,
    id: i64,
    uncomplete: bool,
    json_output: bool,
) -> Result<i32, TodoError> {
    let mut task = task_repo::require_task(db.conn(), id)?;
    if uncomplete {
        task.mark_pending();
    } else {
        task.mark_completed();
    }
    task_repo::update_task(db.conn(), &mut task)?;

    if json_output {
        print_json(&output::json::success(json!({
            "task": output::json::task_json(&task)
        })));
    } else {
        println!("Task {} → {}", task.id, task.status.as_str());
        output::text::print_task(&task);
    }
    Ok(0)
}

/// `target` is a task ID when it parses as one, otherwise a search keyword.
pub(crate) fn delete(
    db: &Database,
    target: &str,
    yes: bool,
    json_output: bool,
) -> Result<i32, TodoError> {
    match target.trim().parse::<i64>() {
        Ok(id) => delete_by_id(db, id, yes, json_output),
        Err(_) => delete_by_keyword(db, target, yes, json_output),
    }
}

fn delete_by_id(db: &Database, id: i64, yes: bool, json_output: bool) -> Result<i32, TodoError> {
    let task = task_repo::require_task(db.conn(), id)?;

    if !yes && !json_output {
        output::text::print_task(&task);
        if !confirm(&format!("Delete task {id}? [y/N] "))? {
            println!("Cancelled.");
            return Ok(0);
        }
    }

    remove(db, id, json_output)
}

fn delete_by_keyword(
    db: &Database,
    keyword: &str,
    yes: bool,
    json_output: bool,
) -> Result<i32, TodoError> {
    let matches = task_repo::search_tasks(db.conn(), keyword)?;

    if json_output {
        return match matches.as_slice() {
            [] => Err(TodoError::new(
                ErrorCode::TaskNotFound,
                format!("No task matches '{keyword}'"),
            )),
            [task] => remove(db, task.id, true),
            _ => Err(TodoError::validation(format!(
                "'{keyword}' matches {} tasks; delete by ID instead",
                matches.len()
            ))),
        };
    }

    if matches.is_empty() {
        println!("No tasks matching '{keyword}'.");
        return Ok(0);
    }

    println!("{} task(s) matching '{keyword}':", matches.len());
    for (n, t) in matches.iter().enumerate() {
        print!("{:>3}) ", n + 1);
        output::text::print_task(t);
    }

    let answer = read_answer(&format!(
        "Select a task to delete (1-{}, 0 to cancel): ",
        matches.len()
    ))?;
    let choice = answer
        .parse::<usize>()
        .ok()
        .filter(|&n| n <= matches.len())
        .ok_or_else(|| TodoError::validation(format!("Invalid selection: '{answer}'")))?;
    if choice == 0 {
        println!("Cancelled.");
        return Ok(0);
    }

    let task = &matches[choice - 1];
    if !yes {
        output::text::print_task_detail(task);
        if !confirm(&format!("Delete task {}? [y/N] ", task.id))? {
            println!("Cancelled.");
            return Ok(0);
        }
    }

    remove(db, task.id, false)
}

fn remove(db: &Database, id: i64, json_output: bool) -> Result<i32, TodoError> {
    task_repo::delete_task(db.conn(), id)?;
    if json_output {
        print_json(&output::json::success(json!({ "deleted": id })));
    } else {
        println!("Deleted task {id}");
    }
    Ok(0)
}

pub(crate) fn search(db: &Database, keyword: &str, json_output: bool) -> Result<i32, TodoError> {
    let tasks = task_repo::search_tasks(db.conn(), keyword)?;

    if json_output {
        print_json(&output::json::success(json!({
            "keyword": keyword,
            "count": tasks.len(),
            "tasks": output::json::task_list_json(&tasks)
        })));
    } else if tasks.is_empty() {
        println!("No tasks matching '{keyword}'.");
    } else {
        println!("{} task(s) matching '{keyword}':", tasks.len());
        for t in &tasks {
            output::text::print_task(t);
        }
    }
    Ok(0)
}

fn read_answer(prompt: &str) -> Result<String, TodoError> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn confirm(prompt: &str) -> Result<bool, TodoError> {
    let answer = read_answer(prompt)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
