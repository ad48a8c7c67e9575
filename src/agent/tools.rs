//! Task operations exposed to the chat model as callable functions.
//!
//! Every invocation produces a JSON object carrying a `success` flag. Failures,
//! including unknown ids and bad arguments, come back as `success: false`
//! payloads so the model can explain them instead of the turn aborting.

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::task_repo::{self, TaskFilter};
use crate::error::{ErrorCode, TodoError};
use crate::models::{Priority, Task, TaskCategory, TaskStatus};
use crate::output::json::{error, statistics_json, task_json, task_list_json};

use super::message::ToolDefinition;

pub const GET_ALL_TASKS: &str = "get_all_tasks";
pub const ADD_TASK: &str = "add_task";
pub const UPDATE_TASK_STATUS: &str = "update_task_status";
pub const DELETE_TASK: &str = "delete_task";
pub const SEARCH_TASKS: &str = "search_tasks";
pub const GET_STATISTICS: &str = "get_statistics";
pub const GET_TASK_DETAIL: &str = "get_task_detail";
pub const BATCH_COMPLETE_TASKS: &str = "batch_complete_tasks";
pub const BATCH_DELETE_TASKS: &str = "batch_delete_tasks";

/// The operation catalog sent to the model on every round.
pub fn definitions() -> Vec<ToolDefinition> {
    let task_id = json!({
        "type": "object",
        "properties": {
            "task_id": {"type": "integer", "description": "Task ID"}
        },
        "required": ["task_id"]
    });
    let task_ids = json!({
        "type": "object",
        "properties": {
            "task_ids": {
                "type": "array",
                "items": {"type": "integer"},
                "description": "List of task IDs"
            }
        },
        "required": ["task_ids"]
    });

    vec![
        ToolDefinition::function(
            GET_ALL_TASKS,
            "List tasks, optionally filtered by status (pending/completed) or category (work/study/life/other).",
            json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["pending", "completed"],
                        "description": "Only return tasks with this status"
                    },
                    "category": {
                        "type": "string",
                        "enum": ["work", "study", "life", "other"],
                        "description": "Only return tasks in this category"
                    }
                }
            }),
        ),
        ToolDefinition::function(
            ADD_TASK,
            "Add a new task. Title is required; description, category and priority are optional.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Task title"},
                    "description": {"type": "string", "description": "Longer description"},
                    "category": {
                        "type": "string",
                        "enum": ["work", "study", "life", "other"],
                        "description": "Task category, defaults to other"
                    },
                    "priority": {
                        "type": "integer",
                        "enum": [1, 2, 3, 4],
                        "description": "1 (low), 2 (medium), 3 (high), 4 (urgent); defaults to 2"
                    }
                },
                "required": ["title"]
            }),
        ),
        ToolDefinition::function(
            UPDATE_TASK_STATUS,
            "Mark a task as completed or as pending again.",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "integer", "description": "ID of the task to update"},
                    "status": {
                        "type": "string",
                        "enum": ["pending", "completed"],
                        "description": "New status"
                    }
                },
                "required": ["task_id", "status"]
            }),
        ),
        ToolDefinition::function(DELETE_TASK, "Delete a task.", task_id.clone()),
        ToolDefinition::function(
            SEARCH_TASKS,
            "Find tasks whose title or description contains a keyword (case-insensitive).",
            json!({
                "type": "object",
                "properties": {
                    "keyword": {"type": "string", "description": "Text to look for"}
                },
                "required": ["keyword"]
            }),
        ),
        ToolDefinition::function(
            GET_STATISTICS,
            "Get totals, completion rate, counts per category and pending counts per priority.",
            json!({"type": "object", "properties": {}}),
        ),
        ToolDefinition::function(GET_TASK_DETAIL, "Get every field of one task.", task_id),
        ToolDefinition::function(
            BATCH_COMPLETE_TASKS,
            "Mark several tasks as completed. IDs that cannot be completed are reported, not fatal.",
            task_ids.clone(),
        ),
        ToolDefinition::function(
            BATCH_DELETE_TASKS,
            "Delete several tasks. IDs that cannot be deleted are reported, not fatal.",
            task_ids,
        ),
    ]
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct AddArgs {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    priority: Option<PriorityArg>,
}

/// Models sometimes send the level as a string, or the name instead.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityArg {
    Level(i64),
    Text(String),
}

impl PriorityArg {
    fn resolve(&self) -> Result<Priority, TodoError> {
        match self {
            Self::Level(level) => Priority::from_level(*level).ok_or_else(|| {
                TodoError::validation(format!("Invalid priority {level}: must be 1-4"))
            }),
            Self::Text(s) => Priority::parse(s),
        }
    }
}

#[derive(Deserialize)]
struct StatusArgs {
    task_id: i64,
    status: String,
}

#[derive(Deserialize)]
struct IdArgs {
    task_id: i64,
}

#[derive(Deserialize)]
struct IdsArgs {
    task_ids: Vec<i64>,
}

#[derive(Deserialize)]
struct SearchArgs {
    keyword: String,
}

/// Dispatches model tool calls onto the task store.
pub struct TodoTools<'a> {
    conn: &'a Connection,
}

impl<'a> TodoTools<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Run one operation. Never fails: errors are folded into the returned payload.
    pub fn execute(&self, name: &str, arguments: &str) -> Value {
        let result = match name {
            GET_ALL_TASKS => self.get_all_tasks(arguments),
            ADD_TASK => self.add_task(arguments),
            UPDATE_TASK_STATUS => self.update_task_status(arguments),
            DELETE_TASK => self.delete_task(arguments),
            SEARCH_TASKS => self.search_tasks(arguments),
            GET_STATISTICS => self.get_statistics(),
            GET_TASK_DETAIL => self.get_task_detail(arguments),
            BATCH_COMPLETE_TASKS => self.batch_complete_tasks(arguments),
            BATCH_DELETE_TASKS => self.batch_delete_tasks(arguments),
            _ => Err(TodoError::unknown_tool(name)),
        };
        match result {
            Ok(value) => value,
            Err(e) => {
                if e.code == ErrorCode::DatabaseError {
                    tracing::warn!(tool = name, error = %e, "tool failed on storage error");
                } else {
                    tracing::debug!(tool = name, error = %e, "tool rejected");
                }
                error(&e)
            }
        }
    }

    fn get_all_tasks(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: ListArgs = parse_args(GET_ALL_TASKS, arguments)?;
        let filter = TaskFilter {
            status: non_empty(args.status.as_deref())
                .map(TaskStatus::parse)
                .transpose()?,
            category: non_empty(args.category.as_deref())
                .map(TaskCategory::parse)
                .transpose()?,
            ..TaskFilter::default()
        };
        let tasks = task_repo::list_tasks(self.conn, &filter)?;
        Ok(json!({
            "success": true,
            "count": tasks.len(),
            "tasks": task_list_json(&tasks),
        }))
    }

    fn add_task(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: AddArgs = parse_args(ADD_TASK, arguments)?;
        let category = match non_empty(args.category.as_deref()) {
            Some(c) => TaskCategory::parse(c)?,
            None => TaskCategory::default(),
        };
        let priority = match args.priority {
            Some(ref p) => p.resolve()?,
            None => Priority::default(),
        };
        let description = args.description.filter(|d| !d.trim().is_empty());

        let mut task = Task::new(args.title, description, category, priority);
        let id = task_repo::add_task(self.conn, &mut task)?;
        Ok(json!({
            "success": true,
            "message": format!("Task added with ID {id}"),
            "task": task_json(&task),
        }))
    }

    fn update_task_status(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: StatusArgs = parse_args(UPDATE_TASK_STATUS, arguments)?;
        let status = TaskStatus::parse(&args.status)?;
        let mut task = task_repo::require_task(self.conn, args.task_id)?;
        task.set_status(status);
        task_repo::update_task(self.conn, &mut task)?;
        Ok(json!({
            "success": true,
            "message": format!("Task {} marked as {}", task.id, status.as_str()),
            "task": task_json(&task),
        }))
    }

    fn delete_task(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: IdArgs = parse_args(DELETE_TASK, arguments)?;
        task_repo::delete_task(self.conn, args.task_id)?;
        Ok(json!({
            "success": true,
            "message": format!("Task {} deleted", args.task_id),
        }))
    }

    fn search_tasks(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: SearchArgs = parse_args(SEARCH_TASKS, arguments)?;
        let tasks = task_repo::search_tasks(self.conn, &args.keyword)?;
        Ok(json!({
            "success": true,
            "keyword": args.keyword,
            "count": tasks.len(),
            "tasks": task_list_json(&tasks),
        }))
    }

    fn get_statistics(&self) -> Result<Value, TodoError> {
        let stats = task_repo::statistics(self.conn)?;
        Ok(json!({
            "success": true,
            "statistics": statistics_json(&stats),
        }))
    }

    fn get_task_detail(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: IdArgs = parse_args(GET_TASK_DETAIL, arguments)?;
        let task = task_repo::require_task(self.conn, args.task_id)?;
        Ok(json!({
            "success": true,
            "task": task_json(&task),
        }))
    }

    fn batch_complete_tasks(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: IdsArgs = parse_args(BATCH_COMPLETE_TASKS, arguments)?;
        let (success_count, failed_ids) = self.for_each_id(&args.task_ids, |conn, id| {
            let mut task = task_repo::require_task(conn, id)?;
            task.mark_completed();
            task_repo::update_task(conn, &mut task)
        });
        Ok(json!({
            "success": true,
            "message": format!("Marked {success_count} task(s) as completed"),
            "success_count": success_count,
            "failed_ids": failed_ids,
        }))
    }

    fn batch_delete_tasks(&self, arguments: &str) -> Result<Value, TodoError> {
        let args: IdsArgs = parse_args(BATCH_DELETE_TASKS, arguments)?;
        let (success_count, failed_ids) =
            self.for_each_id(&args.task_ids, task_repo::delete_task);
        Ok(json!({
            "success": true,
            "message": format!("Deleted {success_count} task(s)"),
            "success_count": success_count,
            "failed_ids": failed_ids,
        }))
    }

    /// Best effort: each id is handled on its own and failures are collected.
    fn for_each_id<F>(&self, ids: &[i64], mut op: F) -> (usize, Vec<i64>)
    where
        F: FnMut(&Connection, i64) -> Result<(), TodoError>,
    {
        let mut success_count = 0;
        let mut failed_ids = Vec::new();
        for &id in ids {
            match op(self.conn, id) {
                Ok(()) => success_count += 1,
                Err(e) => {
                    tracing::warn!(id, error = %e, "batch item failed");
                    failed_ids.push(id);
                }
            }
        }
        (success_count, failed_ids)
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: &str) -> Result<T, TodoError> {
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(raw)
        .map_err(|e| TodoError::validation(format!("Invalid arguments for {tool}: {e}")))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}
