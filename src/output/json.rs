use serde_json::{json, Value};

use crate::error::TodoError;
use crate::models::{Statistics, Task};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &TodoError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": t.description,
        "status": t.status.as_str(),
        "category": t.category.as_str(),
        "priority": t.priority.level(),
        "created_at": t.created_at.to_rfc3339(),
        "updated_at": t.updated_at.to_rfc3339(),
        "completed_at": t.completed_at.map(|c| c.to_rfc3339()),
    })
}

pub fn task_list_json(tasks: &[Task]) -> Value {
    Value::Array(tasks.iter().map(task_json).collect())
}

pub fn statistics_json(s: &Statistics) -> Value {
    json!({
        "total": s.total,
        "completed": s.completed,
        "pending": s.pending,
        "completion_rate": (s.completion_rate * 10.0).round() / 10.0,
        "by_category": s.by_category,
        "by_priority": s.by_priority,
    })
}
