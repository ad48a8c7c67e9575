use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ToSql};

use crate::error::TodoError;
use crate::models::{validate_title, Priority, Statistics, Task, TaskCategory, TaskStatus};

const TASK_COLUMNS: &str = "id, title, description, status, category, priority,
                created_at, updated_at, completed_at";

/// Ordering for `list_tasks`. Ties always fall back to newest id first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    /// Priority descending, then creation time descending.
    #[default]
    Priority,
    Created,
    Updated,
}

impl SortField {
    fn order_by(&self) -> &'static str {
        match self {
            Self::Priority => "priority DESC, created_at DESC, id DESC",
            Self::Created => "created_at DESC, id DESC",
            Self::Updated => "updated_at DESC, id DESC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, TodoError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(Self::Priority),
            "created" | "created_at" => Ok(Self::Created),
            "updated" | "updated_at" => Ok(Self::Updated),
            _ => Err(TodoError::validation(format!(
                "Invalid sort field '{s}': must be one of priority, created, updated"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub sort: SortField,
}

/// Insert a new task, writing the generated id back into it.
pub fn add_task(conn: &Connection, task: &mut Task) -> Result<i64, TodoError> {
    task.title = validate_title(&task.title)?;
    conn.execute(
        "INSERT INTO tasks (title, description, status, category, priority,
                            created_at, updated_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            task.title,
            task.description,
            task.status,
            task.category,
            task.priority,
            task.created_at,
            task.updated_at,
            task.completed_at,
        ],
    )
    .map_err(|e| TodoError::from(e).context("add task"))?;
    task.id = conn.last_insert_rowid();
    tracing::debug!(id = task.id, "task added");
    Ok(task.id)
}

/// `Ok(None)` when the id has no row; errors are reserved for database failures.
pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>, TodoError> {
    let mut stmt = conn
        .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))
        .map_err(|e| TodoError::from(e).context(&format!("get task {id}")))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_task(row)?)),
        None => Ok(None),
    }
}

/// Like `get_task`, but a missing row is a `TASK_NOT_FOUND` error.
pub fn require_task(conn: &Connection, id: i64) -> Result<Task, TodoError> {
    get_task(conn, id)?.ok_or_else(|| TodoError::task_not_found(id))
}

pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>, TodoError> {
    let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE 1=1");
    let mut args: Vec<&dyn ToSql> = Vec::new();

    if let Some(ref status) = filter.status {
        sql.push_str(" AND status = ?");
        args.push(status);
    }
    if let Some(ref category) = filter.category {
        sql.push_str(" AND category = ?");
        args.push(category);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(filter.sort.order_by());

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| TodoError::from(e).context("list tasks"))?;
    let tasks = stmt
        .query_map(args.as_slice(), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Replace every mutable column of the row with `task`'s values and stamp `updated_at`.
pub fn update_task(conn: &Connection, task: &mut Task) -> Result<(), TodoError> {
    task.title = validate_title(&task.title)?;
    task.touch();
    let affected = conn
        .execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, status = ?3, category = ?4,
                 priority = ?5, updated_at = ?6, completed_at = ?7
             WHERE id = ?8",
            params![
                task.title,
                task.description,
                task.status,
                task.category,
                task.priority,
                task.updated_at,
                task.completed_at,
                task.id,
            ],
        )
        .map_err(|e| TodoError::from(e).context(&format!("update task {}", task.id)))?;
    if affected == 0 {
        return Err(TodoError::task_not_found(task.id));
    }
    Ok(())
}

pub fn delete_task(conn: &Connection, id: i64) -> Result<(), TodoError> {
    let affected = conn
        .execute("DELETE FROM tasks WHERE id = ?1", params![id])
        .map_err(|e| TodoError::from(e).context(&format!("delete task {id}")))?;
    if affected == 0 {
        return Err(TodoError::task_not_found(id));
    }
    tracing::debug!(id, "task deleted");
    Ok(())
}

/// Case-insensitive substring search over title and description.
pub fn search_tasks(conn: &Connection, keyword: &str) -> Result<Vec<Task>, TodoError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE title LIKE ?1 ESCAPE '\\' OR COALESCE(description, '') LIKE ?1 ESCAPE '\\'
         ORDER BY {}",
        SortField::Priority.order_by()
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| TodoError::from(e).context("search tasks"))?;
    let tasks = stmt
        .query_map(params![like_pattern(keyword)], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn statistics(conn: &Connection) -> Result<Statistics, TodoError> {
    let (total, completed): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COALESCE(SUM(status = 'completed'), 0) FROM tasks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| TodoError::from(e).context("count tasks"))?;
    let mut stats = Statistics::from_counts(total, completed);

    let mut stmt = conn.prepare("SELECT category, COUNT(*) FROM tasks GROUP BY category")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, TaskCategory>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (category, count) = row?;
        stats.by_category.insert(category, count);
    }

    let mut stmt = conn.prepare(
        "SELECT priority, COUNT(*) FROM tasks WHERE status = 'pending' GROUP BY priority",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Priority>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (priority, count) = row?;
        stats.by_priority.insert(priority, count);
    }

    Ok(stats)
}

fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        category: row.get(4)?,
        priority: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::from_str(s).ok_or_else(|| FromSqlError::Other(format!("unknown status '{s}'").into()))
    }
}

impl ToSql for TaskCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::from_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown category '{s}'").into()))
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.level())))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let level = value.as_i64()?;
        Self::from_level(level).ok_or(FromSqlError::OutOfRange(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn new_task(title: &str, priority: Priority) -> Task {
        Task::new(title, None, TaskCategory::Other, priority)
    }

    fn insert(conn: &Connection, title: &str, priority: Priority) -> Task {
        let mut task = new_task(title, priority);
        add_task(conn, &mut task).unwrap();
        task
    }

    #[test]
    fn add_then_get_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let mut task = Task::new(
            "Prepare demo",
            Some("slides and script".into()),
            TaskCategory::Work,
            Priority::Urgent,
        );
        let id = add_task(db.conn(), &mut task).unwrap();
        assert!(id > 0);

        let loaded = get_task(db.conn(), id).unwrap().unwrap();
        assert_eq!(loaded, task);
        assert_eq!(loaded.status, TaskStatus::Pending);
        assert!(loaded.completed_at.is_none());
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[test]
    fn add_rejects_empty_title() {
        let db = Database::open_in_memory().unwrap();
        let mut task = new_task("  ", Priority::Low);
        let err = add_task(db.conn(), &mut task).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
        assert!(list_tasks(db.conn(), &TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let db = Database::open_in_memory().unwrap();
        let a = insert(db.conn(), "a", Priority::Low);
        delete_task(db.conn(), a.id).unwrap();
        let b = insert(db.conn(), "b", Priority::Low);
        assert!(b.id > a.id);
    }

    #[test]
    fn get_missing_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(get_task(db.conn(), 42).unwrap().is_none());
        assert!(require_task(db.conn(), 42).unwrap_err().is_not_found());
    }

    #[test]
    fn update_persists_transitions() {
        let db = Database::open_in_memory().unwrap();
        let mut task = insert(db.conn(), "read book", Priority::Medium);

        task.mark_completed();
        update_task(db.conn(), &mut task).unwrap();
        let done = get_task(db.conn(), task.id).unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());
        assert!(done.updated_at >= done.created_at);

        task.mark_pending();
        update_task(db.conn(), &mut task).unwrap();
        let reopened = get_task(db.conn(), task.id).unwrap().unwrap();
        assert_eq!(reopened.status, TaskStatus::Pending);
        assert!(reopened.completed_at.is_none());
        assert!(reopened.updated_at >= done.updated_at);
    }

    #[test]
    fn update_missing_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let mut ghost = new_task("ghost", Priority::Low);
        ghost.id = 99;
        assert!(update_task(db.conn(), &mut ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_semantics() {
        let db = Database::open_in_memory().unwrap();
        assert!(delete_task(db.conn(), 7).unwrap_err().is_not_found());

        let task = insert(db.conn(), "temp", Priority::Low);
        delete_task(db.conn(), task.id).unwrap();
        assert!(get_task(db.conn(), task.id).unwrap().is_none());
    }

    #[test]
    fn list_filters_and_default_order() {
        let db = Database::open_in_memory().unwrap();
        let a = insert(db.conn(), "A", Priority::Urgent);
        let mut b = insert(db.conn(), "B", Priority::Low);
        let c = insert(db.conn(), "C", Priority::High);
        b.mark_completed();
        update_task(db.conn(), &mut b).unwrap();

        let pending = list_tasks(
            db.conn(),
            &TaskFilter {
                status: Some(TaskStatus::Pending),
                ..TaskFilter::default()
            },
        )
        .unwrap();
        let ids: Vec<i64> = pending.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);

        let completed = list_tasks(
            db.conn(),
            &TaskFilter {
                status: Some(TaskStatus::Completed),
                ..TaskFilter::default()
            },
        )
        .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, b.id);

        let all = list_tasks(db.conn(), &TaskFilter::default()).unwrap();
        let ids: Vec<i64> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, c.id, b.id]);
    }

    #[test]
    fn list_same_priority_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let first = insert(db.conn(), "first", Priority::Medium);
        let second = insert(db.conn(), "second", Priority::Medium);
        let all = list_tasks(db.conn(), &TaskFilter::default()).unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn list_by_category_and_sort_updated() {
        let db = Database::open_in_memory().unwrap();
        let mut work = Task::new("w", None, TaskCategory::Work, Priority::Low);
        add_task(db.conn(), &mut work).unwrap();
        let mut life = Task::new("l", None, TaskCategory::Life, Priority::Urgent);
        add_task(db.conn(), &mut life).unwrap();

        let only_work = list_tasks(
            db.conn(),
            &TaskFilter {
                category: Some(TaskCategory::Work),
                ..TaskFilter::default()
            },
        )
        .unwrap();
        assert_eq!(only_work.len(), 1);
        assert_eq!(only_work[0].id, work.id);

        work.description = Some("touched".into());
        update_task(db.conn(), &mut work).unwrap();
        let by_updated = list_tasks(
            db.conn(),
            &TaskFilter {
                sort: SortField::Updated,
                ..TaskFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_updated[0].id, work.id);
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let db = Database::open_in_memory().unwrap();
        let report = insert(db.conn(), "Quarterly REPORT", Priority::High);
        let mut gym = Task::new(
            "Gym",
            Some("leg day, then write report notes".into()),
            TaskCategory::Life,
            Priority::Low,
        );
        add_task(db.conn(), &mut gym).unwrap();
        insert(db.conn(), "Groceries", Priority::Medium);

        let hits = search_tasks(db.conn(), "report").unwrap();
        let ids: Vec<i64> = hits.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![report.id, gym.id]);

        assert_eq!(search_tasks(db.conn(), "").unwrap().len(), 3);
        assert!(search_tasks(db.conn(), "nothing-like-this").unwrap().is_empty());
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        insert(db.conn(), "100% done", Priority::Low);
        insert(db.conn(), "1000 things", Priority::Low);
        insert(db.conn(), "snake_case", Priority::Low);
        insert(db.conn(), "snakeXcase", Priority::Low);

        assert_eq!(search_tasks(db.conn(), "0%").unwrap().len(), 1);
        assert_eq!(search_tasks(db.conn(), "e_c").unwrap().len(), 1);
    }

    #[test]
    fn statistics_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let stats = statistics(db.conn()).unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert!(stats.by_category.is_empty());
        assert!(stats.by_priority.is_empty());
    }

    #[test]
    fn statistics_scenario() {
        let db = Database::open_in_memory().unwrap();
        insert(db.conn(), "A", Priority::Urgent);
        let mut b = Task::new("B", None, TaskCategory::Work, Priority::Low);
        add_task(db.conn(), &mut b).unwrap();
        b.mark_completed();
        update_task(db.conn(), &mut b).unwrap();
        insert(db.conn(), "C", Priority::High);

        let stats = statistics(db.conn()).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert!((stats.completion_rate - 100.0 / 3.0).abs() < 1e-9);

        assert_eq!(stats.by_category.values().sum::<i64>(), 3);
        assert_eq!(stats.by_category[&TaskCategory::Work], 1);
        assert_eq!(stats.by_category[&TaskCategory::Other], 2);

        assert_eq!(stats.by_priority.values().sum::<i64>(), 2);
        assert!(!stats.by_priority.contains_key(&Priority::Low));
        assert_eq!(stats.by_priority[&Priority::Urgent], 1);
        assert_eq!(stats.by_priority[&Priority::High], 1);
    }
}
