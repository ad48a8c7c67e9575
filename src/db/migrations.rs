use rusqlite::Connection;

use crate::error::TodoError;

pub fn run_migrations(conn: &Connection) -> Result<(), TodoError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(trim(title)) > 0),
            description TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'completed')),
            category TEXT NOT NULL DEFAULT 'other'
                CHECK (category IN ('work', 'study', 'life', 'other')),
            priority INTEGER NOT NULL DEFAULT 2
                CHECK (priority BETWEEN 1 AND 4),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
        CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
        ",
    )
    .map_err(|e| TodoError::from(e).context("initialize schema"))?;
    Ok(())
}
