// Task persistence over a pooled SQLite connection

use rusqlite::{OptionalExtension, Params, Row, params};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::connection::ConnectionPool;
use crate::error::{Result, StoreError};
use crate::models::{Task, now_secs};

const SELECT_ALL: &str = "SELECT id, opened, closed, author_id, assigned_id, title, content FROM tasks";

const SELECT_BY_AUTHOR: &str =
    "SELECT id, opened, closed, author_id, assigned_id, title, content FROM tasks WHERE author_id = ?1";

const SELECT_BY_LABEL: &str = r#"
    SELECT tasks.id, tasks.opened, tasks.closed, tasks.author_id, tasks.assigned_id, tasks.title, tasks.content
    FROM tasks
    JOIN tasks_labels ON tasks_labels.task_id = tasks.id
    JOIN labels ON labels.id = tasks_labels.label_id
    WHERE labels.name = ?1
"#;

/// CRUD and filtered listing for tasks, with labels filled in on read.
///
/// Every method checks a connection out of the pool and runs its statements
/// one after another in autocommit mode. Nothing is cached and nothing is
/// retried; database errors are returned as soon as they happen.
#[derive(Clone)]
pub struct TaskStore {
    pool: ConnectionPool,
}

impl TaskStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a task and attach its labels.
    ///
    /// Stamps `opened` with the current time and writes the generated id back
    /// into `task`. Incoming `id` and `closed` values are ignored. If the task
    /// row itself cannot be inserted, `task` is left untouched.
    ///
    /// Labels are resolved by name in order. The first name that does not
    /// exist fails the call with [`StoreError::NotFound`]; the task row and
    /// any labels attached before it stay in the database.
    pub fn create(&self, task: &mut Task) -> Result<i64> {
        let conn = self.pool.get()?;

        let opened = now_secs();

        conn.execute(
            "INSERT INTO tasks (author_id, assigned_id, title, content, opened)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task.author_id, task.assigned_id, task.title, task.content, opened],
        )?;
        let id = conn.last_insert_rowid();
        task.id = id;
        task.opened = opened;
        task.closed = None;
        debug!(id, author_id = task.author_id, labels = task.labels.len(), "create: inserted task");

        for label in &task.labels {
            let label_id: i64 = conn
                .query_row("SELECT id FROM labels WHERE name = ?1", [label], |row| row.get(0))
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("label {:?}", label)))?;

            conn.execute(
                "INSERT INTO tasks_labels (task_id, label_id) VALUES (?1, ?2)",
                params![id, label_id],
            )?;
            debug!(id, label, label_id, "create: attached label");
        }

        info!(id, "Task created");
        Ok(id)
    }

    /// Overwrite title, content, opened, closed and assigned_id of `task.id`.
    ///
    /// This is a full replace: callers pass every field, including the
    /// original `opened`. An id that matches no row is not an error.
    pub fn update(&self, task: &Task) -> Result<()> {
        let conn = self.pool.get()?;

        let affected = conn.execute(
            "UPDATE tasks
             SET title = ?1, content = ?2, opened = ?3, closed = ?4, assigned_id = ?5
             WHERE id = ?6",
            params![
                task.title,
                task.content,
                task.opened,
                task.closed,
                task.assigned_id,
                task.id
            ],
        )?;

        if affected == 0 {
            warn!(id = task.id, "update: no task with this id, nothing written");
        } else {
            debug!(id = task.id, "update: task overwritten");
        }

        Ok(())
    }

    /// Delete a task by id.
    ///
    /// Fails with [`StoreError::NotFound`] when no row was removed. Label
    /// associations of the task are left in `tasks_labels`.
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.pool.get()?;

        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("task {}", id)));
        }

        info!(id, "Task deleted");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All tasks, in whatever order the database returns them.
    pub fn get_all(&self) -> Result<Vec<Task>> {
        self.load_tasks(SELECT_ALL, [])
    }

    /// Tasks written by `author_id`. Empty when the author has none.
    pub fn get_by_author(&self, author_id: i64) -> Result<Vec<Task>> {
        self.load_tasks(SELECT_BY_AUTHOR, [author_id])
    }

    /// Tasks carrying the label `name`.
    ///
    /// A task appears once per matching association row, so a task linked
    /// to the same label twice is returned twice.
    pub fn get_by_label(&self, name: &str) -> Result<Vec<Task>> {
        self.load_tasks(SELECT_BY_LABEL, [name])
    }

    /// Run a task query, then fill in labels from full reads of `labels` and
    /// `tasks_labels`.
    fn load_tasks<P: Params>(&self, sql: &str, args: P) -> Result<Vec<Task>> {
        let conn = self.pool.get()?;

        let mut tasks = {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(args, Self::map_task)?;
            rows.collect::<rusqlite::Result<Vec<Task>>>()?
        };

        let labels: HashMap<i64, String> = {
            let mut stmt = conn.prepare("SELECT id, name FROM labels")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut stmt = conn.prepare("SELECT task_id, label_id FROM tasks_labels")?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let task_id: i64 = row.get(0)?;
            let label_id: i64 = row.get(1)?;

            let Some(name) = labels.get(&label_id) else {
                warn!(task_id, label_id, "Association points at a missing label, skipping");
                continue;
            };

            for task in tasks.iter_mut().filter(|t| t.id == task_id) {
                task.labels.push(name.clone());
            }
        }

        debug!(count = tasks.len(), labels = labels.len(), "load_tasks: loaded");
        Ok(tasks)
    }

    fn map_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        Ok(Task {
            id: row.get(0)?,
            opened: row.get(1)?,
            closed: row.get(2)?,
            author_id: row.get(3)?,
            assigned_id: row.get(4)?,
            title: row.get(5)?,
            content: row.get(6)?,
            labels: Vec::new(),
        })
    }
}
