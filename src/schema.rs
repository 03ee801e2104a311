// Schema provisioning and fixture seeding
//
// TaskStore only reads labels and users; these helpers are how the CLI and
// the tests put them there.

use tracing::{debug, info, warn};

use crate::connection::{ConnectionPool, foreign_keys_enabled};
use crate::error::Result;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS labels (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        opened INTEGER NOT NULL,
        closed INTEGER,
        author_id INTEGER NOT NULL REFERENCES users(id),
        assigned_id INTEGER REFERENCES users(id),
        title TEXT NOT NULL,
        content TEXT NOT NULL
    );

    -- no foreign key on task_id: deleted tasks leave their rows behind
    CREATE TABLE IF NOT EXISTS tasks_labels (
        task_id INTEGER NOT NULL,
        label_id INTEGER NOT NULL REFERENCES labels(id)
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_author ON tasks(author_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_labels_label ON tasks_labels(label_id);
"#;

/// Create all tables if they do not exist yet.
pub fn provision(pool: &ConnectionPool) -> Result<()> {
    debug!("Creating database schema");
    let conn = pool.get()?;
    conn.execute_batch(SCHEMA)?;
    if !foreign_keys_enabled(&conn)? {
        warn!("Foreign keys are off, author and label references will not be checked");
    }
    info!("Schema ready");
    Ok(())
}

/// Insert a user and return its id.
pub fn insert_user(pool: &ConnectionPool, name: &str) -> Result<i64> {
    let conn = pool.get()?;
    conn.execute("INSERT INTO users (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    debug!(id, name, "insert_user: inserted");
    Ok(id)
}

/// Insert a label and return its id. Fails with a constraint error if the
/// name is already taken.
pub fn insert_label(pool: &ConnectionPool, name: &str) -> Result<i64> {
    let conn = pool.get()?;
    conn.execute("INSERT INTO labels (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    debug!(id, name, "insert_label: inserted");
    Ok(id)
}

/// All label names, sorted.
pub fn label_names(pool: &ConnectionPool) -> Result<Vec<String>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT name FROM labels ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}
