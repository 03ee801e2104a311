// Data models for taskdb

use serde::{Deserialize, Serialize};

/// A tracked unit of work.
///
/// `id` and `opened` are assigned by [`crate::TaskStore::create`]; whatever the
/// caller puts there beforehand is ignored. `labels` is only filled in on the
/// read paths and is persisted through the `tasks_labels` join table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// Seconds since the Unix epoch
    pub opened: i64,
    /// `None` while the task is open
    pub closed: Option<i64>,
    pub author_id: i64,
    pub assigned_id: Option<i64>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Task {
    /// Build a task ready to be passed to `create`.
    pub fn new(author_id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id,
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_open(&self) -> bool {
        self.closed.is_none()
    }
}

/// Current time in seconds since the Unix epoch
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
