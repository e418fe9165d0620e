//! Task rows as returned by the task list query.
//!
//! Rows are read from JSONL files (one task per line) by the local task
//! store; the remote API returns the same camelCase shape.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub tag_list: Vec<String>,
    /// Assignee id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub contact_ids: Vec<String>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            completed: false,
            completed_at: None,
            start_at: None,
            activity_type: None,
            tag_list: Vec::new(),
            user_id: None,
            contact_ids: Vec::new(),
        }
    }

    /// Calendar day the task is due, if it has a due date.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.start_at.map(|at| at.date_naive())
    }
}

/// Read task rows from a JSONL file. Blank lines are skipped.
pub fn read_tasks(path: &Path) -> Result<Vec<TaskRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut tasks = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let task: TaskRecord = serde_json::from_str(&line)?;
        tasks.push(task);
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}
