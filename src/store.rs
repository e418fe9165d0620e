//! In-memory task store implementing the task list query.
//!
//! Serves the same contract as the remote API so the controller can be
//! driven offline: filter semantics, total count and cursor pagination.

use std::path::Path;

use chrono::{DateTime, NaiveDate};

use crate::controller::QueryVariables;
use crate::error::{Error, Result};
use crate::filter::{DateRange, TaskQueryFilter};
use crate::task::{read_tasks, TaskRecord};
use crate::view::{PageInfo, TaskConnection, TaskFetcher};

const CURSOR_PREFIX: &str = "cursor:";

pub struct TaskStore {
    tasks: Vec<TaskRecord>,
}

impl TaskStore {
    pub fn new(tasks: Vec<TaskRecord>) -> Self {
        Self { tasks }
    }

    /// Load tasks from a JSONL file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_tasks(path)?))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Every task the filter selects, in store order. Cursors are ignored.
    pub fn matching<'a>(&'a self, filter: &TaskQueryFilter) -> Vec<&'a TaskRecord> {
        self.tasks
            .iter()
            .filter(|task| task_matches(task, filter))
            .collect()
    }

    pub fn query(&self, variables: &QueryVariables) -> Result<TaskConnection> {
        let matched = self.matching(&variables.filter);
        let total = matched.len();
        let first = variables.first as usize;

        let (start, end) = match (&variables.filter.after, &variables.filter.before) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidArgument(
                    "before and after cannot both be set".to_string(),
                ))
            }
            (Some(after), None) => {
                let start = parse_cursor(after)?.saturating_add(1).min(total);
                (start, start.saturating_add(first).min(total))
            }
            (None, Some(before)) => {
                let end = parse_cursor(before)?.min(total);
                (end.saturating_sub(first), end)
            }
            (None, None) => (0, first.min(total)),
        };

        let nodes: Vec<TaskRecord> = matched[start..end].iter().map(|task| (*task).clone()).collect();
        let page_info = PageInfo {
            start_cursor: (start < end).then(|| encode_cursor(start)),
            end_cursor: (start < end).then(|| encode_cursor(end - 1)),
            has_next_page: end < total,
            has_previous_page: start > 0,
        };

        Ok(TaskConnection {
            nodes,
            total_count: total,
            page_info,
        })
    }
}

impl TaskFetcher for TaskStore {
    fn fetch(&mut self, variables: &QueryVariables) -> Result<TaskConnection> {
        self.query(variables)
    }
}

fn encode_cursor(position: usize) -> String {
    format!("{CURSOR_PREFIX}{position}")
}

fn parse_cursor(cursor: &str) -> Result<usize> {
    cursor
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| Error::InvalidArgument(format!("invalid cursor '{cursor}'")))
}

/// AND across fields, OR within each list field. Pass-through keys are
/// not understood by the store and are ignored.
pub fn task_matches(task: &TaskRecord, filter: &TaskQueryFilter) -> bool {
    if !filter.user_ids.is_empty()
        && !task
            .user_id
            .as_ref()
            .is_some_and(|id| filter.user_ids.contains(id))
    {
        return false;
    }

    if !filter.tags.is_empty() && !filter.tags.iter().any(|tag| task.tag_list.contains(tag)) {
        return false;
    }

    if !filter.contact_ids.is_empty()
        && !filter
            .contact_ids
            .iter()
            .any(|id| task.contact_ids.contains(id))
    {
        return false;
    }

    if !filter.activity_type.is_empty()
        && !task
            .activity_type
            .as_ref()
            .is_some_and(|kind| filter.activity_type.contains(kind))
    {
        return false;
    }

    if let Some(completed) = filter.completed {
        if task.completed != completed {
            return false;
        }
    }

    if let Some(search) = filter.wildcard_search.as_deref() {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty() && !task.subject.to_lowercase().contains(&needle) {
            return false;
        }
    }

    if let Some(range) = &filter.start_at {
        if !range_contains(range, task.due_date()) {
            return false;
        }
    }

    true
}

/// Inclusive on both ends. A task without a due date, or a bound that is
/// not a date, never matches a constrained range.
fn range_contains(range: &DateRange, due: Option<NaiveDate>) -> bool {
    if range.is_empty() {
        return true;
    }
    let Some(due) = due else {
        return false;
    };
    let within_min = match range.min.as_deref() {
        Some(raw) => parse_bound(raw).is_some_and(|min| due >= min),
        None => true,
    };
    let within_max = match range.max.as_deref() {
        Some(raw) => parse_bound(raw).is_some_and(|max| due <= max),
        None => true,
    };
    within_min && within_max
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_bound(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|at| at.date_naive())
        })
}
