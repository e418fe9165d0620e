//! Task list view: a controller paired with the data-fetch collaborator.
//!
//! The fetcher is injected. Its errors are kept as opaque text for the UI
//! layer to show; they are not retried or classified here.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::controller::{Column, ColumnValue, QueryVariables, TaskListController};
use crate::error::Result;
use crate::task::TaskRecord;

/// Cursor information for the page that was returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// One page of tasks plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConnection {
    pub nodes: Vec<TaskRecord>,
    pub total_count: usize,
    pub page_info: PageInfo,
}

/// Runs the task list query for a set of variables.
pub trait TaskFetcher {
    fn fetch(&mut self, variables: &QueryVariables) -> Result<TaskConnection>;
}

impl<F> TaskFetcher for F
where
    F: FnMut(&QueryVariables) -> Result<TaskConnection>,
{
    fn fetch(&mut self, variables: &QueryVariables) -> Result<TaskConnection> {
        self(variables)
    }
}

/// What the table renders: rows plus loading and error flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchState {
    pub rows: Vec<TaskRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub total_count: usize,
    pub page_info: PageInfo,
}

pub struct TaskListView<F> {
    controller: TaskListController,
    fetcher: F,
    state: FetchState,
}

impl<F: TaskFetcher> TaskListView<F> {
    pub fn new(controller: TaskListController, fetcher: F) -> Self {
        Self {
            controller,
            fetcher,
            state: FetchState::default(),
        }
    }

    pub fn controller(&self) -> &TaskListController {
        &self.controller
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Run the query for the current variables and store the outcome.
    pub fn refresh(&mut self) {
        let variables = self.begin_refresh();
        let outcome = self.fetcher.fetch(&variables);
        self.complete_refresh(outcome);
    }

    /// Mark a fetch as in flight and return the variables to fetch with.
    ///
    /// Rows from the previous page stay visible until
    /// [`complete_refresh`](Self::complete_refresh) is called. Callers that
    /// run the fetch themselves (on another thread, or after a UI frame)
    /// pair the two; `refresh` does both in one step.
    pub fn begin_refresh(&mut self) -> QueryVariables {
        self.state.loading = true;
        self.state.error = None;
        self.controller.query_variables()
    }

    /// Store the outcome of a fetch started with `begin_refresh`.
    pub fn complete_refresh(&mut self, outcome: Result<TaskConnection>) {
        match outcome {
            Ok(connection) => {
                tracing::debug!(
                    rows = connection.nodes.len(),
                    total = connection.total_count,
                    "task page fetched"
                );
                self.state = FetchState {
                    rows: connection.nodes,
                    loading: false,
                    error: None,
                    total_count: connection.total_count,
                    page_info: connection.page_info,
                };
            }
            Err(err) => {
                tracing::warn!(error = %err, "task fetch failed");
                self.state = FetchState {
                    loading: false,
                    error: Some(err.to_string()),
                    ..FetchState::default()
                };
            }
        }
    }

    pub fn set_column_filter(&mut self, column: impl Into<Column>, value: ColumnValue) {
        self.controller.set_column_filter(column, value);
        self.refresh();
    }

    pub fn set_search_text(&mut self, text: impl Into<String>, now: Instant) {
        self.controller.set_search_text(text, now);
    }

    /// Let a debounced search take effect. Returns `true` if it re-fetched.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.controller.poll(now) {
            self.refresh();
            true
        } else {
            false
        }
    }

    /// Move to the next page if the last fetch reported one.
    pub fn next_page(&mut self) -> bool {
        if !self.state.page_info.has_next_page {
            return false;
        }
        let Some(cursor) = self.state.page_info.end_cursor.clone() else {
            return false;
        };
        self.controller.go_to_next_page(cursor);
        self.refresh();
        true
    }

    /// Move to the previous page if the last fetch reported one.
    pub fn previous_page(&mut self) -> bool {
        if !self.state.page_info.has_previous_page {
            return false;
        }
        let Some(cursor) = self.state.page_info.start_cursor.clone() else {
            return false;
        };
        self.controller.go_to_previous_page(cursor);
        self.refresh();
        true
    }

    pub fn set_rows_per_page(&mut self, rows_per_page: u32) -> Result<()> {
        self.controller.set_rows_per_page(rows_per_page)?;
        self.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn fetch_error_is_surfaced_and_rows_cleared() {
        let mut calls = 0;
        let fetcher = move |_: &QueryVariables| -> Result<TaskConnection> {
            calls += 1;
            if calls == 1 {
                Ok(TaskConnection {
                    nodes: vec![TaskRecord::new("t1", "Call")],
                    total_count: 1,
                    page_info: PageInfo::default(),
                })
            } else {
                Err(Error::Fetch("network down".to_string()))
            }
        };
        let controller = TaskListController::new("acct-1", "/tasks");
        let mut view = TaskListView::new(controller, fetcher);

        view.refresh();
        assert_eq!(view.state().rows.len(), 1);
        assert!(view.state().error.is_none());

        view.refresh();
        assert!(view.state().rows.is_empty());
        assert!(!view.state().loading);
        assert_eq!(
            view.state().error.as_deref(),
            Some("Task fetch failed: network down")
        );
    }

    #[test]
    fn next_page_requires_has_next_page() {
        let fetcher = |_: &QueryVariables| -> Result<TaskConnection> { Ok(TaskConnection::default()) };
        let controller = TaskListController::new("acct-1", "/tasks");
        let mut view = TaskListView::new(controller, fetcher);
        view.refresh();
        assert!(!view.next_page());
        assert!(!view.previous_page());
    }

    #[test]
    fn loading_is_visible_between_begin_and_complete() {
        let fetcher = |_: &QueryVariables| -> Result<TaskConnection> {
            Ok(TaskConnection {
                nodes: vec![TaskRecord::new("t1", "Call")],
                total_count: 1,
                page_info: PageInfo::default(),
            })
        };
        let controller = TaskListController::new("acct-1", "/tasks?tags[]=a");
        let mut view = TaskListView::new(controller, fetcher);
        view.refresh();

        let variables = view.begin_refresh();
        assert_eq!(variables.filter.tags, vec!["a".to_string()]);
        assert!(view.state().loading);
        assert_eq!(view.state().rows.len(), 1);

        view.complete_refresh(Ok(TaskConnection::default()));
        assert!(!view.state().loading);
        assert!(view.state().rows.is_empty());
    }
}
