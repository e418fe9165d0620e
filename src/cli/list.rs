//! mpdx-filter list command implementation
//!
//! Drives the task list controller against a local JSONL task file and
//! prints one page.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::cli::{dropped_notices, resolve_account_list_id};
use crate::config::Config;
use crate::controller::{
    Column, ColumnValue, ControllerOptions, QueryVariables, TaskListController,
};
use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::output::{emit, OutputOptions, Report};
use crate::store::TaskStore;
use crate::task::TaskRecord;
use crate::view::{PageInfo, TaskListView};

const LOCAL_ACCOUNT_LIST_ID: &str = "local";

pub struct ListOptions {
    pub path: String,
    pub tasks: PathBuf,
    pub account_list_id: Option<String>,
    pub first: Option<u32>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub search: Option<String>,
    pub columns: Vec<String>,
    pub config: Config,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ListReport {
    variables: QueryVariables,
    share_path: String,
    total_count: usize,
    page_info: PageInfo,
    rows: Vec<TaskRecord>,
}

pub fn run(options: ListOptions) -> Result<()> {
    let columns = options
        .columns
        .iter()
        .map(|raw| parse_column(raw))
        .collect::<Result<Vec<_>>>()?;

    let account_list_id = resolve_account_list_id(options.account_list_id, &options.config)
        .unwrap_or_else(|| LOCAL_ACCOUNT_LIST_ID.to_string());

    let mut controller_options = ControllerOptions::from(&options.config.tasks);
    if let Some(first) = options.first {
        if first == 0 {
            return Err(Error::InvalidArgument("--first must be at least 1".to_string()));
        }
        controller_options.rows_per_page = first;
    }

    let mut controller =
        TaskListController::with_options(account_list_id, &options.path, controller_options);
    for (column, value) in columns {
        controller.set_column_filter(column, value);
    }
    if let Some(search) = options.search {
        controller.set_search_text(search, std::time::Instant::now());
        controller.flush_search();
    }
    if let Some(after) = options.after {
        controller.go_to_next_page(after);
    } else if let Some(before) = options.before {
        controller.go_to_previous_page(before);
    }

    let store = TaskStore::load(&options.tasks)?;
    let mut view = TaskListView::new(controller, store);
    view.refresh();

    let state = view.state();
    if let Some(message) = &state.error {
        return Err(Error::Fetch(message.clone()));
    }

    let share_path = view.controller().share_path(&options.config.tasks.route);
    let mut report = Report::new(format!(
        "mpdx-filter list: {} of {} tasks",
        state.rows.len(),
        state.total_count
    ));
    report
        .fact("link", share_path.clone())
        .fact(
            "page",
            (view.controller().state().current_page_index + 1).to_string(),
        );
    for task in &state.rows {
        let mark = if task.completed { "x" } else { " " };
        report.line(format!("[{mark}] {} {}", task.id, task.subject));
    }
    for notice in dropped_notices::<TaskFilter>(&options.path) {
        report.notice(notice);
    }
    if state.page_info.has_next_page {
        if let Some(cursor) = &state.page_info.end_cursor {
            report.hint(format!("next page: --after {cursor}"));
        }
    }

    let data = ListReport {
        variables: view.controller().query_variables(),
        share_path,
        total_count: state.total_count,
        page_info: state.page_info.clone(),
        rows: state.rows.clone(),
    };
    emit(options.output, "list", &data, &report)
}

/// Parse `NAME=V1,V2`, or `startAt=MIN..MAX` with either side optional.
fn parse_column(raw: &str) -> Result<(Column, ColumnValue)> {
    let (name, values) = raw.split_once('=').ok_or_else(|| {
        Error::InvalidArgument(format!("column filter '{raw}' must look like NAME=VALUES"))
    })?;
    let column = Column::parse(name.trim());
    let value = match column {
        Column::StartAt => {
            let (min, max) = values.split_once("..").unwrap_or((values, ""));
            ColumnValue::DateRange(parse_date(min)?, parse_date(max)?)
        }
        _ => ColumnValue::values(
            values
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty()),
        ),
    };
    Ok((column, value))
}

fn parse_date(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|err| Error::InvalidArgument(format!("invalid date '{raw}': {err}")))
}
