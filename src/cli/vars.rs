//! mpdx-filter vars command implementation

use crate::cli::{dropped_notices, json_lines, resolve_account_list_id};
use crate::config::Config;
use crate::controller::{ControllerOptions, TaskListController};
use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::output::{emit, OutputOptions, Report};

pub struct VarsOptions {
    pub path: String,
    pub account_list_id: Option<String>,
    pub first: Option<u32>,
    pub config: Config,
    pub output: OutputOptions,
}

pub fn run(options: VarsOptions) -> Result<()> {
    let account_list_id = resolve_account_list_id(options.account_list_id, &options.config)
        .ok_or_else(|| {
            Error::InvalidArgument(
                "account list id required: pass --account-list-id or set account_list_id"
                    .to_string(),
            )
        })?;

    let mut controller_options = ControllerOptions::from(&options.config.tasks);
    if let Some(first) = options.first {
        if first == 0 {
            return Err(Error::InvalidArgument("--first must be at least 1".to_string()));
        }
        controller_options.rows_per_page = first;
    }

    let controller =
        TaskListController::with_options(account_list_id, &options.path, controller_options);
    let variables = controller.query_variables();

    let mut report = Report::new("mpdx-filter vars: query variables");
    for line in json_lines(&serde_json::to_value(&variables)?) {
        report.line(line);
    }
    for notice in dropped_notices::<TaskFilter>(&options.path) {
        report.notice(notice);
    }

    emit(options.output, "vars", &variables, &report)
}
