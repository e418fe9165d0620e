//! mpdx-filter encode command implementation

use crate::cli::View;
use crate::codec::ViewFilter;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::{DonationFilter, TaskFilter};
use crate::output::{emit, Notice, NoticeKind, OutputOptions, Report};

const DONATIONS_ROUTE: &str = "/reports/donations";

pub struct EncodeOptions {
    pub filter: String,
    pub view: View,
    pub route: Option<String>,
    pub config: Config,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct EncodeReport {
    query: String,
    path: String,
}

pub fn run(options: EncodeOptions) -> Result<()> {
    let route = match (options.route, options.view) {
        (Some(route), _) => route,
        (None, View::Tasks) => options.config.tasks.route.clone(),
        (None, View::Donations) => DONATIONS_ROUTE.to_string(),
    };
    if !route.starts_with('/') {
        return Err(Error::InvalidArgument(format!(
            "route '{route}' must start with '/'"
        )));
    }

    let (query, path) = match options.view {
        View::Tasks => {
            let filter: TaskFilter = serde_json::from_str(&options.filter)?;
            (filter.to_query_string(), filter.to_path(&route))
        }
        View::Donations => {
            let filter: DonationFilter = serde_json::from_str(&options.filter)?;
            (filter.to_query_string(), filter.to_path(&route))
        }
    };

    let mut report = Report::new(path.clone());
    if query.is_empty() {
        report.notice(Notice::new(
            NoticeKind::EmptyFilter,
            format!("no {} filter fields set", options.view.name()),
        ));
    }

    let data = EncodeReport { query, path };
    emit(options.output, "encode", &data, &report)
}
