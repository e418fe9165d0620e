//! mpdx-filter decode command implementation

use serde_json::Value;

use crate::cli::{json_lines, View};
use crate::codec::{decode_with_report, Decoded, ViewFilter};
use crate::error::Result;
use crate::filter::{DonationFilter, TaskFilter};
use crate::output::{emit, Notice, NoticeKind, OutputOptions, Report};

pub struct DecodeOptions {
    pub path: String,
    pub view: View,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct DecodeReport {
    view: View,
    /// `null` when the path carries no query string
    filter: Option<Value>,
}

pub fn run(options: DecodeOptions) -> Result<()> {
    let decoded = match options.view {
        View::Tasks => to_json(decode_view::<TaskFilter>(&options.path))?,
        View::Donations => to_json(decode_view::<DonationFilter>(&options.path))?,
    };

    let mut report = Report::new(match &decoded {
        Some(_) => "mpdx-filter decode: filter",
        None => "mpdx-filter decode: no query string",
    });
    report.fact("view", options.view.name());

    let filter = decoded.map(|(filter, notices)| {
        for line in json_lines(&filter) {
            report.line(line);
        }
        for notice in notices {
            report.notice(notice);
        }
        if filter.as_object().is_some_and(|object| object.is_empty()) {
            report.notice(Notice::new(
                NoticeKind::EmptyFilter,
                "no filter keys survived decoding",
            ));
        }
        filter
    });

    let data = DecodeReport {
        view: options.view,
        filter,
    };
    emit(options.output, "decode", &data, &report)
}

fn decode_view<T: ViewFilter>(path: &str) -> Option<Decoded<T>> {
    decode_with_report(path, &T::allow_list())
}

fn to_json<T: ViewFilter>(decoded: Option<Decoded<T>>) -> Result<Option<(Value, Vec<Notice>)>> {
    decoded
        .map(|decoded| {
            let notices = decoded.dropped.iter().map(Notice::dropped).collect();
            Ok((serde_json::to_value(&decoded.filter)?, notices))
        })
        .transpose()
}
