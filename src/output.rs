//! Rendering shared by the CLI commands.
//!
//! A command builds one [`Report`] for people and hands a serializable
//! payload alongside it for `--json`. Notices (URL keys the codec dropped,
//! filters that came out empty) are structured so scripts can act on them.

use std::fmt;

use serde::Serialize;

use crate::codec::{DropReason, DroppedField};
use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "mpdx-filter.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A query key outside the view's allow-list.
    IgnoredKey,
    /// An allow-listed key whose value had the wrong shape.
    MalformedField,
    /// Nothing in the input constrains the result.
    EmptyFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    pub fn dropped(dropped: &DroppedField) -> Self {
        let (kind, message) = match &dropped.reason {
            DropReason::NotAllowed => (
                NoticeKind::IgnoredKey,
                "not a filter for this view".to_string(),
            ),
            DropReason::Malformed(err) => (NoticeKind::MalformedField, format!("dropped: {err}")),
        };
        Self {
            kind,
            field: Some(dropped.field.clone()),
            message,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Human-readable result of one command.
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    facts: Vec<(String, String)>,
    lines: Vec<String>,
    notices: Vec<Notice>,
    hint: Option<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// An aligned `key  value` line under the title.
    pub fn fact(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.facts.push((key.into(), value.into()));
        self
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn notice(&mut self, notice: Notice) -> &mut Self {
        self.notices.push(notice);
        self
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn hint(&mut self, hint: impl Into<String>) -> &mut Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Print a successful result: the JSON envelope, or the rendered report.
///
/// `--quiet` keeps notices (on stderr) and drops everything else.
pub fn emit<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: &Report,
) -> Result<()> {
    if options.json {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            notices: Vec<Notice>,
            #[serde(skip_serializing_if = "Option::is_none")]
            hint: Option<&'a str>,
        }

        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            notices: report.notices.clone(),
            hint: report.hint.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if options.quiet {
        for notice in &report.notices {
            eprintln!("warning: {notice}");
        }
    } else {
        println!("{}", render(report));
    }
    Ok(())
}

pub fn render(report: &Report) -> String {
    let mut out = report.title.clone();
    let width = report
        .facts
        .iter()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or(0);

    for (key, value) in &report.facts {
        out.push_str(&format!("\n  {key:<width$}  {value}"));
    }
    for line in &report.lines {
        out.push_str("\n  ");
        out.push_str(line);
    }
    for notice in &report.notices {
        out.push_str(&format!("\nwarning: {notice}"));
    }
    if let Some(hint) = &report.hint {
        out.push_str(&format!("\nhint: {hint}"));
    }
    out
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hint = error_hint(err);
    if !json {
        eprintln!("error: {err}");
        if let Some(hint) = hint {
            eprintln!("hint: {hint}");
        }
        return Ok(());
    }

    #[derive(Serialize)]
    struct Failure<'a> {
        message: String,
        code: i32,
        kind: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    }

    #[derive(Serialize)]
    struct Envelope<'a> {
        schema_version: &'static str,
        command: &'a str,
        status: &'static str,
        error: Failure<'a>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    }

    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        error: Failure {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        },
        hint,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// First positional argument, skipping flags and the `--config` value.
pub fn infer_command_name_from_args() -> String {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            args.next();
        } else if !arg.starts_with('-') {
            return arg;
        }
    }
    "mpdx-filter".to_string()
}

fn error_kind(err: &Error) -> &'static str {
    if err.exit_code() == exit_codes::USER_ERROR {
        "user_error"
    } else {
        "operation_failed"
    }
}

fn error_hint(err: &Error) -> Option<String> {
    match err {
        Error::InvalidConfig(_) | Error::TomlParse(_) => Some(format!(
            "fix {} then retry",
            crate::config::CONFIG_FILE_NAME
        )),
        Error::ConfigNotFound(path) => Some(format!(
            "create {} or drop --config",
            path.to_string_lossy()
        )),
        Error::Fetch(message) if message.contains("cursor") => {
            Some("cursors come from pageInfo of a previous list".to_string())
        }
        _ => None,
    }
}
