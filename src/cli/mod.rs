//! Command-line interface for mpdx-filter
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::codec::{decode_with_report, AllowList, ViewFilter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::{DonationFilter, TaskFilter};
use crate::output::{Notice, OutputOptions};

mod decode;
mod encode;
mod list;
mod vars;

/// mpdx-filter - Task-list filter codec and controller
///
/// Decodes task-list URLs into typed filters, encodes filters back into
/// shareable links, and drives the paginated task list controller.
#[derive(Parser, Debug)]
#[command(name = "mpdx-filter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to .mpdx-filter.toml in the current directory)
    #[arg(long, global = true, env = "MPDX_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which page's allow-list to decode and encode with
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Tasks,
    Donations,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Tasks => "tasks",
            View::Donations => "donations",
        }
    }

    pub fn allow_list(self) -> AllowList {
        match self {
            View::Tasks => TaskFilter::allow_list(),
            View::Donations => DonationFilter::allow_list(),
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a URL path into a filter
    Decode {
        /// Path with query string, e.g. "/tasks?completed=true&tags[]=a"
        path: String,

        /// View whose allow-list applies
        #[arg(long, value_enum, default_value = "tasks")]
        view: View,
    },

    /// Encode a JSON filter into a shareable path
    Encode {
        /// Filter as JSON, e.g. '{"tags":["a"],"completed":true}'
        filter: String,

        /// View whose allow-list applies
        #[arg(long, value_enum, default_value = "tasks")]
        view: View,

        /// Route to prefix (defaults to the configured task route)
        #[arg(long)]
        route: Option<String>,
    },

    /// Show the query variables the task list would send
    Vars {
        /// Path with query string
        path: String,

        /// Account list to query
        #[arg(long, env = "MPDX_ACCOUNT_LIST_ID")]
        account_list_id: Option<String>,

        /// Page size (defaults to the configured rows per page)
        #[arg(long)]
        first: Option<u32>,
    },

    /// Run the task list against a local JSONL task file
    List {
        /// Path with query string
        path: String,

        /// JSONL file with one task per line
        #[arg(long)]
        tasks: PathBuf,

        /// Account list to query
        #[arg(long, env = "MPDX_ACCOUNT_LIST_ID")]
        account_list_id: Option<String>,

        /// Page size (defaults to the configured rows per page)
        #[arg(long)]
        first: Option<u32>,

        /// Return the page after this cursor
        #[arg(long, conflicts_with = "before")]
        after: Option<String>,

        /// Return the page before this cursor
        #[arg(long)]
        before: Option<String>,

        /// Search text applied to the subject
        #[arg(long)]
        search: Option<String>,

        /// Column filter: NAME=V1,V2 or startAt=MIN..MAX
        #[arg(long = "column", value_name = "NAME=VALUES")]
        columns: Vec<String>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let config = load_config(self.config.as_deref())?;

        match self.command {
            Commands::Decode { path, view } => decode::run(decode::DecodeOptions {
                path,
                view,
                output,
            }),
            Commands::Encode {
                filter,
                view,
                route,
            } => encode::run(encode::EncodeOptions {
                filter,
                view,
                route,
                config,
                output,
            }),
            Commands::Vars {
                path,
                account_list_id,
                first,
            } => vars::run(vars::VarsOptions {
                path,
                account_list_id,
                first,
                config,
                output,
            }),
            Commands::List {
                path,
                tasks,
                account_list_id,
                first,
                after,
                before,
                search,
                columns,
            } => list::run(list::ListOptions {
                path,
                tasks,
                account_list_id,
                first,
                after,
                before,
                search,
                columns,
                config,
                output,
            }),
        }
    }
}

/// Load the explicit config file, or the one in the current directory.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            Config::load(path)
        }
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Ok(Config::load_from_dir(&cwd))
        }
    }
}

/// Flag value first, then config, then nothing.
fn resolve_account_list_id(flag: Option<String>, config: &Config) -> Option<String> {
    flag.filter(|id| !id.trim().is_empty())
        .or_else(|| config.account_list_id.clone())
}

/// One notice per key of `path` that `T`'s view drops.
fn dropped_notices<T: ViewFilter>(path: &str) -> Vec<Notice> {
    decode_with_report::<T>(path, &T::allow_list())
        .map(|decoded| decoded.dropped.iter().map(Notice::dropped).collect())
        .unwrap_or_default()
}

/// One `key: value` line per top-level JSON field.
fn json_lines(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Object(object) => object
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect(),
        other => vec![other.to_string()],
    }
}
