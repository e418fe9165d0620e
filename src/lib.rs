//! mpdx-filter - task list filter state for the MPDX donor dashboard
//!
//! Converts task-list URLs into typed filters and back, and owns the live
//! filter and pagination state of a task list view.
//!
//! # Core Concepts
//!
//! - **Filter codec**: lossy URL query string <-> filter mapping, restricted
//!   to a per-view allow-list
//! - **Resolved filter**: the decoded filter merged over defaults, spread
//!   1:1 into query variables
//! - **Controller**: reconciles column filters, debounced search and cursor
//!   paging into one canonical state
//!
//! # Module Organization
//!
//! - `query`: raw query-string parsing
//! - `codec`: typed decode/encode and allow-lists
//! - `filter`: task and donation filter shapes
//! - `controller`: task list controller and query variables
//! - `view`: controller plus injected task fetcher
//! - `store`: in-memory task fetcher over JSONL rows
//! - `task`: task rows
//! - `config`: configuration loading from `.mpdx-filter.toml`
//! - `cli`: command-line interface using clap
//! - `output`: human and JSON output
//! - `error`: error types and result aliases

pub mod cli;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod output;
pub mod query;
pub mod store;
pub mod task;
pub mod view;

pub use codec::{
    decode, decode_or_default, decode_with_report, encode, AllowList, Decoded, DropReason,
    DroppedField, ViewFilter,
};
pub use controller::{Column, ColumnValue, QueryVariables, TaskListController};
pub use error::{Error, Result};
pub use filter::{DateRange, DonationFilter, TaskFilter, TaskQueryFilter};
