//! Task list controller.
//!
//! Owns the live filter, the pagination cursors and the page size, and turns
//! UI events (column filter changes, search text, page navigation) into a
//! new filter value. Every update replaces the filter; a filter handed out
//! earlier is never mutated.
//!
//! Invariants:
//! - `before` and `after` are never both set.
//! - any filter or search change returns to the first page.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::codec::{decode, ViewFilter};
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::filter::{DateRange, TaskFilter, TaskQueryFilter};

pub const DEFAULT_ROWS_PER_PAGE: u32 = 100;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Variables handed to the task list query.
///
/// The filter is spread next to the pagination parameters, so filter field
/// names are query variable names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryVariables {
    pub account_list_id: String,
    pub first: u32,
    #[serde(flatten)]
    pub filter: TaskQueryFilter,
}

/// A table column, in the table's own vocabulary.
///
/// Columns named after a filter field (`tags`, `completed`, ...) resolve to
/// the same variant as their table name, so they always land on the typed
/// field rather than in the pass-through keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    CompletedAt,
    User,
    TagList,
    Contacts,
    StartAt,
    ActivityType,
    WildcardSearch,
    /// Cursor and query parameters; a column can never set these.
    Reserved(String),
    /// Any other column; its name is used verbatim as the filter key.
    Other(String),
}

/// Query variables owned by the controller's pagination state.
const RESERVED_KEYS: &[&str] = &["before", "after", "first", "accountListId"];

impl Column {
    pub fn parse(name: &str) -> Self {
        match name {
            "completedAt" | "completed" => Column::CompletedAt,
            "user" | "userIds" => Column::User,
            "tagList" | "tags" => Column::TagList,
            "contacts" | "contactIds" => Column::Contacts,
            "startAt" => Column::StartAt,
            "activityType" => Column::ActivityType,
            "wildcardSearch" => Column::WildcardSearch,
            reserved if RESERVED_KEYS.contains(&reserved) => {
                Column::Reserved(reserved.to_string())
            }
            other => Column::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Column::CompletedAt => "completedAt",
            Column::User => "user",
            Column::TagList => "tagList",
            Column::Contacts => "contacts",
            Column::StartAt => "startAt",
            Column::ActivityType => "activityType",
            Column::WildcardSearch => "wildcardSearch",
            Column::Reserved(name) | Column::Other(name) => name,
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::parse(name)
    }
}

/// The value a table column reports when its filter changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Selected values of a list-style filter.
    Values(Vec<String>),
    /// `[min, max]` of a date-range filter; either slot may be empty.
    DateRange(Option<NaiveDate>, Option<NaiveDate>),
    /// Anything else, passed through untouched.
    Raw(Value),
}

impl ColumnValue {
    pub fn values(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ColumnValue::Values(values.into_iter().map(Into::into).collect())
    }

    fn into_list(self) -> Vec<String> {
        match self {
            ColumnValue::Values(values) => values,
            ColumnValue::DateRange(min, max) => [min, max]
                .into_iter()
                .flatten()
                .map(|date| format_date(&date))
                .collect(),
            ColumnValue::Raw(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            ColumnValue::Raw(Value::Null) => Vec::new(),
            ColumnValue::Raw(Value::String(text)) => vec![text],
            ColumnValue::Raw(other) => vec![other.to_string()],
        }
    }

    fn into_json(self) -> Value {
        match self {
            ColumnValue::Values(values) => {
                Value::Array(values.into_iter().map(Value::String).collect())
            }
            ColumnValue::DateRange(min, max) => Value::Array(
                [min, max]
                    .into_iter()
                    .map(|slot| slot.map_or(Value::Null, |date| Value::String(format_date(&date))))
                    .collect(),
            ),
            ColumnValue::Raw(value) => value,
        }
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Page size and debounce window for a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub rows_per_page: u32,
    pub search_debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl From<&TasksConfig> for ControllerOptions {
    fn from(config: &TasksConfig) -> Self {
        Self {
            rows_per_page: config.rows_per_page,
            search_debounce: Duration::from_millis(config.search_debounce_ms),
        }
    }
}

/// Snapshot of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListState {
    pub filter: TaskQueryFilter,
    pub rows_per_page: u32,
    /// Tracks paging direction only; never sent to the query.
    pub current_page_index: usize,
}

#[derive(Debug, Clone)]
struct PendingSearch {
    text: String,
    deadline: Instant,
}

pub struct TaskListController {
    account_list_id: String,
    state: TaskListState,
    search_debounce: Duration,
    pending_search: Option<PendingSearch>,
}

impl TaskListController {
    /// Create a controller for `initial_path` with default options.
    pub fn new(account_list_id: impl Into<String>, initial_path: &str) -> Self {
        Self::with_options(account_list_id, initial_path, ControllerOptions::default())
    }

    pub fn with_options(
        account_list_id: impl Into<String>,
        initial_path: &str,
        options: ControllerOptions,
    ) -> Self {
        let decoded: Option<TaskFilter> = decode(initial_path, &TaskFilter::allow_list());
        let filter = TaskQueryFilter::from(decoded.unwrap_or_default());
        let account_list_id = account_list_id.into();
        tracing::debug!(
            account_list_id = %account_list_id,
            path = initial_path,
            "task list controller created"
        );

        Self {
            account_list_id,
            state: TaskListState {
                filter,
                rows_per_page: options.rows_per_page.max(1),
                current_page_index: 0,
            },
            search_debounce: options.search_debounce,
            pending_search: None,
        }
    }

    pub fn account_list_id(&self) -> &str {
        &self.account_list_id
    }

    pub fn state(&self) -> &TaskListState {
        &self.state
    }

    pub fn filter(&self) -> &TaskQueryFilter {
        &self.state.filter
    }

    pub fn query_variables(&self) -> QueryVariables {
        QueryVariables {
            account_list_id: self.account_list_id.clone(),
            first: self.state.rows_per_page,
            filter: self.state.filter.clone(),
        }
    }

    /// Replace the filter with an edited copy and return to the first page.
    fn update_filter(&mut self, edit: impl FnOnce(&mut TaskQueryFilter)) {
        let mut next = self.state.filter.clone();
        edit(&mut next);
        next.clear_cursors();
        self.state.filter = next;
        self.state.current_page_index = 0;
    }

    /// Queue a search text change. It takes effect once `poll` sees no newer
    /// text for the debounce window.
    ///
    /// Cursors and the page index are untouched while the text is pending;
    /// they are cleared when the text is applied by `poll` or `flush_search`.
    pub fn set_search_text(&mut self, text: impl Into<String>, now: Instant) {
        self.pending_search = Some(PendingSearch {
            text: text.into(),
            deadline: now + self.search_debounce,
        });
    }

    pub fn has_pending_search(&self) -> bool {
        self.pending_search.is_some()
    }

    /// Apply the pending search text if its quiet period is over.
    ///
    /// Returns `true` when the filter changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match &self.pending_search {
            Some(pending) if now >= pending.deadline => self.flush_search(),
            _ => false,
        }
    }

    /// Apply the pending search text immediately.
    pub fn flush_search(&mut self) -> bool {
        let Some(pending) = self.pending_search.take() else {
            return false;
        };
        let text = if pending.text.is_empty() {
            None
        } else {
            Some(pending.text)
        };
        tracing::debug!(search = ?text, "applying search text");
        self.update_filter(|filter| filter.wildcard_search = text);
        true
    }

    /// Translate a column filter change into the matching filter field.
    pub fn set_column_filter(&mut self, column: impl Into<Column>, value: ColumnValue) {
        let column = column.into();
        tracing::debug!(column = column.name(), ?value, "column filter changed");

        match column {
            Column::CompletedAt => {
                let selected = value.into_list();
                let completed = match selected.as_slice() {
                    [single] => Some(single == "true"),
                    _ => None,
                };
                self.update_filter(|filter| filter.completed = completed);
            }
            Column::User => {
                let ids = value.into_list();
                self.update_filter(|filter| filter.user_ids = ids);
            }
            Column::TagList => {
                let tags = value.into_list();
                self.update_filter(|filter| filter.tags = tags);
            }
            Column::Contacts => {
                let ids = value.into_list();
                self.update_filter(|filter| filter.contact_ids = ids);
            }
            Column::ActivityType => {
                let types = value.into_list();
                self.update_filter(|filter| filter.activity_type = types);
            }
            Column::WildcardSearch => {
                let text = value.into_list().pop().filter(|text| !text.is_empty());
                self.pending_search = None;
                self.update_filter(|filter| filter.wildcard_search = text);
            }
            Column::StartAt => {
                let range = match value {
                    ColumnValue::DateRange(min, max) => DateRange::new(
                        min.as_ref().map(format_date),
                        max.as_ref().map(format_date),
                    ),
                    other => {
                        let mut bounds = other.into_list().into_iter();
                        DateRange::new(bounds.next(), bounds.next())
                    }
                };
                let start_at = if range.is_empty() { None } else { Some(range) };
                self.update_filter(|filter| filter.start_at = start_at);
            }
            Column::Reserved(name) => {
                tracing::warn!(column = %name, "ignoring column that targets a pagination variable");
                self.update_filter(|_| {});
            }
            Column::Other(name) => {
                let raw = value.into_json();
                self.update_filter(|filter| {
                    filter.extra.insert(name, raw);
                });
            }
        }
    }

    pub fn go_to_next_page(&mut self, end_cursor: impl Into<String>) {
        let mut next = self.state.filter.clone();
        next.after = Some(end_cursor.into());
        next.before = None;
        self.state.filter = next;
        self.state.current_page_index += 1;
    }

    pub fn go_to_previous_page(&mut self, start_cursor: impl Into<String>) {
        let mut next = self.state.filter.clone();
        next.before = Some(start_cursor.into());
        next.after = None;
        self.state.filter = next;
        self.state.current_page_index = self.state.current_page_index.saturating_sub(1);
    }

    /// Change the page size. Returns to the first page, since the current
    /// cursors were computed for the old size.
    pub fn set_rows_per_page(&mut self, rows_per_page: u32) -> Result<()> {
        if rows_per_page == 0 {
            return Err(Error::InvalidArgument(
                "rows per page must be at least 1".to_string(),
            ));
        }
        self.state.rows_per_page = rows_per_page;
        self.update_filter(|_| {});
        Ok(())
    }

    /// Drop every constraint and any pending search.
    pub fn reset_filters(&mut self) {
        self.pending_search = None;
        self.update_filter(|filter| *filter = TaskQueryFilter::default());
    }

    /// Shareable link for the current filter. Cursors are not included.
    pub fn share_path(&self, route: &str) -> String {
        TaskFilter::from(&self.state.filter).to_path(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("date")
    }

    fn paged(controller: &mut TaskListController) {
        controller.go_to_next_page("cursor:99");
        assert_eq!(controller.filter().after.as_deref(), Some("cursor:99"));
    }

    #[test]
    fn column_parse_roundtrips_names() {
        for name in [
            "completedAt",
            "user",
            "tagList",
            "contacts",
            "startAt",
            "activityType",
            "wildcardSearch",
            "after",
            "foo",
        ] {
            assert_eq!(Column::parse(name).name(), name);
        }
        assert_eq!(Column::parse("foo"), Column::Other("foo".to_string()));
    }

    #[test]
    fn filter_field_names_resolve_to_typed_columns() {
        assert_eq!(Column::parse("completed"), Column::CompletedAt);
        assert_eq!(Column::parse("userIds"), Column::User);
        assert_eq!(Column::parse("tags"), Column::TagList);
        assert_eq!(Column::parse("contactIds"), Column::Contacts);
        for name in ["before", "after", "first", "accountListId"] {
            assert_eq!(Column::parse(name), Column::Reserved(name.to_string()));
        }
    }

    #[test]
    fn field_named_columns_set_typed_fields() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        paged(&mut controller);
        controller.set_column_filter("completed", ColumnValue::values(["true"]));
        controller.set_column_filter("tags", ColumnValue::values(["urgent"]));
        controller.set_column_filter("activityType", ColumnValue::values(["PARTNER_PRAYER"]));
        controller.set_column_filter("wildcardSearch", ColumnValue::Raw(json!("call")));

        let filter = controller.filter();
        assert_eq!(filter.completed, Some(true));
        assert_eq!(filter.tags, vec!["urgent".to_string()]);
        assert_eq!(filter.activity_type, vec!["PARTNER_PRAYER".to_string()]);
        assert_eq!(filter.wildcard_search.as_deref(), Some("call"));
        assert!(filter.extra.is_empty());
        assert!(filter.after.is_none());
    }

    #[test]
    fn reserved_columns_are_ignored_but_return_to_first_page() {
        for name in ["before", "after", "first", "accountListId"] {
            let mut controller = TaskListController::new("acct-1", "/tasks");
            paged(&mut controller);
            controller.set_column_filter(name, ColumnValue::values(["cursor:7"]));

            let variables = controller.query_variables();
            assert_eq!(variables.account_list_id, "acct-1", "column {name}");
            assert_eq!(variables.first, DEFAULT_ROWS_PER_PAGE);
            assert!(variables.filter.after.is_none());
            assert!(variables.filter.before.is_none());
            assert!(variables.filter.extra.is_empty());
            assert_eq!(controller.state().current_page_index, 0);
        }
    }

    #[test]
    fn new_controller_merges_defaults() {
        let controller = TaskListController::new("acct-1", "/tasks");
        let filter = controller.filter();
        assert!(filter.user_ids.is_empty());
        assert!(filter.completed.is_none());
        assert_eq!(controller.state().rows_per_page, DEFAULT_ROWS_PER_PAGE);
        assert_eq!(controller.state().current_page_index, 0);
    }

    #[test]
    fn completed_column_maps_single_selection() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        controller.set_column_filter("completedAt", ColumnValue::values(["true"]));
        assert_eq!(controller.filter().completed, Some(true));

        controller.set_column_filter("completedAt", ColumnValue::values(["false"]));
        assert_eq!(controller.filter().completed, Some(false));

        controller.set_column_filter("completedAt", ColumnValue::values(Vec::<String>::new()));
        assert_eq!(controller.filter().completed, None);

        controller.set_column_filter("completedAt", ColumnValue::values(["true", "false"]));
        assert_eq!(controller.filter().completed, None);
    }

    #[test]
    fn start_at_column_sets_only_present_bounds() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        controller.set_column_filter(
            "startAt",
            ColumnValue::DateRange(None, Some(date("2020-10-19"))),
        );
        assert_eq!(
            controller.filter().start_at,
            Some(DateRange::new(None, Some("2020-10-19".to_string())))
        );

        controller.set_column_filter("startAt", ColumnValue::DateRange(None, None));
        assert_eq!(controller.filter().start_at, None);
    }

    #[test]
    fn other_column_passes_value_through() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        controller.set_column_filter("foo", ColumnValue::Raw(json!({ "x": 1 })));
        assert_eq!(controller.filter().extra.get("foo"), Some(&json!({ "x": 1 })));
    }

    #[test]
    fn filter_changes_reset_cursors_and_page() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        paged(&mut controller);
        controller.set_column_filter("tagList", ColumnValue::values(["a"]));
        assert!(controller.filter().after.is_none());
        assert!(controller.filter().before.is_none());
        assert_eq!(controller.state().current_page_index, 0);
    }

    #[test]
    fn search_is_debounced_to_last_value() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        let start = Instant::now();
        controller.set_search_text("c", start);
        controller.set_search_text("ca", start + Duration::from_millis(300));
        controller.set_search_text("call", start + Duration::from_millis(600));

        assert!(!controller.poll(start + Duration::from_millis(1500)));
        assert!(controller.filter().wildcard_search.is_none());

        assert!(controller.poll(start + Duration::from_millis(1600)));
        assert_eq!(controller.filter().wildcard_search.as_deref(), Some("call"));
        assert!(!controller.has_pending_search());
    }

    #[test]
    fn search_application_resets_cursors() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        paged(&mut controller);
        controller.set_search_text("x", Instant::now());
        assert!(controller.flush_search());
        assert!(controller.filter().after.is_none());
        assert_eq!(controller.state().current_page_index, 0);
    }

    #[test]
    fn pending_search_keeps_page_until_applied() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        paged(&mut controller);
        let start = Instant::now();
        controller.set_search_text("call", start);
        assert_eq!(controller.filter().after.as_deref(), Some("cursor:99"));
        assert_eq!(controller.state().current_page_index, 1);

        assert!(controller.poll(start + DEFAULT_SEARCH_DEBOUNCE));
        assert!(controller.filter().after.is_none());
        assert_eq!(controller.state().current_page_index, 0);
    }

    #[test]
    fn empty_search_clears_field() {
        let mut controller = TaskListController::new("acct-1", "/tasks?wildcardSearch=old");
        controller.set_search_text("", Instant::now());
        controller.flush_search();
        assert!(controller.filter().wildcard_search.is_none());
    }

    #[test]
    fn paging_keeps_direction_exclusive() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        controller.go_to_next_page("end-1");
        controller.go_to_next_page("end-2");
        assert_eq!(controller.state().current_page_index, 2);

        controller.go_to_previous_page("start-2");
        assert_eq!(controller.filter().before.as_deref(), Some("start-2"));
        assert!(controller.filter().after.is_none());
        assert_eq!(controller.state().current_page_index, 1);

        controller.go_to_previous_page("start-1");
        controller.go_to_previous_page("start-0");
        assert_eq!(controller.state().current_page_index, 0);
    }

    #[test]
    fn rows_per_page_resets_to_first_page() {
        let mut controller = TaskListController::new("acct-1", "/tasks");
        paged(&mut controller);
        controller.set_rows_per_page(25).expect("rows");
        assert_eq!(controller.query_variables().first, 25);
        assert!(controller.filter().after.is_none());

        let err = controller.set_rows_per_page(0).expect_err("zero rows");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn reset_filters_drops_pending_search() {
        let mut controller = TaskListController::new("acct-1", "/tasks?tags[]=a");
        controller.set_search_text("x", Instant::now());
        controller.reset_filters();
        assert_eq!(controller.filter(), &TaskQueryFilter::default());
        assert!(!controller.has_pending_search());
    }

    #[test]
    fn share_path_omits_cursors() {
        let mut controller = TaskListController::new("acct-1", "/tasks?completed=true");
        paged(&mut controller);
        assert_eq!(controller.share_path("/tasks"), "/tasks?completed=true");
    }
}
