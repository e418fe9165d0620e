//! Typed filter shapes.
//!
//! [`TaskFilter`] is the sparse, URL-facing shape: absent fields mean "no
//! constraint". [`TaskQueryFilter`] is the same filter merged over explicit
//! defaults so every field has a defined value for the query layer.
//!
//! All list constraints use OR semantics within a field and AND semantics
//! across fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::{AllowList, ViewFilter};

/// Inclusive range of ISO dates. Either bound may be open.
///
/// `min <= max` is not enforced; an inverted range is valid and simply
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

impl DateRange {
    pub fn new(min: Option<String>, max: Option<String>) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Which tasks are currently selected, as carried by a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    /// Assignee ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_ids: Option<Vec<String>>,
    /// Task type codes, e.g. `PARTNER_FINANCIAL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<Vec<String>>,
    /// `Some(true)` only completed, `Some(false)` only incomplete, `None` both
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Free-text substring match on the subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard_search: Option<String>,
    /// Due-date range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Pass-through keys set by columns without a dedicated field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.user_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_contact_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.contact_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_activity_types(
        mut self,
        types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.activity_type = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.wildcard_search = Some(text.into());
        self
    }

    pub fn with_start_at(mut self, min: Option<&str>, max: Option<&str>) -> Self {
        self.start_at = Some(DateRange::new(
            min.map(str::to_string),
            max.map(str::to_string),
        ));
        self
    }

    /// True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ViewFilter for TaskFilter {
    fn allow_list() -> AllowList {
        AllowList::tasks()
    }
}

/// A [`TaskFilter`] merged over explicit per-field defaults.
///
/// Lists are always present (possibly empty). `completed`, `startAt` and the
/// cursors serialize as `null` when unset; `wildcardSearch` is omitted.
/// The field names match the query variables one to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskQueryFilter {
    pub user_ids: Vec<String>,
    pub tags: Vec<String>,
    pub contact_ids: Vec<String>,
    pub activity_type: Vec<String>,
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wildcard_search: Option<String>,
    pub start_at: Option<DateRange>,
    pub before: Option<String>,
    pub after: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskQueryFilter {
    /// Drop both cursors, returning to the first page.
    pub fn clear_cursors(&mut self) {
        self.before = None;
        self.after = None;
    }
}

impl From<TaskFilter> for TaskQueryFilter {
    fn from(filter: TaskFilter) -> Self {
        Self {
            user_ids: filter.user_ids.unwrap_or_default(),
            tags: filter.tags.unwrap_or_default(),
            contact_ids: filter.contact_ids.unwrap_or_default(),
            activity_type: filter.activity_type.unwrap_or_default(),
            completed: filter.completed,
            wildcard_search: filter.wildcard_search,
            start_at: filter.start_at,
            before: filter.before,
            after: filter.after,
            extra: filter.extra,
        }
    }
}

impl From<&TaskQueryFilter> for TaskFilter {
    fn from(filter: &TaskQueryFilter) -> Self {
        fn non_empty(values: &[String]) -> Option<Vec<String>> {
            if values.is_empty() {
                None
            } else {
                Some(values.to_vec())
            }
        }

        Self {
            user_ids: non_empty(&filter.user_ids),
            tags: non_empty(&filter.tags),
            contact_ids: non_empty(&filter.contact_ids),
            activity_type: non_empty(&filter.activity_type),
            completed: filter.completed,
            wildcard_search: filter.wildcard_search.clone(),
            start_at: filter.start_at.clone().filter(|range| !range.is_empty()),
            before: filter.before.clone(),
            after: filter.after.clone(),
            extra: filter.extra.clone(),
        }
    }
}

/// Filter for the donations-report view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation_account_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_account_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation_date: Option<DateRange>,
}

impl ViewFilter for DonationFilter {
    fn allow_list() -> AllowList {
        AllowList::donations()
    }
}
