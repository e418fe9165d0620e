//! URL query string <-> typed filter conversion.
//!
//! Decoding is lossy by design: only the keys in the caller's [`AllowList`]
//! survive, and malformed input degrades to an empty filter instead of
//! failing. The codec itself is generic; each view supplies its own
//! allow-list and target type.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::query::{KeyPath, RawQuery, RawValue};

/// Fields kept when decoding a task-list URL.
pub const TASK_FIELDS: &[&str] = &[
    "userIds",
    "tags",
    "contactIds",
    "activityType",
    "completed",
    "wildcardSearch",
    "startAt",
];

/// Fields kept when decoding a donations-report URL.
pub const DONATION_FIELDS: &[&str] = &[
    "designationAccountIds",
    "donorAccountIds",
    "contactIds",
    "donationDate",
];

/// The set of top-level fields a view cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    fields: BTreeSet<String>,
}

impl AllowList {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tasks() -> Self {
        Self::new(TASK_FIELDS.iter().copied())
    }

    pub fn donations() -> Self {
        Self::new(DONATION_FIELDS.iter().copied())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Drop every entry whose key is not allow-listed.
    pub fn project(&self, mut object: Map<String, Value>) -> Map<String, Value> {
        object.retain(|key, _| self.contains(key));
        object
    }
}

/// A filter type bound to the allow-list of the view it serves.
pub trait ViewFilter: Serialize + DeserializeOwned + Default {
    fn allow_list() -> AllowList;

    /// Decode a path for this view. See [`decode`].
    fn from_path(path: &str) -> Option<Self> {
        decode(path, &Self::allow_list())
    }

    /// Encode this filter as a query string (no leading `?`).
    fn to_query_string(&self) -> String {
        encode(self, &Self::allow_list())
    }

    /// Build a shareable link: `route` plus the encoded query, if any.
    fn to_path(&self, route: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            route.to_string()
        } else {
            format!("{route}?{query}")
        }
    }
}

/// How a top-level field is decoded when it is not a nested `name[sub]` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRule {
    /// `true` iff the last occurrence is exactly `"true"`.
    Flag,
    /// The last occurrence, as a string.
    Text,
    /// The raw value coerced to a list of strings.
    List,
}

const KEY_RULES: &[(&str, KeyRule)] = &[
    ("completed", KeyRule::Flag),
    ("wildcardSearch", KeyRule::Text),
];

fn rule_for(field: &str) -> KeyRule {
    KEY_RULES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, rule)| *rule)
        .unwrap_or(KeyRule::List)
}

fn decode_value(rule: KeyRule, raw: &RawValue) -> Value {
    match rule {
        KeyRule::Flag => Value::Bool(raw.last() == "true"),
        KeyRule::Text => Value::String(raw.last().to_string()),
        KeyRule::List => Value::Array(raw.to_list().into_iter().map(Value::String).collect()),
    }
}

/// Apply the per-key rules to a parsed query, before any projection.
///
/// Later keys overwrite earlier ones that target the same field.
pub fn decode_object(query: &RawQuery) -> Map<String, Value> {
    let mut object = Map::new();
    for (key, raw) in query.iter() {
        match KeyPath::parse(key) {
            KeyPath::Nested(field, sub) => {
                let entry = object
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(nested) = entry {
                    nested.insert(sub.to_string(), Value::String(raw.last().to_string()));
                }
            }
            path => {
                let field = path.field();
                object.insert(field.to_string(), decode_value(rule_for(field), raw));
            }
        }
    }
    object
}

/// Why a decoded key did not make it into the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The view's allow-list does not name the field.
    NotAllowed,
    /// The value could not be shaped into the field's type.
    Malformed(String),
}

/// A top-level field that [`decode_with_report`] discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub field: String,
    pub reason: DropReason,
}

/// A decoded filter plus the fields that were thrown away on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub filter: T,
    pub dropped: Vec<DroppedField>,
}

/// Decode the query part of `path` into a filter restricted to `allow`.
///
/// Returns `None` when the path carries no query string. Callers should
/// treat `None` and an empty filter the same way.
pub fn decode<T>(path: &str, allow: &AllowList) -> Option<T>
where
    T: DeserializeOwned + Default,
{
    decode_with_report(path, allow).map(|decoded| decoded.filter)
}

/// [`decode`], also reporting every field that was dropped.
pub fn decode_with_report<T>(path: &str, allow: &AllowList) -> Option<Decoded<T>>
where
    T: DeserializeOwned + Default,
{
    let query = RawQuery::from_path(path)?;
    let object = decode_object(&query);

    let mut dropped: Vec<DroppedField> = object
        .keys()
        .filter(|field| !allow.contains(field))
        .map(|field| DroppedField {
            field: field.clone(),
            reason: DropReason::NotAllowed,
        })
        .collect();
    if !dropped.is_empty() {
        tracing::debug!(count = dropped.len(), "ignoring keys outside the allow-list");
    }

    let (filter, malformed) = shape(allow.project(object));
    dropped.extend(malformed);
    Some(Decoded { filter, dropped })
}

/// [`decode`], with "no filter" collapsed into the default filter.
pub fn decode_or_default<T>(path: &str, allow: &AllowList) -> T
where
    T: DeserializeOwned + Default,
{
    decode(path, allow).unwrap_or_default()
}

/// Deserialize a projected object, dropping fields that do not fit `T`.
fn shape<T>(object: Map<String, Value>) -> (T, Vec<DroppedField>)
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value(Value::Object(object.clone())) {
        Ok(filter) => return (filter, Vec::new()),
        Err(err) => tracing::debug!(error = %err, "filter did not deserialize as a whole"),
    }

    let mut kept = Map::new();
    let mut dropped = Vec::new();
    for (key, value) in object {
        let mut single = Map::new();
        single.insert(key.clone(), value.clone());
        match serde_json::from_value::<T>(Value::Object(single)) {
            Ok(_) => {
                kept.insert(key, value);
            }
            Err(err) => {
                tracing::warn!(field = %key, error = %err, "dropping malformed filter field");
                dropped.push(DroppedField {
                    field: key,
                    reason: DropReason::Malformed(err.to_string()),
                });
            }
        }
    }

    let filter = serde_json::from_value(Value::Object(kept)).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "falling back to empty filter");
        T::default()
    });
    (filter, dropped)
}

/// Encode the allow-listed fields of `filter` as a query string.
///
/// Lists become repeated `name[]=v` pairs, nested objects `name[sub]=v`.
/// Unset (null) fields and empty lists are skipped.
pub fn encode<T: Serialize>(filter: &T, allow: &AllowList) -> String {
    let object = match serde_json::to_value(filter) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return String::new(),
        Err(err) => {
            tracing::warn!(error = %err, "filter could not be serialized");
            return String::new();
        }
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &object {
        if !allow.contains(key) {
            continue;
        }
        match value {
            Value::Array(items) => {
                let list_key = format!("{key}[]");
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        serializer.append_pair(&list_key, &text);
                    }
                }
            }
            Value::Object(nested) => {
                for (sub, item) in nested {
                    if let Some(text) = scalar_text(item) {
                        serializer.append_pair(&format!("{key}[{sub}]"), &text);
                    }
                }
            }
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    serializer.append_pair(key, &text);
                }
            }
        }
    }
    serializer.finish()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
