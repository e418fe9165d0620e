//! Raw query-string parsing.
//!
//! Splits a path into its query part and groups the decoded pairs by key,
//! keeping first-occurrence order. `+` and percent escapes are handled by
//! `url::form_urlencoded`. Repeated keys collect into a list, which is how
//! `tags[]=a&tags[]=b` becomes two values under `tags[]`.

use url::form_urlencoded;

/// A decoded value for one query key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    One(String),
    Many(Vec<String>),
}

impl RawValue {
    fn push(&mut self, value: String) {
        match self {
            RawValue::One(first) => {
                let first = std::mem::take(first);
                *self = RawValue::Many(vec![first, value]);
            }
            RawValue::Many(values) => values.push(value),
        }
    }

    /// The last occurrence, for keys that hold a single value.
    pub fn last(&self) -> &str {
        match self {
            RawValue::One(value) => value,
            RawValue::Many(values) => values.last().map(String::as_str).unwrap_or_default(),
        }
    }

    /// The value coerced to a list. A scalar becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            RawValue::One(value) => vec![value.clone()],
            RawValue::Many(values) => values.clone(),
        }
    }
}

/// Shape of a raw query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPath<'a> {
    /// `name`
    Plain(&'a str),
    /// `name[]`
    List(&'a str),
    /// `name[sub]`
    Nested(&'a str, &'a str),
}

impl<'a> KeyPath<'a> {
    pub fn parse(key: &'a str) -> Self {
        if let Some(name) = key.strip_suffix("[]") {
            return KeyPath::List(name);
        }
        if let Some(inner) = key.strip_suffix(']') {
            if let Some((name, sub)) = inner.split_once('[') {
                if !name.is_empty() && !sub.is_empty() && !sub.contains(['[', ']']) {
                    return KeyPath::Nested(name, sub);
                }
            }
        }
        KeyPath::Plain(key)
    }

    /// The top-level field name this key writes to.
    pub fn field(&self) -> &'a str {
        match self {
            KeyPath::Plain(name) | KeyPath::List(name) | KeyPath::Nested(name, _) => name,
        }
    }
}

/// Ordered key/value pairs of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    pairs: Vec<(String, RawValue)>,
}

impl RawQuery {
    /// Parse a bare query string (no leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut parsed = RawQuery::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            parsed.insert(key.into_owned(), value.into_owned());
        }
        parsed
    }

    /// Parse the query part of a path such as `/tasks?completed=true`.
    ///
    /// Returns `None` when the path has no `?` or nothing after it.
    pub fn from_path(path: &str) -> Option<Self> {
        split_query(path).map(Self::parse)
    }

    fn insert(&mut self, key: String, value: String) {
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, raw)) => raw.push(value),
            None => self.pairs.push((key, RawValue::One(value))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Return the query part of a path, without any `#fragment`.
pub fn split_query(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once('?')?;
    let query = rest.split_once('#').map(|(query, _)| query).unwrap_or(rest);
    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}
