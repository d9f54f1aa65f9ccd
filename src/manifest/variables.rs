//! Ordered manifest variables and variable tokens
//!
//! A converted location may end in `@VARIFY_<name>` instead of a concrete
//! revision. The token says "the revision lives in variable `<name>`"; the
//! variable's value carries its own leading `@`, so expanding the token
//! replaces `@VARIFY_<name>` with the value.

use crate::constants::VARIFY_MARKER_PREFIX;

/// Ordered `name → value` map. Insertion order is kept for output; setting an
/// existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSet {
    entries: Vec<(String, String)>,
}

impl VariableSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// True when `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name`, keeping its position when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no variable is defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces a trailing `@VARIFY_<name>` token in `location` with the
    /// value of `<name>`. Locations without a token (or with an unknown
    /// variable) are returned unchanged.
    pub fn expand(&self, location: &str) -> String {
        match split_token(location) {
            Some((base, name)) => match self.get(name) {
                Some(value) => format!("{base}{value}"),
                None => location.to_string(),
            },
            None => location.to_string(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

/// The `VARIFY_<name>` token standing for variable `name`.
pub fn variable_token(name: &str) -> String {
    format!("{VARIFY_MARKER_PREFIX}{name}")
}

/// Splits `url@VARIFY_name` into `("url", "name")`.
pub fn split_token(location: &str) -> Option<(&str, &str)> {
    let marker = format!("@{VARIFY_MARKER_PREFIX}");
    let index = location.rfind(&marker)?;
    let name = &location[index + marker.len()..];
    if name.is_empty() {
        return None;
    }
    Some((&location[..index], name))
}

/// Normalizes a pin value so it starts with exactly one `@`.
pub fn normalize_pin(value: &str) -> String {
    format!("@{}", value.trim_start_matches('@'))
}
