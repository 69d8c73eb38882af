//! Core types for spark-vdom.
//!
//! These types are shared by virtual nodes, the reconciler, and the hosts.
//! They describe what a node *is* (key, attributes, style) without saying
//! anything about how a host renders it.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

// =============================================================================
// Key
// =============================================================================

/// Sibling identity used by list reconciliation.
///
/// Keys are only ever compared within one parent's child list. Two nodes in
/// different lists may share a key without any effect on each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Numeric key (row ids, indices into a model).
    Index(u64),
    /// Named key.
    Name(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Index(value)
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Index(value as u64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::Index(value as u64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Name(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Name(Rc::from(value))
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// Value of an element attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attributes and style entries of an element node.
///
/// Both maps are ordered so hosts see attributes in a stable order on creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    pub attrs: BTreeMap<String, PropValue>,
    pub style: BTreeMap<String, String>,
}

/// One step needed to turn an old property map into a new one.
#[derive(Debug, Clone, PartialEq)]
pub enum PropChange<'a, V> {
    Set(&'a str, &'a V),
    Remove(&'a str),
}

/// Compute the changes that turn `old` into `new`.
///
/// Sets come first (in key order), then removals. Entries with equal values
/// produce nothing.
pub fn diff_map<'a, V: PartialEq>(
    old: &'a BTreeMap<String, V>,
    new: &'a BTreeMap<String, V>,
) -> Vec<PropChange<'a, V>> {
    let mut changes = Vec::new();

    for (name, value) in new {
        if old.get(name) != Some(value) {
            changes.push(PropChange::Set(name.as_str(), value));
        }
    }

    for name in old.keys() {
        if !new.contains_key(name) {
            changes.push(PropChange::Remove(name.as_str()));
        }
    }

    changes
}

// =============================================================================
// Dimension
// =============================================================================

/// Size value used by style properties such as `width` or `padding`.
///
/// Parsed from style strings: `"auto"`, `"12"` (terminal cells) or `"50%"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Size from content.
    #[default]
    Auto,
    /// Absolute size in terminal cells.
    Cells(u16),
    /// Percentage of parent size (0-100).
    Percent(f32),
}

/// Error returned when a style string is not a valid [`Dimension`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid dimension {0:?}")]
pub struct ParseDimensionError(pub String);

impl FromStr for Dimension {
    type Err = ParseDimensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if let Some(pct) = s.strip_suffix('%') {
            return pct
                .trim()
                .parse::<f32>()
                .map(Self::Percent)
                .map_err(|_| ParseDimensionError(s.to_string()));
        }
        s.parse::<u16>()
            .map(Self::Cells)
            .map_err(|_| ParseDimensionError(s.to_string()))
    }
}

impl From<u16> for Dimension {
    fn from(value: u16) -> Self {
        Self::Cells(value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality() {
        assert_eq!(Key::from("a"), Key::from(String::from("a")));
        assert_eq!(Key::from(3u64), Key::from(3usize));
        assert_ne!(Key::from("3"), Key::from(3u64));
    }

    #[test]
    fn test_diff_map() {
        let mut old = BTreeMap::new();
        old.insert("id".to_string(), PropValue::from("a"));
        old.insert("title".to_string(), PropValue::from("x"));
        old.insert("hidden".to_string(), PropValue::from(true));

        let mut new = BTreeMap::new();
        new.insert("id".to_string(), PropValue::from("a"));
        new.insert("title".to_string(), PropValue::from("y"));
        new.insert("role".to_string(), PropValue::from("list"));

        let changes = diff_map(&old, &new);
        assert_eq!(
            changes,
            vec![
                PropChange::Set("role", &PropValue::from("list")),
                PropChange::Set("title", &PropValue::from("y")),
                PropChange::Remove("hidden"),
            ]
        );
    }

    #[test]
    fn test_diff_map_equal_is_empty() {
        let mut map = BTreeMap::new();
        map.insert("width".to_string(), "10".to_string());
        assert!(diff_map(&map, &map.clone()).is_empty());
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!("auto".parse::<Dimension>(), Ok(Dimension::Auto));
        assert_eq!("12".parse::<Dimension>(), Ok(Dimension::Cells(12)));
        assert_eq!("50%".parse::<Dimension>(), Ok(Dimension::Percent(50.0)));
        assert!("wide".parse::<Dimension>().is_err());
    }
}
