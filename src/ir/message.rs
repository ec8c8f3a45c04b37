//! Locale message values and the canonical locale-keyed tree.

use std::fmt;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::{
    Number,
    Value,
};

use crate::types::Locale;

/// Ordered mapping of message keys, insertion order preserved.
pub type MessageMap = IndexMap<String, Message>;

/// Canonical, file-system independent tree: locale → message subtree.
pub type MessageTree = IndexMap<Locale, Message>;

/// One locale's translation subtree.
///
/// Strings are the usual leaves; other scalars are kept so that block
/// content survives a parse/serialize round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// JSON `null`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar, kept in its original representation.
    Number(Number),
    /// A translatable string.
    Text(String),
    /// Ordered list.
    List(Vec<Message>),
    /// Keyed node; key order is preserved.
    Node(MessageMap),
}

/// One step of a path into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Key of a node.
    Key(String),
    /// Position in a list.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Renders a path as `a.b[0].c` using the given key separator.
#[must_use]
pub fn format_path(path: &[PathSegment], separator: &str) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push_str(separator);
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{index}]"));
            }
        }
    }
    out
}

impl Default for Message {
    fn default() -> Self {
        Self::Node(MessageMap::new())
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Node(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<MessageMap> for Message {
    fn from(map: MessageMap) -> Self {
        Self::Node(map)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Message {
    /// A node with no keys.
    #[must_use]
    pub fn empty_node() -> Self {
        Self::Node(MessageMap::new())
    }

    /// The keys of a node; `None` for any other variant.
    #[must_use]
    pub const fn as_node(&self) -> Option<&MessageMap> {
        match self {
            Self::Node(map) => Some(map),
            _ => None,
        }
    }

    /// Whether this is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// A value that a translator still has to fill in.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Follows `path` from this value.
    #[must_use]
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&Self> {
        path.iter().try_fold(self, |current, segment| match (current, segment) {
            (Self::Node(map), PathSegment::Key(key)) => map.get(key),
            (Self::List(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        })
    }

    /// Sets the value at `path`, creating intermediate nodes as needed.
    ///
    /// A non-container value found on the way is replaced by a node (or list).
    pub fn set_path(&mut self, path: &[PathSegment], value: Self) {
        let Some((first, rest)) = path.split_first() else {
            *self = value;
            return;
        };

        match first {
            PathSegment::Key(key) => {
                if !matches!(self, Self::Node(_)) {
                    *self = Self::empty_node();
                }
                if let Self::Node(map) = self {
                    let child = map.entry(key.clone()).or_insert(Self::Null);
                    child.set_path(rest, value);
                }
            }
            PathSegment::Index(index) => {
                if !matches!(self, Self::List(_)) {
                    *self = Self::List(Vec::new());
                }
                if let Self::List(items) = self {
                    while items.len() <= *index {
                        items.push(Self::Null);
                    }
                    if let Some(child) = items.get_mut(*index) {
                        child.set_path(rest, value);
                    }
                }
            }
        }
    }

    /// Removes the value at `path`. Returns `true` when something was removed.
    pub fn remove_path(&mut self, path: &[PathSegment]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };

        let mut current = self;
        for segment in parents {
            let next = match (current, segment) {
                (Self::Node(map), PathSegment::Key(key)) => map.get_mut(key),
                (Self::List(items), PathSegment::Index(index)) => items.get_mut(*index),
                _ => None,
            };
            let Some(next) = next else {
                return false;
            };
            current = next;
        }

        match (current, last) {
            (Self::Node(map), PathSegment::Key(key)) => map.shift_remove(key).is_some(),
            (Self::List(items), PathSegment::Index(index)) if *index < items.len() => {
                items.remove(*index);
                true
            }
            _ => false,
        }
    }

    /// Wraps this value in successive single-key nodes, innermost segment first.
    ///
    /// `["components", "Modal"]` turns `v` into `{components: {Modal: v}}`.
    #[must_use]
    pub fn nest_under(self, hierarchy: &[String]) -> Self {
        hierarchy.iter().rev().fold(self, |inner, key| {
            let mut map = MessageMap::new();
            map.insert(key.clone(), inner);
            Self::Node(map)
        })
    }

    /// Collects every leaf (non-container value, empty containers included)
    /// with its path.
    #[must_use]
    pub fn leaves(&self) -> Vec<(Vec<PathSegment>, &Self)> {
        let mut result = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut result);
        result
    }
}

/// Structural deep merge: node keys are unioned, any other collision is won
/// by `source`.
pub fn deep_merge(target: &mut Message, source: Message) {
    match (target, source) {
        (Message::Node(target_map), Message::Node(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Deep merges `source` into `target` locale by locale.
pub fn merge_trees(target: &mut MessageTree, source: MessageTree) {
    for (locale, message) in source {
        match target.get_mut(&locale) {
            Some(existing) => deep_merge(existing, message),
            None => {
                target.insert(locale, message);
            }
        }
    }
}

/// Flattens nested messages into a separator-joined key map.
///
/// Array elements are addressed as `key[index]`.
#[must_use]
pub fn flatten<'a>(message: &'a Message, separator: &str) -> IndexMap<String, &'a Message> {
    message.leaves().into_iter().map(|(path, value)| (format_path(&path, separator), value)).collect()
}

/// Expands separator-joined keys back into nested nodes.
///
/// `{"a.b": "x", "a.c": "y"}` becomes `{"a": {"b": "x", "c": "y"}}`; a later
/// key wins over an earlier leaf on the same path.
#[must_use]
pub fn unflatten(message: &Message, separator: &str) -> Message {
    let Message::Node(map) = message else {
        return message.clone();
    };
    let mut result = Message::empty_node();
    for (key, value) in map {
        let path: Vec<PathSegment> = key.split(separator).map(|part| PathSegment::Key(part.to_string())).collect();
        let value = unflatten(value, separator);
        match result.get_path(&path) {
            Some(existing @ Message::Node(_)) if matches!(value, Message::Node(_)) => {
                let mut merged = existing.clone();
                deep_merge(&mut merged, value);
                result.set_path(&path, merged);
            }
            _ => result.set_path(&path, value),
        }
    }
    result
}

/// Pushes every leaf under `path`, depth first.
fn collect_leaves<'a>(
    message: &'a Message,
    path: &mut Vec<PathSegment>,
    result: &mut Vec<(Vec<PathSegment>, &'a Message)>,
) {
    match message {
        Message::Node(map) if !map.is_empty() => {
            for (key, value) in map {
                path.push(PathSegment::Key(key.clone()));
                collect_leaves(value, path, result);
                path.pop();
            }
        }
        Message::List(items) if !items.is_empty() => {
            for (index, value) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                collect_leaves(value, path, result);
                path.pop();
            }
        }
        _ => {
            if !path.is_empty() {
                result.push((path.clone(), message));
            }
        }
    }
}
