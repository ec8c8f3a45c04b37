//! Structural diff between two messages, expressed as explicit patch ops.
//!
//! A [`Patch`] is computed once with [`diff`] and applied with
//! [`apply_patch`], which returns a fresh value instead of mutating shared
//! state. Keys whose values did not change keep their position, new keys are
//! appended in the order of the new value.

use super::message::{
    Message,
    PathSegment,
    format_path,
};

/// A single change.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// A key or array element that did not exist before.
    Add { path: Vec<PathSegment>, value: Message },
    /// A value that changed (including a change of kind, e.g. text → node).
    Replace { path: Vec<PathSegment>, from: Message, to: Message },
    /// A key or array element that no longer exists.
    Remove { path: Vec<PathSegment>, value: Message },
}

impl PatchOp {
    /// Where the change applies.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        match self {
            Self::Add { path, .. } | Self::Replace { path, .. } | Self::Remove { path, .. } => {
                path
            }
        }
    }

    /// One-line human readable description, e.g. `+ greeting.hello: "Hello"`.
    #[must_use]
    pub fn describe(&self, separator: &str) -> String {
        let path = format_path(self.path(), separator);
        let path = if path.is_empty() { "(root)".to_string() } else { path };
        match self {
            Self::Add { value, .. } => format!("+ {path}: {}", render(value)),
            Self::Replace { from, to, .. } => {
                format!("~ {path}: {} -> {}", render(from), render(to))
            }
            Self::Remove { value, .. } => format!("- {path}: {}", render(value)),
        }
    }
}

/// Compact JSON for descriptions.
fn render(message: &Message) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| "<unprintable>".to_string())
}

/// Ordered list of changes turning one message into another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    /// Changes in application order.
    ops: Vec<PatchOp>,
}

impl Patch {
    /// Patch made of `ops`.
    #[must_use]
    pub const fn new(ops: Vec<PatchOp>) -> Self {
        Self { ops }
    }

    /// The changes, in order.
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Whether there is nothing to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Computes the patch that turns `old` into `new`.
#[must_use]
pub fn diff(old: &Message, new: &Message) -> Patch {
    let mut ops = Vec::new();
    diff_into(old, new, &mut Vec::new(), &mut ops);
    Patch { ops }
}

/// Appends the changes below `path` to `ops`.
fn diff_into(old: &Message, new: &Message, path: &mut Vec<PathSegment>, ops: &mut Vec<PatchOp>) {
    match (old, new) {
        (Message::Node(old_map), Message::Node(new_map)) => {
            for (key, old_value) in old_map {
                path.push(PathSegment::Key(key.clone()));
                match new_map.get(key) {
                    Some(new_value) => diff_into(old_value, new_value, path, ops),
                    None => ops.push(PatchOp::Remove { path: path.clone(), value: old_value.clone() }),
                }
                path.pop();
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    path.push(PathSegment::Key(key.clone()));
                    ops.push(PatchOp::Add { path: path.clone(), value: new_value.clone() });
                    path.pop();
                }
            }
        }
        (Message::List(old_items), Message::List(new_items)) => {
            for (index, (old_item, new_item)) in old_items.iter().zip(new_items).enumerate() {
                path.push(PathSegment::Index(index));
                diff_into(old_item, new_item, path, ops);
                path.pop();
            }
            for (index, new_item) in new_items.iter().enumerate().skip(old_items.len()) {
                path.push(PathSegment::Index(index));
                ops.push(PatchOp::Add { path: path.clone(), value: new_item.clone() });
                path.pop();
            }
            // tail removals run back to front so earlier indices stay valid
            for (index, old_item) in old_items.iter().enumerate().skip(new_items.len()).rev() {
                path.push(PathSegment::Index(index));
                ops.push(PatchOp::Remove { path: path.clone(), value: old_item.clone() });
                path.pop();
            }
        }
        _ if old == new => {}
        _ => ops.push(PatchOp::Replace { path: path.clone(), from: old.clone(), to: new.clone() }),
    }
}

/// Applies `patch` to a copy of `old` and returns the result.
#[must_use]
pub fn apply_patch(old: &Message, patch: &Patch) -> Message {
    let mut result = old.clone();
    for op in &patch.ops {
        match op {
            PatchOp::Add { path, value } => result.set_path(path, value.clone()),
            PatchOp::Replace { path, to, .. } => result.set_path(path, to.clone()),
            PatchOp::Remove { path, .. } => {
                if !result.remove_path(path) {
                    tracing::debug!(path = ?path, "Patch target already absent");
                }
            }
        }
    }
    result
}
