//! Helpers shared by the unit tests.
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use serde_json::Value;

use crate::ir::{
    Message,
    MessageTree,
};

/// Builds a locale-keyed tree from a JSON literal.
pub(crate) fn tree(value: Value) -> MessageTree {
    serde_json::from_value(value).unwrap()
}

/// Builds one message from a JSON literal.
pub(crate) fn msg(value: Value) -> Message {
    Message::from(value)
}
