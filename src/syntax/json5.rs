//! Minimal JSON5 writer.
//!
//! Object keys that are plain ASCII identifiers are written unquoted, strings
//! use double quotes, and output is indented like `JSON5.stringify(v, null, n)`.

use crate::ir::Message;

/// Serializes `message` as indented JSON5.
#[must_use]
pub fn to_string(message: &Message, indent: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, message, &" ".repeat(indent), 0);
    out
}

/// Writes `message` at nesting `depth`; `unit` is one indentation level.
fn write_value(out: &mut String, message: &Message, unit: &str, depth: usize) {
    match message {
        Message::Null => out.push_str("null"),
        Message::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Message::Number(n) => out.push_str(&n.to_string()),
        Message::Text(text) => write_string(out, text),
        Message::List(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, unit, depth + 1);
                write_value(out, item, unit, depth + 1);
            }
            newline(out, unit, depth);
            out.push(']');
        }
        Message::Node(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, unit, depth + 1);
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    write_string(out, key);
                }
                out.push(':');
                if !unit.is_empty() {
                    out.push(' ');
                }
                write_value(out, value, unit, depth + 1);
            }
            newline(out, unit, depth);
            out.push('}');
        }
    }
}

/// Line break plus indentation; nothing in compact output.
fn newline(out: &mut String, unit: &str, depth: usize) {
    if unit.is_empty() {
        return;
    }
    out.push('\n');
    for _ in 0..depth {
        out.push_str(unit);
    }
}

/// Whether `key` can be written unquoted.
fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Writes `text` as a double-quoted string literal.
fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if u32::from(c) < 0x20 => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}
