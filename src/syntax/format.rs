//! Parsing and serialization of block content per serialization language.

use jsonc_parser::ParseOptions;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::json5;
use crate::ir::{
    BlockLang,
    Message,
};

/// Formatting applied when block content (or any JSON output) is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Indent width in spaces.
    pub indent: usize,
    /// Terminator appended when the serialized text does not already end with it.
    pub eof: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { indent: 2, eof: "\n".to_string() }
    }
}

/// Errors parsing or serializing block content.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Invalid JSON content.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid JSON5 content.
    #[error("Invalid JSON5: {0}")]
    Json5(String),

    /// Invalid YAML content.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The message cannot be written in the requested language.
    #[error("Failed to serialize content: {0}")]
    Serialize(String),
}

/// Parses block content written in `lang`.
///
/// Whitespace-only content is an empty mapping.
pub fn parse_content(content: &str, lang: BlockLang) -> Result<Message, FormatError> {
    if content.trim().is_empty() {
        return Ok(Message::empty_node());
    }

    let value: Value = match lang {
        BlockLang::Json => serde_json::from_str(content)?,
        BlockLang::Json5 => jsonc_parser::parse_to_serde_value(content, &ParseOptions::default())
            .map_err(|e| FormatError::Json5(e.to_string()))?
            .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        BlockLang::Yaml | BlockLang::Yml => serde_yaml::from_str(content)?,
    };

    Ok(Message::from(value))
}

/// Serializes `message` in `lang`, terminated by `options.eof`.
pub fn stringify_content(
    message: &Message,
    lang: BlockLang,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    let mut text = match lang {
        BlockLang::Json => to_json_pretty(message, options.indent)?,
        BlockLang::Json5 => json5::to_string(message, options.indent),
        // serde_yaml always indents nested mappings by two spaces
        BlockLang::Yaml | BlockLang::Yml => serde_yaml::to_string(message)?,
    };

    if !text.ends_with(&options.eof) {
        text.push_str(&options.eof);
    }

    Ok(text)
}

/// Pretty JSON with a custom indent width.
pub fn to_json_pretty<T: Serialize + ?Sized>(
    value: &T,
    indent: usize,
) -> Result<String, FormatError> {
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| FormatError::Serialize(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    /// Two-space indent, trailing newline.
    fn options() -> FormatOptions {
        FormatOptions::default()
    }

    #[googletest::test]
    fn test_parse_json() {
        let message = parse_content(r#"{"en": {"hello": "Hello"}}"#, BlockLang::Json).unwrap();

        expect_that!(message, eq(&Message::from(json!({"en": {"hello": "Hello"}}))));
    }

    #[googletest::test]
    fn test_parse_json5_loose_syntax() {
        let content = "{\n  // greeting\n  hello: \"Hello\",\n  items: [\"a\", \"b\",],\n}";

        let message = parse_content(content, BlockLang::Json5).unwrap();

        expect_that!(message, eq(&Message::from(json!({"hello": "Hello", "items": ["a", "b"]}))));
    }

    #[rstest]
    #[case::yaml(BlockLang::Yaml)]
    #[case::yml(BlockLang::Yml)]
    fn test_parse_yaml(#[case] lang: BlockLang) {
        let content = "hello: Hello\nnested:\n  ok: OK\nlist:\n  - one\n  - two\n";

        let message = parse_content(content, lang).unwrap();

        assert_eq!(
            message,
            Message::from(json!({"hello": "Hello", "nested": {"ok": "OK"}, "list": ["one", "two"]}))
        );
    }

    #[rstest]
    #[case::json(BlockLang::Json)]
    #[case::json5(BlockLang::Json5)]
    #[case::yaml(BlockLang::Yaml)]
    fn test_parse_blank_is_empty_node(#[case] lang: BlockLang) {
        assert_eq!(parse_content("\n   \n", lang).unwrap(), Message::empty_node());
    }

    #[googletest::test]
    fn test_parse_invalid_json_fails() {
        let result = parse_content("{\"en\": ", BlockLang::Json);

        expect_that!(result.is_err(), eq(true));
    }

    #[googletest::test]
    fn test_stringify_json_indent_and_eof() {
        let message = Message::from(json!({"hello": "Hello"}));

        let text = stringify_content(&message, BlockLang::Json, &options()).unwrap();

        expect_that!(text, eq("{\n  \"hello\": \"Hello\"\n}\n"));
    }

    #[googletest::test]
    fn test_stringify_json_custom_indent() {
        let message = Message::from(json!({"a": {"b": "c"}}));
        let options = FormatOptions { indent: 4, eof: "\n".to_string() };

        let text = stringify_content(&message, BlockLang::Json, &options).unwrap();

        expect_that!(text, eq("{\n    \"a\": {\n        \"b\": \"c\"\n    }\n}\n"));
    }

    #[googletest::test]
    fn test_stringify_yaml() {
        let message = Message::from(json!({"hello": "Hello", "nested": {"ok": "OK"}}));

        let text = stringify_content(&message, BlockLang::Yaml, &options()).unwrap();

        expect_that!(text, eq("hello: Hello\nnested:\n  ok: OK\n"));
    }

    #[rstest]
    #[case::json(BlockLang::Json)]
    #[case::json5(BlockLang::Json5)]
    #[case::yaml(BlockLang::Yaml)]
    #[case::yml(BlockLang::Yml)]
    fn test_stringify_then_parse_is_identity(#[case] lang: BlockLang) {
        let message = Message::from(json!({
            "title": "It's \"quoted\"",
            "count": 3,
            "flag": true,
            "nothing": null,
            "errors": ["first", {"inner": "second"}, ["third"]],
            "empty": {},
            "日本語": "こんにちは"
        }));

        let text = stringify_content(&message, lang, &options()).unwrap();
        let parsed = parse_content(&text, lang).unwrap();

        assert_eq!(parsed, message);
    }
}
