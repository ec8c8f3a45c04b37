//! Namespace dictionary file: `{ "<bundle glob>": "<namespace>" }`.

use std::path::Path;

use super::InputError;
use crate::bundle::NamespaceDictionary;

/// Loads the dictionary at `path`; no path means an empty dictionary.
///
/// # Errors
/// Fails when the file cannot be read or is not a string-to-string object.
pub async fn load_namespace_dictionary(path: Option<&Path>) -> Result<NamespaceDictionary, InputError> {
    let Some(path) = path else {
        return Ok(NamespaceDictionary::new());
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputError::Io { path: path.to_path_buf(), source })?;
    let dictionary: NamespaceDictionary = serde_json::from_str(&content)
        .map_err(|source| InputError::Parse { path: path.to_path_buf(), source })?;
    tracing::debug!(path = %path.display(), entries = dictionary.len(), "Loaded namespace dictionary");

    Ok(dictionary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_load_dictionary_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("namespace.json");
        fs::write(&path, r#"{"pkg/**/*.json": "pkg", "lib/*.json": "lib"}"#).unwrap();

        let dictionary = load_namespace_dictionary(Some(&path)).await.unwrap();

        let entries: Vec<_> = dictionary.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_that!(entries, elements_are![eq("pkg/**/*.json=pkg"), eq("lib/*.json=lib")]);
    }

    #[tokio::test]
    async fn test_no_path_is_empty() {
        let dictionary = load_namespace_dictionary(None).await.unwrap();

        assert_that!(dictionary.is_empty(), eq(true));
    }

    #[tokio::test]
    async fn test_non_string_values_fail() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("namespace.json");
        fs::write(&path, r#"{"pkg/**/*.json": 1}"#).unwrap();

        let result = load_namespace_dictionary(Some(&path)).await;

        assert!(matches!(result, Err(InputError::Parse { .. })));
    }
}
