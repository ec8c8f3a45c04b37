//! ローカルプロバイダーを使ったプロバイダーコマンドのテスト

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]
#![allow(missing_docs)]

use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use pretty_assertions::assert_eq;
use serde_json::{
    Value,
    json,
};
use sfc_locale_sync::commands::diff::DiffCommand;
use sfc_locale_sync::commands::export::ExportCommand;
use sfc_locale_sync::commands::import::ImportCommand;
use sfc_locale_sync::commands::pull::PullCommand;
use sfc_locale_sync::commands::push::PushCommand;
use sfc_locale_sync::commands::status::StatusCommand;
use sfc_locale_sync::commands::targets::LocaleTargets;
use sfc_locale_sync::commands::{
    EXIT_DIFFERENCES,
    ProviderArgs,
    Report,
};
use sfc_locale_sync::config::SyncSettings;
use sfc_locale_sync::provider::{
    Normalize,
    ProviderError,
};
use sfc_locale_sync::{
    CommandError,
    Context,
};
use tempfile::TempDir;

/// Locale of `locales/<locale>.json`.
const LOCALE_MATCH: &str = r"^([\w-]+)\.json$";

/// Workspace with `locales/en.json`, `locales/ja.json` and a local store under `store/`.
fn workspace() -> (TempDir, Context) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("locales")).unwrap();
    write_json(root, "locales/en.json", &json!({"greeting": {"hello": "Hello"}, "bye": "Bye"}));
    write_json(root, "locales/ja.json", &json!({"greeting": {"hello": "こんにちは"}, "bye": ""}));
    let conf = json!({"provider": {"root": root.join("store").display().to_string()}});
    write_json(root, "local-conf.json", &conf);
    let context = Context::new(root, SyncSettings::default());
    (temp_dir, context)
}

/// Writes `value` as pretty JSON to `root/relative`.
fn write_json(root: &Path, relative: &str, value: &Value) {
    fs::write(root.join(relative), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Parses the JSON file at `path`.
fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// The `local` provider configured by `local-conf.json`.
fn local() -> ProviderArgs {
    ProviderArgs { provider: "local".to_string(), conf: None, normalize: None }
}

/// Every file under `locales/`.
fn locale_files() -> LocaleTargets {
    LocaleTargets {
        target: None,
        target_paths: vec!["locales/*.json".to_string()],
        filename_match: Some(LOCALE_MATCH.to_string()),
    }
}

/// Pushes every locale file to the store.
async fn push(context: &Context) {
    PushCommand { provider: local(), targets: locale_files(), locale: None, dry_run: false }
        .execute(context)
        .await
        .unwrap();
}

/// `diff` over every locale file.
fn diff_command() -> DiffCommand {
    DiffCommand { provider: local(), targets: locale_files(), locale: None }
}

#[tokio::test]
async fn test_push_then_status() {
    let (temp_dir, context) = workspace();

    push(&context).await;
    let report = StatusCommand { provider: local(), locales: Vec::new() }.execute(&context).await.unwrap();

    assert_eq!(
        read_json(&temp_dir.path().join("store/en.json")),
        json!({"greeting": {"hello": "Hello"}, "bye": "Bye"})
    );
    let statuses: Vec<_> = report.statuses.iter().map(|s| (s.locale.clone(), s.percentage)).collect();
    assert_eq!(statuses, vec![("en".to_string(), 100), ("ja".to_string(), 50)]);
    assert_eq!(report.exit_code(), 1);
    assert!(report.to_string().ends_with("Translation work in progress\n"));
}

#[tokio::test]
async fn test_push_dry_run_writes_nothing() {
    let (temp_dir, context) = workspace();

    let report = PushCommand { provider: local(), targets: locale_files(), locale: None, dry_run: true }
        .execute(&context)
        .await
        .unwrap();

    assert_eq!(report.locales, vec!["en".to_string(), "ja".to_string()]);
    assert!(!temp_dir.path().join("store").exists());
}

#[tokio::test]
async fn test_push_file_path_mode() {
    let (temp_dir, context) = workspace();
    let root = temp_dir.path();
    let conf = json!({
        "provider": {"root": root.join("store").display().to_string()},
        "pushMode": "file-path"
    });
    write_json(root, "local-conf.json", &conf);
    let targets = LocaleTargets { target: Some(PathBuf::from("locales/ja.json")), ..LocaleTargets::default() };

    PushCommand { provider: local(), targets, locale: None, dry_run: false }.execute(&context).await.unwrap();

    assert_eq!(
        read_json(&root.join("store/ja.json")),
        json!({"greeting": {"hello": "こんにちは"}, "bye": ""})
    );
    assert!(!root.join("store/en.json").exists());
}

#[tokio::test]
async fn test_diff_against_service() {
    let (temp_dir, context) = workspace();
    push(&context).await;

    let same = diff_command().execute(&context).await.unwrap();
    assert_eq!(same.exit_code(), 0);
    assert_eq!(same.to_string(), "No differences\n");

    write_json(temp_dir.path(), "locales/ja.json", &json!({"greeting": {"hello": "やあ"}, "bye": ""}));
    let changed = diff_command().execute(&context).await.unwrap();

    assert_eq!(changed.exit_code(), EXIT_DIFFERENCES);
    assert_eq!(
        changed.to_string(),
        "ja:\n  ~ greeting.hello: \"やあ\" -> \"こんにちは\"\nThere are differences!\n"
    );
}

#[tokio::test]
async fn test_flat_store_with_normalize() {
    let (temp_dir, context) = workspace();
    let flat = ProviderArgs { normalize: Some(Normalize::Flat), ..local() };

    PushCommand { provider: flat.clone(), targets: locale_files(), locale: None, dry_run: false }
        .execute(&context)
        .await
        .unwrap();
    let same = DiffCommand { provider: flat, targets: locale_files(), locale: None }.execute(&context).await.unwrap();
    let nested = PullCommand {
        provider: ProviderArgs { normalize: Some(Normalize::Hierarchy), ..local() },
        output: PathBuf::from("pulled"),
        locales: vec!["en".to_string()],
        dry_run: false,
    }
    .execute(&context)
    .await
    .unwrap();

    assert_eq!(read_json(&temp_dir.path().join("store/en.json")), json!({"greeting.hello": "Hello", "bye": "Bye"}));
    assert_eq!(same.exit_code(), 0);
    assert_eq!(
        read_json(&nested.written[0].1),
        json!({"greeting": {"hello": "Hello"}, "bye": "Bye"})
    );
}

#[tokio::test]
async fn test_pull_writes_locale_files() {
    let (temp_dir, context) = workspace();
    push(&context).await;

    let report = PullCommand {
        provider: local(),
        output: PathBuf::from("pulled"),
        locales: vec!["ja".to_string()],
        dry_run: false,
    }
    .execute(&context)
    .await
    .unwrap();

    let path = temp_dir.path().join("pulled/ja.json");
    assert_eq!(report.written, vec![("ja".to_string(), path.clone())]);
    assert_eq!(read_json(&path), json!({"greeting": {"hello": "こんにちは"}, "bye": ""}));
    assert!(!temp_dir.path().join("pulled/en.json").exists());
}

#[tokio::test]
async fn test_export_then_import() {
    let (temp_dir, context) = workspace();
    let root = temp_dir.path();
    push(&context).await;

    let exported = ExportCommand {
        provider: local(),
        output: PathBuf::from("exported"),
        locales: Vec::new(),
        format: "json".to_string(),
        dry_run: false,
    }
    .execute(&context)
    .await
    .unwrap();
    assert_eq!(exported.written.len(), 2);
    assert_eq!(
        fs::read_to_string(root.join("exported/en.json")).unwrap(),
        fs::read_to_string(root.join("store/en.json")).unwrap()
    );

    write_json(root, "exported/en.json", &json!({"bye": "See you"}));
    let imported = ImportCommand {
        provider: local(),
        targets: LocaleTargets { target: Some(PathBuf::from("exported/en.json")), ..LocaleTargets::default() },
        locale: None,
        format: None,
        dry_run: false,
    }
    .execute(&context)
    .await
    .unwrap();

    assert_eq!(imported.imported, vec!["en".to_string()]);
    assert_eq!(read_json(&root.join("store/en.json")), json!({"bye": "See you"}));
}

#[tokio::test]
async fn test_unknown_provider() {
    let (_temp_dir, context) = workspace();
    let provider = ProviderArgs { provider: "nowhere".to_string(), conf: None, normalize: None };

    let result = StatusCommand { provider, locales: Vec::new() }.execute(&context).await;

    assert!(matches!(
        result,
        Err(CommandError::Provider(ProviderError::NotFound { name })) if name == "nowhere"
    ));
}

#[tokio::test]
async fn test_local_provider_requires_root() {
    let (temp_dir, context) = workspace();
    write_json(temp_dir.path(), "other-conf.json", &json!({"provider": {}}));
    let provider = ProviderArgs { provider: "local".to_string(), conf: Some(PathBuf::from("other-conf.json")),
        normalize: None,
    };

    let result = StatusCommand { provider, locales: Vec::new() }.execute(&context).await;

    assert!(matches!(result, Err(CommandError::Provider(ProviderError::Operation { .. }))));
}
