//! File pattern matcher for component files.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::SyncSettings;

/// Errors compiling the include/exclude globs.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// An `includePatterns` entry is not a glob.
    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidIncludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// An `excludePatterns` entry is not a glob.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The compiled globs could not be combined.
    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches files against the configured include/exclude globs.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    /// Root the patterns are relative to.
    workspace_root: PathBuf,
    /// Compiled `includePatterns`.
    include_set: GlobSet,
    /// Compiled `excludePatterns`.
    exclude_set: GlobSet,
}

impl FileMatcher {
    /// Compiles the patterns of `settings` against `workspace_root`.
    pub fn new(workspace_root: PathBuf, settings: &SyncSettings) -> Result<Self, MatcherError> {
        let include_set = Self::build_glob_set(&settings.include_patterns, |pattern, source| {
            MatcherError::InvalidIncludePattern { pattern, source }
        })?;

        let exclude_set = Self::build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self { workspace_root, include_set, exclude_set })
    }

    /// Compiles `patterns` into one set, reporting a bad glob through `make_error`.
    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    /// Root the patterns are relative to.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Returns true if the path matches `includePatterns` but not `excludePatterns`.
    ///
    /// The path must be absolute and under the workspace root.
    #[must_use]
    pub fn is_component_file(&self, absolute_path: &Path) -> bool {
        let Some(relative_path) = absolute_path.strip_prefix(&self.workspace_root).ok() else {
            return false;
        };

        self.is_component_file_relative(relative_path)
    }

    /// Same as [`Self::is_component_file`] for a path relative to the workspace root.
    #[must_use]
    pub fn is_component_file_relative(&self, relative_path: &Path) -> bool {
        self.include_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    /// Settings with the given include/exclude patterns.
    fn create_settings(include: &[&str], exclude: &[&str]) -> SyncSettings {
        SyncSettings {
            include_patterns: include.iter().copied().map(String::from).collect(),
            exclude_patterns: exclude.iter().copied().map(String::from).collect(),
            ..SyncSettings::default()
        }
    }

    #[rstest]
    fn is_component_file_with_default_patterns() {
        let matcher = FileMatcher::new(PathBuf::from("/workspace"), &SyncSettings::default())
            .expect("valid patterns");

        assert!(matcher.is_component_file(Path::new("/workspace/src/App.vue")));
        assert!(matcher.is_component_file(Path::new("/workspace/src/components/Modal.vue")));

        assert!(!matcher.is_component_file(Path::new("/workspace/src/main.ts")));
        assert!(!matcher.is_component_file(Path::new("/workspace/node_modules/lib/Button.vue")));
    }

    #[rstest]
    fn is_component_file_with_exclude_patterns() {
        let settings = create_settings(&["**/*.vue"], &["**/dist/**", "**/*.spec.vue"]);
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_component_file(Path::new("/workspace/src/App.vue")));
        assert!(!matcher.is_component_file(Path::new("/workspace/dist/App.vue")));
        assert!(!matcher.is_component_file(Path::new("/workspace/src/App.spec.vue")));
    }

    #[rstest]
    fn is_component_file_outside_workspace() {
        let matcher = FileMatcher::new(PathBuf::from("/workspace"), &SyncSettings::default())
            .expect("valid patterns");

        assert!(!matcher.is_component_file(Path::new("/other/src/App.vue")));
    }

    #[rstest]
    fn is_component_file_relative_works() {
        let settings = create_settings(&["src/**/*.vue"], &[]);
        let matcher =
            FileMatcher::new(PathBuf::from("/workspace"), &settings).expect("valid patterns");

        assert!(matcher.is_component_file_relative(Path::new("src/App.vue")));
        assert!(!matcher.is_component_file_relative(Path::new("test/App.vue")));
    }

    #[rstest]
    fn new_with_invalid_include_pattern() {
        let settings = create_settings(&["**/*.{vue"], &[]);

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidIncludePattern { .. })));
    }

    #[rstest]
    fn new_with_invalid_exclude_pattern() {
        let settings = create_settings(&["**/*.vue"], &["[invalid"]);

        let result = FileMatcher::new(PathBuf::from("/workspace"), &settings);

        assert!(matches!(result, Err(MatcherError::InvalidExcludePattern { .. })));
    }
}
