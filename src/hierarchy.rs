//! Maps a component file to its key path inside the canonical tree.

use std::path::{
    Component,
    Path,
    PathBuf,
};

use thiserror::Error;

/// Errors mapping a file into the hierarchy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// The file lies outside the base directory.
    #[error("'{}' is not inside base directory '{}'", path.display(), base.display())]
    InvalidBase { base: PathBuf, path: PathBuf },
}

/// Returns the directories between `base` and `file`, followed by the file
/// stem.
///
/// `/p/src` and `/p/src/components/Modal.vue` give `["components", "Modal"]`.
///
/// # Errors
/// Returns [`HierarchyError::InvalidBase`] when `file` is not under `base`.
pub fn resolve_hierarchy(base: &Path, file: &Path) -> Result<Vec<String>, HierarchyError> {
    let invalid = || HierarchyError::InvalidBase { base: base.to_path_buf(), path: file.to_path_buf() };

    let parent = file.parent().ok_or_else(invalid)?;
    let relative = parent.strip_prefix(base).map_err(|_| invalid())?;
    let stem = file.file_stem().ok_or_else(invalid)?;

    let mut hierarchy: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    hierarchy.push(stem.to_string_lossy().into_owned());

    tracing::debug!(file = %file.display(), ?hierarchy, "Resolved hierarchy");
    Ok(hierarchy)
}
