//! Patching extracted block records towards an external canonical tree.
//!
//! Every locale of a file is reconciled as a whole: the file's current value
//! for the locale (its blocks merged in order) is diffed against the value
//! collected from the external tree, and each resulting op is routed to the
//! blocks that hold the affected key. Blocks whose values did not change are
//! left exactly as they were.

use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

use crate::ir::{
    BlockLang,
    BlockRecord,
    ComponentMetaTable,
    FileMeta,
    Message,
    MessageTree,
    Patch,
    PatchOp,
    apply_patch,
    deep_merge,
    diff,
};
use crate::types::Locale;

/// How a file's hierarchy is looked up in the external tree when a segment
/// is missing.
///
/// [`Self::Exact`] is the default. The closest-ancestor walk (keep the
/// deepest value reached before the missing segment, so a moved component
/// receives its old parent's messages) is opt-in through
/// `hierarchyFallback: "closestAncestor"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HierarchyFallback {
    /// The locale contributes nothing to the file.
    #[default]
    Exact,
    /// Keep the deepest value reached before the missing segment.
    ClosestAncestor,
}

/// Knobs of [`reconcile_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// How a component's hierarchy is looked up in the tree.
    pub fallback: HierarchyFallback,
    /// Drop blocks (or block keys) for locales missing from the external tree.
    pub allow_prune: bool,
}

/// What reconciliation did to one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Component file.
    pub path: PathBuf,
    /// Locales found both in the file and in the external tree.
    pub matched: Vec<Locale>,
    /// Locales that got a new block appended.
    pub added: Vec<Locale>,
    /// Block locales absent from the external tree.
    pub stale: Vec<Locale>,
    /// Stale locales that were removed because pruning is allowed.
    pub pruned: Vec<Locale>,
}

/// Looks up the messages addressed by `hierarchy` in each locale of `tree`.
#[must_use]
pub fn collect_messages(
    tree: &MessageTree,
    hierarchy: &[String],
    fallback: HierarchyFallback,
) -> MessageTree {
    let mut collected = MessageTree::new();

    'locales: for (locale, root) in tree {
        if root.is_null() {
            continue;
        }
        let mut current = root;
        for segment in hierarchy {
            match current.as_node().and_then(|map| map.get(segment)).filter(|next| !next.is_null()) {
                Some(next) => current = next,
                None if fallback == HierarchyFallback::ClosestAncestor => break,
                None => continue 'locales,
            }
        }
        collected.insert(locale.clone(), current.clone());
    }

    tracing::debug!(?hierarchy, locales = ?collected.keys().collect::<Vec<_>>(), "Collected messages");
    collected
}

/// Patches `meta.blocks` so they carry the external messages for the file.
///
/// Locales without a block get a new JSON block appended. Block locales
/// missing from `tree` are reported as stale and only removed when
/// `options.allow_prune` is set.
pub fn reconcile_file(
    meta: &mut FileMeta,
    tree: &MessageTree,
    options: ReconcileOptions,
) -> ReconcileReport {
    let collected = collect_messages(tree, &meta.hierarchy, options.fallback);
    let mut report = ReconcileReport { path: meta.path.clone(), ..ReconcileReport::default() };

    for (locale, target) in &collected {
        let owners: Vec<usize> = meta
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.messages.contains_key(locale))
            .map(|(index, _)| index)
            .collect();

        if owners.is_empty() {
            meta.blocks.push(BlockRecord::for_locale(BlockLang::Json, locale.clone(), target.clone()));
            report.added.push(locale.clone());
        } else {
            patch_owners(&mut meta.blocks, &owners, locale, target);
            report.matched.push(locale.clone());
        }
    }

    for block in &mut meta.blocks {
        for locale in block.locales() {
            if collected.contains_key(&locale) {
                continue;
            }
            if !report.stale.contains(&locale) {
                report.stale.push(locale.clone());
            }
            if !options.allow_prune {
                continue;
            }
            if block.locale.is_some() {
                block.pruned = true;
            } else {
                block.messages.shift_remove(&locale);
                block.pruned = block.messages.is_empty();
            }
            if !report.pruned.contains(&locale) {
                report.pruned.push(locale);
            }
        }
    }

    if !report.stale.is_empty() {
        if options.allow_prune {
            tracing::warn!(path = %meta.path.display(), locales = ?report.stale, "Pruned stale locales");
        } else {
            tracing::warn!(path = %meta.path.display(), locales = ?report.stale, "Stale locales kept");
        }
    }

    report
}

/// Reconciles every file of `table`, in path order.
pub fn reconcile(
    table: &mut ComponentMetaTable,
    tree: &MessageTree,
    options: ReconcileOptions,
) -> Vec<ReconcileReport> {
    table.components.values_mut().map(|meta| reconcile_file(meta, tree, options)).collect()
}

/// Messages of `locale` in `block`.
fn locale_value<'a>(block: &'a BlockRecord, locale: &str) -> Option<&'a Message> {
    block.messages.get(locale)
}

/// Brings the blocks holding `locale` (in `owners`) in line with `target`.
///
/// Each change goes to the last owner that already has the changed key.
fn patch_owners(blocks: &mut [BlockRecord], owners: &[usize], locale: &str, target: &Message) {
    let values: Vec<&Message> =
        owners.iter().filter_map(|&i| blocks.get(i).and_then(|b| locale_value(b, locale))).collect();
    let Some((first, rest)) = values.split_first() else {
        return;
    };
    let mut merged = (*first).clone();
    for value in rest {
        deep_merge(&mut merged, (*value).clone());
    }

    let patch = diff(&merged, target);
    if patch.is_empty() {
        return;
    }

    let last = values.len() - 1;
    let mut routed: Vec<Vec<PatchOp>> = vec![Vec::new(); values.len()];
    for op in patch.ops() {
        match op {
            PatchOp::Add { path, .. } => {
                let parent = path.split_last().map_or(&[][..], |(_, parent)| parent);
                let owner = values
                    .iter()
                    .rposition(|value| {
                        value.get_path(parent).is_some_and(|p| matches!(p, Message::Node(_) | Message::List(_)))
                    })
                    .unwrap_or(last);
                if let Some(ops) = routed.get_mut(owner) {
                    ops.push(op.clone());
                }
            }
            PatchOp::Replace { path, .. } | PatchOp::Remove { path, .. } => {
                let holders: Vec<usize> = values
                    .iter()
                    .enumerate()
                    .filter(|(_, value)| value.get_path(path).is_some())
                    .map(|(i, _)| i)
                    .collect();
                let holders = if holders.is_empty() && matches!(op, PatchOp::Replace { .. }) {
                    vec![last]
                } else {
                    holders
                };
                for holder in holders {
                    if let Some(ops) = routed.get_mut(holder) {
                        ops.push(op.clone());
                    }
                }
            }
        }
    }

    for (&index, ops) in owners.iter().zip(routed) {
        if ops.is_empty() {
            continue;
        }
        let Some(block) = blocks.get_mut(index) else {
            continue;
        };
        let current = block.messages.get(locale).cloned().unwrap_or_default();
        let updated = apply_patch(&current, &Patch::new(ops));
        block.messages.insert(locale.to_string(), updated);
    }
}
