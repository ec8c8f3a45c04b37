//! sfc-locale-sync
//!
//! Moves locale messages between the i18n blocks of single-file components
//! and a canonical locale-keyed message file, in both directions:
//!
//! - [`squeeze`] extracts every block into a [`ir::ComponentMetaTable`] and
//!   folds it into one tree, each file nested under its directory hierarchy.
//! - [`reconcile`] and [`infuse`] write an edited tree back, rewriting only
//!   the block bodies and leaving every other byte of the source alone.
//! - [`bundle`] keeps part of the tree in external bundle files.

pub mod bundle;
pub mod commands;
pub mod config;
pub mod hierarchy;
pub mod indexer;
pub mod infuse;
pub mod input;
pub mod ir;
pub mod provider;
pub mod reconcile;
pub mod squeeze;
pub mod syntax;
pub mod types;

mod test_utils;

pub use commands::{
    Cli,
    CommandError,
    Context,
};
