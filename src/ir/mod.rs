//! Intermediate representation shared by extraction, reconciliation and injection.

pub mod block;
pub mod message;
pub mod patch;

pub use block::{
    BlockLang,
    BlockRecord,
    ComponentMetaTable,
    FileMeta,
};
pub use message::{
    Message,
    MessageMap,
    MessageTree,
    PathSegment,
    deep_merge,
    flatten,
    merge_trees,
    unflatten,
};
pub use patch::{
    Patch,
    PatchOp,
    apply_patch,
    diff,
};
