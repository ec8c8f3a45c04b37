//! File discovery.

pub mod types;
pub mod workspace;

pub use types::{
    ComponentSource,
    IndexerError,
};
pub use workspace::{
    WorkspaceIndexer,
    expand_patterns,
    read_sources,
};
