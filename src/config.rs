//! Store-level configuration.

/// How a [`crate::pager::Pager`] / [`crate::btree::BPlusTree`] is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Truncate both files (if present) and start from empty counters.
    CreateNew,
    /// Load existing counters from the metadata sidecar; all writes disabled.
    ReadOnly,
    /// Load existing counters from the metadata sidecar; writes enabled.
    ReadWrite,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        matches!(self, OpenMode::CreateNew | OpenMode::ReadWrite)
    }
}

/// Bounds on the author-graph builder's per-paper edge fan-out.
#[derive(Debug, Clone, Copy)]
pub struct AuthorGraphBuilderOptions {
    /// Maximum number of authors considered per side of an edge contribution.
    pub author_edge_limit: usize,
}

impl Default for AuthorGraphBuilderOptions {
    fn default() -> Self {
        Self {
            author_edge_limit: 8,
        }
    }
}

/// Recursion-depth cap for Tarjan's algorithm (see spec §4.7 / §9).
pub const TARJAN_DEPTH_CAP: usize = 1024;
