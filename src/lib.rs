//! # corpusgraph
//!
//! A paged, on-disk B+-tree key/value store specialized for a bibliographic
//! corpus: typed paper and author records, a binary-serialized citation
//! graph, and a weighted co-authorship graph with Tarjan SCC and Dijkstra
//! shortest-path queries.
//!
//! ## Quick start
//!
//! ```no_run
//! use corpusgraph::btree::BPlusTree;
//! use corpusgraph::config::OpenMode;
//! use corpusgraph::pager::Pager;
//! use corpusgraph::record::PaperRecord;
//!
//! let pager = Pager::open("papers.keys", "papers.values", "papers.meta", OpenMode::CreateNew)?;
//! let mut tree = BPlusTree::<PaperRecord>::new(pager);
//! tree.insert(1, PaperRecord::new("A Study of Graphs", "graphs", [0; 8], 0, 2020, 1))?;
//! let found = tree.find(1)?;
//! assert_eq!(found.title, "A Study of Graphs");
//! # Ok::<(), corpusgraph::error::GraphError>(())
//! ```
//!
//! ## Layout
//!
//! - [`pager`]: paged file I/O and the metadata sidecar.
//! - [`record`]: fixed-size record codecs (`PaperRecord`, `AuthorRecord`).
//! - [`btree`]: the generic B+-tree engine over [`record::Record`].
//! - [`graph`]: binary graph codecs plus Tarjan/Dijkstra/DFS operations.
//! - [`config`]: open modes and builder tuning knobs.
//! - [`error`]: the crate-wide error type.
//! - [`logging`]: shared `tracing` setup for the `papers`/`authors` binaries.

pub mod btree;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod pager;
pub mod record;

pub use crate::btree::BPlusTree;
pub use crate::error::{GraphError, Result};
pub use crate::graph::{AuthorGraph, PaperGraph};
pub use crate::record::{AuthorRecord, PaperRecord, Record};
