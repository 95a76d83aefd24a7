//! Binary graph codecs and in-memory graph structures layered on top of
//! the B+-tree store: the unweighted paper citation graph and the
//! weighted author co-authorship/reference graph.

pub mod author;
pub mod paper;

pub use author::AuthorGraph;
pub use paper::PaperGraph;
