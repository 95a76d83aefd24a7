//! Paper citation graph: `u32` paper id -> set of adjacent `u32` ids.
//!
//! Built from a directed citation relation (source -> referenced) but the
//! builder inserts both directions, so the persisted graph is operationally
//! symmetric. Traversal therefore treats it as undirected; see DESIGN.md
//! for why the symmetrization is preserved rather than fixed.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{GraphError, Result};

#[derive(Debug, Default, Clone)]
pub struct PaperGraph {
    adjacency: HashMap<u32, BTreeSet<u32>>,
}

impl PaperGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn neighbors(&self, id: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    /// Inserts both `src -> dst` and `dst -> src`; a zero id is rejected.
    pub fn add_edge(&mut self, src: u32, dst: u32) -> bool {
        if src == 0 || dst == 0 {
            return false;
        }
        self.adjacency.entry(dst).or_default().insert(src);
        self.adjacency.entry(src).or_default().insert(dst);
        true
    }

    /// Builds from rows shaped `[source_id, ref_id, ref_id, ...]`.
    pub fn from_citation_rows(rows: &[Vec<u32>]) -> Self {
        let mut graph = Self::new();
        for row in rows {
            let Some((&source, refs)) = row.split_first() else {
                continue;
            };
            for &reference in refs {
                graph.add_edge(source, reference);
            }
        }
        graph
    }

    /// Binary layout: `u32 total_nodes`, then per node `u32 id`, `u32
    /// neighbor_count`, `neighbor_count * u32` neighbor ids, all
    /// little-endian.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&(self.adjacency.len() as u32).to_le_bytes())?;
        for (&id, neighbors) in &self.adjacency {
            out.write_all(&id.to_le_bytes())?;
            out.write_all(&(neighbors.len() as u32).to_le_bytes())?;
            for &n in neighbors {
                out.write_all(&n.to_le_bytes())?;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut input = BufReader::new(file);
        let mut graph = Self::new();

        let total_nodes = read_u32(&mut input)?;
        for _ in 0..total_nodes {
            let id = read_u32(&mut input)?;
            let neighbor_count = read_u32(&mut input)?;
            let mut neighbors = BTreeSet::new();
            for _ in 0..neighbor_count {
                neighbors.insert(read_u32(&mut input)?);
            }
            graph.adjacency.entry(id).or_default().extend(neighbors);
        }
        Ok(graph)
    }

    /// Iterative DFS trace from `source`: records `(parent, child)` pairs in
    /// visitation order, using parent sentinel `0` for the root. Empty if
    /// `source` is absent.
    pub fn citation_trace(&self, source: u32) -> Vec<(u32, u32)> {
        if !self.contains(source) {
            return Vec::new();
        }
        let mut seen: HashMap<u32, bool> = self.adjacency.keys().map(|&k| (k, false)).collect();
        let mut record = Vec::new();
        let mut stack = vec![(0u32, source)];
        while let Some((parent, child)) = stack.pop() {
            if !seen.get(&child).copied().unwrap_or(false) {
                seen.insert(child, true);
                record.push((parent, child));
            }
            for other in self.neighbors(child) {
                if !seen.get(&other).copied().unwrap_or(false) {
                    stack.push((child, other));
                }
            }
        }
        record
    }
}

fn read_u32(input: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    input
        .read_exact(&mut buf)
        .map_err(|e| GraphError::Corruption(format!("truncated paper graph file: {e}")))?;
    Ok(u32::from_le_bytes(buf))
}
