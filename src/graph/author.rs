//! Author co-authorship / citation-reference graph: `u64` author id ->
//! `u64` co-author id -> accumulated `i32` edge weight.
//!
//! Carries its own Tarjan SCC and Dijkstra shortest-path operations since
//! both only make sense over the weighted author graph, not the unweighted
//! paper graph.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::warn;

use crate::config::{AuthorGraphBuilderOptions, TARJAN_DEPTH_CAP};
use crate::error::{GraphError, Result};

const SAME_PAPER_WEIGHT: i32 = 10;
const REF_WEIGHT_ORIG: i32 = 2;
const REF_WEIGHT_REF: i32 = 1;

#[derive(Debug, Default, Clone)]
pub struct AuthorGraph {
    adjacency: BTreeMap<u64, BTreeMap<u64, i32>>,
}

impl AuthorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn edges(&self, id: u64) -> impl Iterator<Item = (u64, i32)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|m| m.iter().map(|(&k, &v)| (k, v)))
    }

    pub fn add_edge(&mut self, weight: i32, source: u64, dest: u64) {
        *self.adjacency.entry(source).or_default().entry(dest).or_insert(0) += weight;
        self.adjacency.entry(dest).or_default();
    }

    /// Symmetric: every ordered pair of distinct authors (bounded by
    /// `options.author_edge_limit` per side) gets weight `10*(n+1)` in
    /// both directions.
    pub fn add_same_paper(
        &mut self,
        authors: &[u64],
        n_citations: u32,
        options: &AuthorGraphBuilderOptions,
    ) {
        let limit = authors.len().min(options.author_edge_limit);
        let weight = SAME_PAPER_WEIGHT * (n_citations as i32 + 1);
        for i in 0..limit {
            for j in (i + 1)..limit {
                self.add_edge(weight, authors[i], authors[j]);
                self.add_edge(weight, authors[j], authors[i]);
            }
        }
    }

    /// Asymmetric: every paper author gets an edge to every referenced
    /// author (bounded by `options.author_edge_limit` per side), weighted
    /// `2*n_paper + 1*n_ref`. The reverse direction is not added.
    pub fn add_referenced(
        &mut self,
        paper_authors: &[u64],
        referenced_authors: &[u64],
        n_paper: u32,
        n_ref: u32,
        options: &AuthorGraphBuilderOptions,
    ) {
        let author_limit = paper_authors.len().min(options.author_edge_limit);
        let ref_limit = referenced_authors.len().min(options.author_edge_limit);
        let weight = REF_WEIGHT_ORIG * n_paper as i32 + REF_WEIGHT_REF * n_ref as i32;
        for &a in &paper_authors[..author_limit] {
            for &r in &referenced_authors[..ref_limit] {
                self.add_edge(weight, a, r);
            }
        }
    }

    /// Binary layout: `u32 total_nodes`, then per node `i64 id`, `u32
    /// edge_count`, `edge_count * (i64 neighbor_id, i32 weight)`, all
    /// little-endian.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&(self.adjacency.len() as u32).to_le_bytes())?;
        for (&id, edges) in &self.adjacency {
            out.write_all(&(id as i64).to_le_bytes())?;
            out.write_all(&(edges.len() as u32).to_le_bytes())?;
            for (&dest, &weight) in edges {
                out.write_all(&(dest as i64).to_le_bytes())?;
                out.write_all(&weight.to_le_bytes())?;
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
            let id = read_i64(&mut input)? as u64;
            let edge_count = read_u32(&mut input)?;
            let entry = graph.adjacency.entry(id).or_default();
            for _ in 0..edge_count {
                let dest = read_i64(&mut input)? as u64;
                let weight = read_i32(&mut input)?;
                entry.insert(dest, weight);
            }
        }
        Ok(graph)
    }

    /// Full Tarjan's algorithm over every node. Singleton components are
    /// discarded.
    pub fn tarjan_all(&self) -> Vec<Vec<u64>> {
        let mut state = TarjanState::default();
        let mut out = Vec::new();
        let nodes: Vec<u64> = self.adjacency.keys().copied().collect();
        for node in nodes {
            if !state.disc.contains_key(&node) {
                self.tarjan_search(node, &mut state, &mut out);
            }
        }
        out
    }

    /// Tarjan's algorithm seeded at a single node. Returns an empty vector
    /// and logs a warning if `query` is absent.
    pub fn tarjan_from(&self, query: u64) -> Vec<Vec<u64>> {
        if !self.contains(query) {
            warn!(query, "tarjan_from: node not found in author graph");
            return Vec::new();
        }
        let mut state = TarjanState::default();
        let mut out = Vec::new();
        self.tarjan_search(query, &mut state, &mut out);
        out
    }

    fn tarjan_search(&self, start: u64, state: &mut TarjanState, out: &mut Vec<Vec<u64>>) {
        struct Frame {
            node: u64,
            neighbors: Vec<u64>,
            idx: usize,
        }

        let mut call_stack: Vec<Frame> = Vec::new();
        self.tarjan_visit(start, state);
        call_stack.push(Frame {
            neighbors: self.sorted_neighbors(start),
            node: start,
            idx: 0,
        });

        while let Some(frame) = call_stack.last_mut() {
            if frame.idx < frame.neighbors.len() {
                let next = frame.neighbors[frame.idx];
                frame.idx += 1;
                if !state.disc.contains_key(&next) {
                    if call_stack.len() >= TARJAN_DEPTH_CAP {
                        // Depth cap reached: this branch is truncated and
                        // `next` is left unvisited for this DFS. `tarjan_all`
                        // will start a fresh component from it later.
                        continue;
                    }
                    self.tarjan_visit(next, state);
                    let neighbors = self.sorted_neighbors(next);
                    call_stack.push(Frame {
                        node: next,
                        neighbors,
                        idx: 0,
                    });
                } else if state.on_stack.get(&next).copied().unwrap_or(false) {
                    let disc_next = state.disc[&next];
                    let low = state.low.get_mut(&frame.node).unwrap();
                    *low = (*low).min(disc_next);
                }
            } else {
                let node = frame.node;
                call_stack.pop();
                if let Some(parent) = call_stack.last() {
                    let node_low = state.low[&node];
                    let parent_low = state.low.get_mut(&parent.node).unwrap();
                    *parent_low = (*parent_low).min(node_low);
                }
                if state.disc[&node] == state.low[&node] {
                    let mut component = Vec::new();
                    loop {
                        let top = state.scc_stack.pop().unwrap();
                        state.on_stack.insert(top, false);
                        component.push(top);
                        if top == node {
                            break;
                        }
                    }
                    if component.len() > 1 {
                        out.push(component);
                    }
                }
            }
        }
    }

    fn tarjan_visit(&self, node: u64, state: &mut TarjanState) {
        state.disc.insert(node, state.next_id);
        state.low.insert(node, state.next_id);
        state.next_id += 1;
        state.scc_stack.push(node);
        state.on_stack.insert(node, true);
    }

    fn sorted_neighbors(&self, node: u64) -> Vec<u64> {
        self.adjacency
            .get(&node)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Dijkstra's shortest path using reciprocal edge weight as distance
    /// (`1/weight`). Empty if `start` or `dest` is absent or unreachable.
    pub fn shortest_path(&self, start: u64, dest: u64) -> Vec<u64> {
        if !self.contains(start) || !self.contains(dest) {
            return Vec::new();
        }

        let mut dist: HashMap<u64, f64> = HashMap::new();
        let mut prev: HashMap<u64, u64> = HashMap::new();
        let mut visited: HashSet<u64> = HashSet::new();
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();

        dist.insert(start, 0.0);
        heap.push(HeapEntry { dist: 0.0, node: start });

        while let Some(HeapEntry { dist: d, node: u }) = heap.pop() {
            if !visited.insert(u) {
                continue;
            }
            if u == dest {
                break;
            }
            if let Some(edges) = self.adjacency.get(&u) {
                for (&v, &weight) in edges {
                    let step = 1.0 / weight as f64;
                    let candidate = d + step;
                    if candidate < *dist.get(&v).unwrap_or(&f64::INFINITY) {
                        dist.insert(v, candidate);
                        prev.insert(v, u);
                        heap.push(HeapEntry { dist: candidate, node: v });
                    }
                }
            }
        }

        if !visited.contains(&dest) {
            return Vec::new();
        }

        let mut path = vec![dest];
        let mut cur = dest;
        while cur != start {
            match prev.get(&cur) {
                Some(&p) => {
                    path.push(p);
                    cur = p;
                }
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }
}

#[derive(Default)]
struct TarjanState {
    disc: HashMap<u64, u32>,
    low: HashMap<u64, u32>,
    on_stack: HashMap<u64, bool>,
    scc_stack: Vec<u64>,
    next_id: u32,
}

struct HeapEntry {
    dist: f64,
    node: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.node == other.node
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.node.cmp(&other.node))
    }
}

fn read_u32(input: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    input
        .read_exact(&mut buf)
        .map_err(|e| GraphError::Corruption(format!("truncated author graph file: {e}")))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i64(input: &mut impl Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    input
        .read_exact(&mut buf)
        .map_err(|e| GraphError::Corruption(format!("truncated author graph file: {e}")))?;
    Ok(i64::from_le_bytes(buf))
}

fn read_i32(input: &mut impl Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    input
        .read_exact(&mut buf)
        .map_err(|e| GraphError::Corruption(format!("truncated author graph file: {e}")))?;
    Ok(i32::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cycle(ids: &[u64]) -> AuthorGraph {
        let mut g = AuthorGraph::new();
        for w in ids.windows(2) {
            g.add_edge(1, w[0], w[1]);
        }
        g.add_edge(1, *ids.last().unwrap(), ids[0]);
        g
    }

    #[test]
    fn tarjan_from_finds_seven_node_cycle() {
        let ids = [
            2142249029u64,
            2113592602,
            2103626414,
            2117665592,
            2023460672,
            2174205032,
            2022192081,
        ];
        let g = cycle(&ids);
        let sccs = g.tarjan_from(ids[0]);
        assert_eq!(sccs.len(), 1);
        let mut members = sccs[0].clone();
        members.sort();
        let mut expected = ids.to_vec();
        expected.sort();
        assert_eq!(members, expected);
    }

    #[test]
    fn tarjan_all_finds_two_disjoint_cycles() {
        let mut g = cycle(&[1, 2, 3, 4]);
        for w in [5u64, 6, 7, 8].windows(2) {
            g.add_edge(1, w[0], w[1]);
        }
        g.add_edge(1, 8, 5);
        let sccs = g.tarjan_all();
        assert_eq!(sccs.len(), 2);
        for scc in &sccs {
            assert_eq!(scc.len(), 4);
        }
    }

    #[test]
    fn tarjan_discards_singleton_components() {
        let mut g = AuthorGraph::new();
        g.add_edge(1, 1, 2);
        g.add_edge(1, 2, 3);
        let sccs = g.tarjan_all();
        assert!(sccs.is_empty());
    }

    #[test]
    fn tarjan_from_missing_query_is_empty() {
        let g = cycle(&[1, 2, 3]);
        assert!(g.tarjan_from(999).is_empty());
    }

    #[test]
    fn shortest_path_direct_and_multihop() {
        let mut g = AuthorGraph::new();
        g.add_edge(10, 1, 2);
        g.add_edge(10, 2, 3);
        g.add_edge(1, 1, 3);
        let path = g.shortest_path(1, 3);
        assert_eq!(path, vec![1, 3]);
    }

    #[test]
    fn shortest_path_disconnected_is_empty() {
        let mut g = AuthorGraph::new();
        g.add_edge(5, 1, 2);
        g.add_edge(5, 3, 4);
        assert!(g.shortest_path(1, 4).is_empty());
    }

    #[test]
    fn shortest_path_missing_endpoint_is_empty() {
        let mut g = AuthorGraph::new();
        g.add_edge(5, 1, 2);
        assert!(g.shortest_path(1, 999).is_empty());
        assert!(g.shortest_path(999, 1).is_empty());
    }

    #[test]
    fn add_same_paper_uses_plus_one_normalization() {
        let mut g = AuthorGraph::new();
        let opts = AuthorGraphBuilderOptions::default();
        g.add_same_paper(&[1, 2], 0, &opts);
        let edges: Vec<(u64, i32)> = g.edges(1).collect();
        assert_eq!(edges, vec![(2, 10)]);
    }

    #[test]
    fn add_referenced_is_asymmetric() {
        let mut g = AuthorGraph::new();
        let opts = AuthorGraphBuilderOptions::default();
        g.add_referenced(&[1], &[2], 3, 4, &opts);
        assert_eq!(g.edges(1).collect::<Vec<_>>(), vec![(2, 2 * 3 + 4)]);
        assert!(g.edges(2).collect::<Vec<_>>().is_empty());
    }

    #[test]
    fn author_edge_limit_caps_fan_out() {
        let mut g = AuthorGraph::new();
        let opts = AuthorGraphBuilderOptions {
            author_edge_limit: 2,
        };
        g.add_referenced(&[1, 2, 3], &[10, 20, 30], 1, 1, &opts);
        assert_eq!(g.edges(3).collect::<Vec<_>>().len(), 0);
        assert_eq!(g.edges(1).collect::<Vec<_>>().len(), 2);
    }

    #[test]
    fn export_load_roundtrip() {
        let mut g = AuthorGraph::new();
        g.add_edge(10, 1, 2);
        g.add_edge(20, 2, 1);
        let dir = tempdir().unwrap();
        let path = dir.path().join("authors.bin");
        g.export_to_file(&path).unwrap();
        let back = AuthorGraph::load_from_file(&path).unwrap();
        assert_eq!(back.edges(1).collect::<Vec<_>>(), vec![(2, 10)]);
        assert_eq!(back.edges(2).collect::<Vec<_>>(), vec![(1, 20)]);
    }
}
