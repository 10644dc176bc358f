use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::graph::SearchGraph;
use crate::types::*;
use crate::util::binary::{read_count, read_f64, read_u32, write_count, write_f64, write_u32, BinaryRecord};
use crate::util::radix_heap::{distance_key, HasKey, RadixHeapQueue};

/// Pending frontier record: reach `node` from `predecessor` at `distance`.
///
/// The root's own record uses the root as its predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expansion<N> {
    pub node: N,
    pub predecessor: N,
    pub distance: Distance,
}

impl<N> HasKey for Expansion<N> {
    #[inline]
    fn key(&self) -> u64 {
        distance_key(self.distance)
    }
}

/// Incremental best-first (Dijkstra) expansion from a root.
///
/// Edges come from `SearchGraph::expand`, so the tree can grow over graphs
/// far too large to materialize. Each call to `next` settles one node.
/// Entries with equal distance leave the frontier in LIFO order within their
/// radix bucket; no other tie-break is guaranteed.
#[derive(Debug, Clone)]
pub struct ShortestPathTree<N> {
    root: N,
    expanded: HashSet<NodeIndex>,
    successors: HashMap<N, Vec<N>>,
    frontier: RadixHeapQueue<Expansion<N>>,
    last_expanded: Option<Expansion<N>>,
    edge_scratch: Vec<(EdgeWeight, N)>,
}

impl<N: Copy + Eq + Hash> ShortestPathTree<N> {
    pub fn new(root: N) -> Self {
        let mut frontier = RadixHeapQueue::new();
        frontier.enqueue(Expansion {
            node: root,
            predecessor: root,
            distance: 0.0,
        });
        ShortestPathTree {
            root,
            expanded: HashSet::new(),
            successors: HashMap::new(),
            frontier,
            last_expanded: None,
            edge_scratch: Vec::new(),
        }
    }

    pub fn root(&self) -> N {
        self.root
    }

    /// Settle the closest pending node and enqueue its unexpanded neighbours.
    ///
    /// Returns `false` once the frontier holds nothing but stale entries.
    pub fn next<G>(&mut self, graph: &G, on_radius: &mut dyn FnMut(N, N, f64)) -> bool
    where
        G: SearchGraph<Node = N>,
    {
        let current = loop {
            let Some(expansion) = self.frontier.dequeue() else {
                return false;
            };
            if self.expanded.insert(graph.node_index(expansion.node)) {
                break expansion;
            }
        };

        if current.node != self.root {
            self.successors
                .entry(current.predecessor)
                .or_default()
                .push(current.node);
        }
        self.last_expanded = Some(current);

        let mut edges = std::mem::take(&mut self.edge_scratch);
        edges.clear();
        {
            let expanded = &self.expanded;
            let reachable = |n: N| !expanded.contains(&graph.node_index(n));
            graph.expand(current.node, &reachable, &mut edges, on_radius);
        }
        for &(weight, node) in &edges {
            self.frontier.enqueue(Expansion {
                node,
                predecessor: current.node,
                distance: current.distance + weight,
            });
        }
        self.edge_scratch = edges;
        true
    }

    /// The record settled by the most recent successful `next`.
    pub fn last_expanded(&self) -> Option<&Expansion<N>> {
        self.last_expanded.as_ref()
    }

    /// Children recorded for `node`, in the order they were settled.
    pub fn successors(&self, node: N) -> &[N] {
        self.successors.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Call `visitor` on each child of `node` until it returns `false`.
    /// Returns `false` if the visit was cut short.
    pub fn visit_successors(&self, node: N, mut visitor: impl FnMut(N) -> bool) -> bool {
        self.successors(node).iter().all(|&child| visitor(child))
    }

    pub fn is_expanded<G>(&self, graph: &G, node: N) -> bool
    where
        G: SearchGraph<Node = N>,
    {
        self.expanded.contains(&graph.node_index(node))
    }

    /// Frontier size, stale entries included.
    pub fn count_enqueued_nodes(&self) -> usize {
        self.frontier.len()
    }

    pub fn count_expanded_nodes(&self) -> usize {
        self.expanded.len()
    }

    pub fn count_tree_edges(&self) -> usize {
        self.successors.values().map(Vec::len).sum()
    }

    pub fn is_exhausted(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Iterate the recorded `(predecessor, successor)` tree edges.
    pub fn tree_edges(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.successors
            .iter()
            .flat_map(|(&from, children)| children.iter().map(move |&to| (from, to)))
    }

    /// Iterate the pending frontier without draining it. Order is unspecified.
    pub fn frontier(&self) -> impl Iterator<Item = &Expansion<N>> {
        self.frontier.iter()
    }
}

impl<N: Copy + Eq + Hash + BinaryRecord> ShortestPathTree<N> {
    /// Persist root, expanded set, tree edges and frontier.
    ///
    /// Sets and parents are written in index order so equal trees produce
    /// equal streams; each parent's children keep their settle order.
    pub fn save_to<G>(&self, graph: &G, w: &mut dyn Write) -> Result<()>
    where
        G: SearchGraph<Node = N>,
    {
        self.root.write_to(w)?;

        let mut expanded: Vec<NodeIndex> = self.expanded.iter().copied().collect();
        expanded.sort_unstable();
        write_count(w, expanded.len())?;
        for index in expanded {
            write_u32(w, index)?;
        }

        let mut parents: Vec<(NodeIndex, N)> = self
            .successors
            .keys()
            .map(|&n| (graph.node_index(n), n))
            .collect();
        parents.sort_unstable_by_key(|&(index, _)| index);
        write_count(w, self.count_tree_edges())?;
        for (_, parent) in parents {
            for child in self.successors(parent) {
                parent.write_to(w)?;
                child.write_to(w)?;
            }
        }

        write_count(w, self.frontier.len())?;
        for expansion in self.frontier.iter() {
            expansion.node.write_to(w)?;
            expansion.predecessor.write_to(w)?;
            write_f64(w, expansion.distance)?;
        }
        Ok(())
    }

    /// Rebuild a tree written by `save_to`.
    pub fn load_from(r: &mut dyn Read) -> Result<Self> {
        let root = N::read_from(r)?;

        let expanded_count = read_count(r)?;
        let mut expanded = HashSet::with_capacity(expanded_count.min(1 << 20));
        for _ in 0..expanded_count {
            if !expanded.insert(read_u32(r)?) {
                return Err(Error::CorruptStream("duplicate expanded node".into()));
            }
        }

        let edge_count = read_count(r)?;
        let mut successors: HashMap<N, Vec<N>> = HashMap::new();
        for _ in 0..edge_count {
            let from = N::read_from(r)?;
            let to = N::read_from(r)?;
            successors.entry(from).or_default().push(to);
        }

        let frontier_count = read_count(r)?;
        let mut frontier = RadixHeapQueue::new();
        for _ in 0..frontier_count {
            let node = N::read_from(r)?;
            let predecessor = N::read_from(r)?;
            let distance = read_f64(r)?;
            if !(distance >= 0.0) {
                return Err(Error::CorruptStream(format!("frontier distance {distance}")));
            }
            frontier.enqueue(Expansion {
                node,
                predecessor,
                distance,
            });
        }

        Ok(ShortestPathTree {
            root,
            expanded,
            successors,
            frontier,
            last_expanded: None,
            edge_scratch: Vec::new(),
        })
    }
}
