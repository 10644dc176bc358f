use std::collections::HashSet;
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::extraction::centerline::{Centerline, SignificantPath};
use crate::extraction::radius_store::EdgeRadiusStore;
use crate::filter::sampler::ScalarFieldSampler;
use crate::graph::WeightedGraph;
use crate::search::leaf_paths::LeafPathEnumerator;
use crate::search::shortest_path_tree::ShortestPathTree;
use crate::types::*;
use crate::util::binary::{read_f64, write_f64};

/// Default minimum length-to-radius ratio of a significant path.
pub const DEFAULT_LENGTH_TO_RADIUS_RATIO: f64 = 4.0;

/// Cooperative cancellation flag shared with a controlling thread.
///
/// A stepping loop that observes the flag stops before its next step and
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn consume(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// Grows a shortest-path tree over a `WeightedGraph` from a seed node and
/// turns its branches into vessel centerlines.
///
/// While open, every call that advances the tree refreshes the significant
/// paths. `close` drops the tree for good and prunes the radius store down to
/// edges touching a significant path.
pub struct VesselExtractionEngine<'g, S> {
    graph: &'g WeightedGraph<S>,
    tree: Option<ShortestPathTree<GridNode>>,
    radii: EdgeRadiusStore<GridNode>,
    min_length_to_radius_ratio: f64,
    significant: Vec<SignificantPath>,
    max_path_length: f64,
    cancel: CancelToken,
    verbose: bool,
}

impl<'g, S: ScalarFieldSampler> VesselExtractionEngine<'g, S> {
    pub fn new(graph: &'g WeightedGraph<S>, root: GridNode, min_length_to_radius_ratio: f64) -> Result<Self> {
        if !graph.contains(root) {
            return Err(Error::NodeOutOfBounds(root));
        }
        check_ratio(min_length_to_radius_ratio)?;
        debug!("VesselExtractionEngine: opened at {root:?}");
        Ok(Self::from_parts(
            graph,
            ShortestPathTree::new(root),
            EdgeRadiusStore::new(graph.is_bidirectional()),
            min_length_to_radius_ratio,
        ))
    }

    /// Open at the node nearest to `position`.
    pub fn open_at(graph: &'g WeightedGraph<S>, position: &Position, min_length_to_radius_ratio: f64) -> Result<Self> {
        Self::new(graph, graph.pick_node(position), min_length_to_radius_ratio)
    }

    fn from_parts(
        graph: &'g WeightedGraph<S>,
        tree: ShortestPathTree<GridNode>,
        radii: EdgeRadiusStore<GridNode>,
        min_length_to_radius_ratio: f64,
    ) -> Self {
        VesselExtractionEngine {
            graph,
            tree: Some(tree),
            radii,
            min_length_to_radius_ratio,
            significant: Vec::new(),
            max_path_length: 0.0,
            cancel: CancelToken::default(),
            verbose: false,
        }
    }

    // ---------------------------------------------------------------
    // State
    // ---------------------------------------------------------------

    pub fn graph(&self) -> &'g WeightedGraph<S> {
        self.graph
    }

    pub fn is_open(&self) -> bool {
        self.tree.is_some()
    }

    pub fn tree(&self) -> Option<&ShortestPathTree<GridNode>> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<GridNode> {
        self.tree.as_ref().map(ShortestPathTree::root)
    }

    pub fn radius_store(&self) -> &EdgeRadiusStore<GridNode> {
        &self.radii
    }

    pub fn significant_paths(&self) -> &[SignificantPath] {
        &self.significant
    }

    /// Longest candidate path seen by the last `fetch_centerlines`, before
    /// overlap truncation.
    pub fn max_path_length(&self) -> f64 {
        self.max_path_length
    }

    pub fn min_length_to_radius_ratio(&self) -> f64 {
        self.min_length_to_radius_ratio
    }

    /// Takes effect at the next `fetch_centerlines`.
    pub fn set_min_length_to_radius_ratio(&mut self, ratio: f64) -> Result<()> {
        check_ratio(ratio)?;
        self.min_length_to_radius_ratio = ratio;
        Ok(())
    }

    /// Emit a `trace!` line for every settled node.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn count_expanded_nodes(&self) -> usize {
        self.tree.as_ref().map_or(0, ShortestPathTree::count_expanded_nodes)
    }

    pub fn count_enqueued_nodes(&self) -> usize {
        self.tree.as_ref().map_or(0, ShortestPathTree::count_enqueued_nodes)
    }

    // ---------------------------------------------------------------
    // Stepping
    // ---------------------------------------------------------------

    fn step(&mut self) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        let radii = &mut self.radii;
        let advanced = tree.next(self.graph, &mut |from, to, radius| {
            radii.put_radius(from, to, radius);
        });
        if advanced && self.verbose {
            if let Some(e) = tree.last_expanded() {
                trace!(
                    "VesselExtractionEngine: settled {:?} from {:?} at {:.4} ({} pending)",
                    e.node,
                    e.predecessor,
                    e.distance,
                    tree.count_enqueued_nodes()
                );
            }
        }
        advanced
    }

    /// Perform one tree step. Returns whether the tree advanced.
    pub fn do_next(&mut self) -> bool {
        let advanced = self.step();
        if advanced {
            self.fetch_centerlines();
        }
        advanced
    }

    /// Perform up to `n` steps, stopping early on exhaustion or cancellation.
    /// Returns the number of steps taken.
    pub fn do_up_to(&mut self, n: usize) -> usize {
        self.run(Some(n), |_, _| {})
    }

    /// Step until the tree is exhausted or the engine is canceled.
    pub fn do_all(&mut self) -> usize {
        self.run(None, |_, _| {})
    }

    /// Like `do_all`, reporting `(expanded, enqueued)` after every step.
    pub fn do_all_with_progress(&mut self, progress: impl FnMut(usize, usize)) -> usize {
        self.run(None, progress)
    }

    fn run(&mut self, limit: Option<usize>, mut progress: impl FnMut(usize, usize)) -> usize {
        let mut steps = 0usize;
        while limit.is_none_or(|n| steps < n) {
            if self.cancel.consume() {
                debug!("VesselExtractionEngine: canceled after {steps} steps");
                break;
            }
            if !self.step() {
                break;
            }
            steps += 1;
            progress(self.count_expanded_nodes(), self.count_enqueued_nodes());
        }
        if steps > 0 {
            self.fetch_centerlines();
        }
        steps
    }

    // ---------------------------------------------------------------
    // Centerlines
    // ---------------------------------------------------------------

    fn path_length(&self, path: &[GridNode]) -> f64 {
        path.windows(2)
            .map(|w| (self.graph.node_position(w[1]) - self.graph.node_position(w[0])).norm())
            .sum()
    }

    /// Mean radius over the edges of a leaf-to-root path. Tree edges run
    /// parent to child, which is the direction radii were recorded in.
    fn mean_radius(&self, path: &[GridNode]) -> f64 {
        let edges = path.len().saturating_sub(1);
        if edges == 0 {
            return 0.0;
        }
        let total: f64 = path.windows(2).map(|w| self.radii.radius(w[1], w[0])).sum();
        total / edges as f64
    }

    /// Rebuild the significant paths from the current tree.
    ///
    /// Paths are taken longest first. A path that runs into a node claimed by
    /// a longer path ends just before that node, so significant paths never
    /// share a node. What remains is kept if it has at least two nodes and
    /// its length exceeds `min_length_to_radius_ratio` times its mean radius.
    pub fn fetch_centerlines(&mut self) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };

        let mut candidates: Vec<(f64, Path<GridNode>)> = LeafPathEnumerator::new(tree)
            .into_paths()
            .into_iter()
            .filter(|p| p.len() >= 2)
            .map(|p| (self.path_length(&p), p))
            .collect();
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut claimed: HashSet<NodeIndex> = HashSet::new();
        let mut significant = Vec::new();
        let mut max_path_length = 0.0f64;

        for (length, mut path) in candidates {
            max_path_length = max_path_length.max(length);
            if let Some(i) = path
                .iter()
                .position(|&n| claimed.contains(&self.graph.compute_node_index(n)))
            {
                path.truncate(i);
            }
            claimed.extend(path.iter().map(|&n| self.graph.compute_node_index(n)));
            if path.len() < 2 {
                continue;
            }

            let length = self.path_length(&path);
            let mean_radius = self.mean_radius(&path);
            if length / mean_radius > self.min_length_to_radius_ratio {
                significant.push(SignificantPath {
                    nodes: path.iter().map(|&n| self.graph.compute_node_index(n)).collect(),
                    length,
                    mean_radius,
                });
            }
        }

        debug!(
            "VesselExtractionEngine: {} significant paths, longest candidate {:.2} mm",
            significant.len(),
            max_path_length
        );
        self.significant = significant;
        self.max_path_length = max_path_length;
    }

    /// One polyline per significant path, leaf first.
    pub fn create_centerlines(&self) -> Vec<Centerline> {
        self.significant
            .iter()
            .map(|p| Centerline {
                points: p
                    .nodes
                    .iter()
                    .map(|&i| self.graph.node_position(self.graph.fetch_node_by_index(i)))
                    .collect(),
                length: p.length,
                mean_radius: p.mean_radius,
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Lifecycle and persistence
    // ---------------------------------------------------------------

    /// Drop the live tree and prune radii of edges that touch no significant
    /// path. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.tree.take().is_none() {
            return;
        }
        let keep: HashSet<NodeIndex> = self
            .significant
            .iter()
            .flat_map(|p| p.nodes.iter().copied())
            .collect();
        let graph = self.graph;
        let removed = self.radii.remove_radiuses(|from, to| {
            !keep.contains(&graph.compute_node_index(from)) && !keep.contains(&graph.compute_node_index(to))
        });
        debug!(
            "VesselExtractionEngine: closed, pruned {removed} radii, kept {}",
            self.radii.len()
        );
    }

    /// Write the ratio threshold, the tree and the radius store.
    pub fn save_to(&self, w: &mut dyn Write) -> Result<()> {
        let tree = self.tree.as_ref().ok_or(Error::EngineClosed)?;
        write_f64(w, self.min_length_to_radius_ratio)?;
        tree.save_to(self.graph, w)?;
        self.radii.save_to(w)
    }

    /// Reopen an engine written by `save_to` over the same graph. Call
    /// `fetch_centerlines` to rebuild the significant paths.
    pub fn load_from(graph: &'g WeightedGraph<S>, r: &mut dyn Read) -> Result<Self> {
        let ratio = read_f64(r)?;
        if !(ratio >= 0.0) {
            return Err(Error::CorruptStream(format!("length to radius ratio {ratio}")));
        }
        let tree = ShortestPathTree::load_from(r)?;
        if !graph.contains(tree.root()) {
            return Err(Error::NodeOutOfBounds(tree.root()));
        }
        let radii = EdgeRadiusStore::load_from(r, graph.is_bidirectional())?;
        debug!(
            "VesselExtractionEngine: loaded {} expanded, {} pending, {} radii",
            tree.count_expanded_nodes(),
            tree.count_enqueued_nodes(),
            radii.len()
        );
        Ok(Self::from_parts(graph, tree, radii, ratio))
    }
}

fn check_ratio(ratio: f64) -> Result<()> {
    if !(ratio >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "length to radius ratio",
            value: ratio,
        });
    }
    Ok(())
}
