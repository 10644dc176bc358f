use std::fmt::Debug;
use std::hash::Hash;

use crate::types::{EdgeWeight, NodeIndex};
use crate::util::binary::BinaryRecord;

/// Capabilities the shortest-path tree needs from a graph.
///
/// Edges are produced on demand by `expand`; nothing about the graph has to
/// be materialized up front.
pub trait SearchGraph {
    type Node: Copy + Eq + Hash + Debug + BinaryRecord;

    /// Push `(weight, neighbor)` for every edge leaving `node` towards a
    /// neighbor accepted by `reachable`. Each emitted edge is also reported
    /// to `on_radius` as `(node, neighbor, radius)`.
    fn expand(
        &self,
        node: Self::Node,
        reachable: &dyn Fn(Self::Node) -> bool,
        edges: &mut Vec<(EdgeWeight, Self::Node)>,
        on_radius: &mut dyn FnMut(Self::Node, Self::Node, f64),
    );

    fn node_index(&self, node: Self::Node) -> NodeIndex;

    fn node_at_index(&self, index: NodeIndex) -> Self::Node;

    /// Whether `weight(a, b) == weight(b, a)` for every edge.
    fn is_bidirectional(&self) -> bool;
}
