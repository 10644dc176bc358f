pub mod search_graph;
pub mod setup;
pub mod weighted_graph;

pub use search_graph::SearchGraph;
pub use setup::{EdgeEvaluator, GraphSetup};
pub use weighted_graph::{GridGeometry, NODE_SPACING_MM, NEIGHBOR_OFFSETS, WeightedGraph};
