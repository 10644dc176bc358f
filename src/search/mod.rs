pub mod leaf_paths;
pub mod shortest_path_tree;

pub use leaf_paths::{enumerate_leaf_paths, LeafPathEnumerator, TreeAdapter};
pub use shortest_path_tree::{Expansion, ShortestPathTree};
