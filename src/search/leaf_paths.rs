use std::cell::OnceCell;
use std::hash::Hash;

use crate::search::shortest_path_tree::ShortestPathTree;
use crate::types::Path;

/// Read-only view of a rooted tree.
pub trait TreeAdapter {
    type Node: Copy;

    fn root(&self) -> Self::Node;
    fn children(&self, node: Self::Node) -> &[Self::Node];
}

impl<N: Copy + Eq + Hash> TreeAdapter for ShortestPathTree<N> {
    type Node = N;

    fn root(&self) -> N {
        ShortestPathTree::root(self)
    }

    fn children(&self, node: N) -> &[N] {
        self.successors(node)
    }
}

/// All root-to-leaf paths of a tree, computed on first access.
///
/// Each path is ordered from its leaf toward the root.
pub struct LeafPathEnumerator<'t, T: TreeAdapter> {
    tree: &'t T,
    paths: OnceCell<Vec<Path<T::Node>>>,
}

impl<'t, T: TreeAdapter> LeafPathEnumerator<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        LeafPathEnumerator {
            tree,
            paths: OnceCell::new(),
        }
    }

    pub fn paths(&self) -> &[Path<T::Node>] {
        self.paths.get_or_init(|| enumerate_leaf_paths(self.tree))
    }

    pub fn into_paths(self) -> Vec<Path<T::Node>> {
        let tree = self.tree;
        self.paths
            .into_inner()
            .unwrap_or_else(|| enumerate_leaf_paths(tree))
    }
}

/// Depth-first walk with an explicit stack, so depth is bounded by memory
/// rather than the call stack.
///
/// At a branch point the path so far is cloned for every child after the
/// first; the first child extends the original.
pub fn enumerate_leaf_paths<T: TreeAdapter>(tree: &T) -> Vec<Path<T::Node>> {
    let mut completed = Vec::new();
    let mut stack: Vec<Path<T::Node>> = vec![vec![tree.root()]];

    while let Some(mut path) = stack.pop() {
        let Some(&tip) = path.last() else {
            continue;
        };
        match tree.children(tip).split_first() {
            None => {
                path.reverse();
                completed.push(path);
            }
            Some((&first, rest)) => {
                for &child in rest {
                    let mut branch = path.clone();
                    branch.push(child);
                    stack.push(branch);
                }
                path.push(first);
                stack.push(path);
            }
        }
    }
    completed
}
