use crate::types::{NodeIndex, Position};

/// A vessel branch kept after overlap pruning and the plausibility filter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignificantPath {
    /// Node indices from the leaf toward the root.
    pub nodes: Vec<NodeIndex>,
    /// Polyline length in mm.
    pub length: f64,
    /// Mean edge radius in mm.
    pub mean_radius: f64,
}

/// Polyline handed to a renderer, one per significant path.
#[derive(Debug, Clone, PartialEq)]
pub struct Centerline {
    pub points: Vec<Position>,
    pub length: f64,
    pub mean_radius: f64,
}
