use nalgebra::{Point3, Vector3};

/// Vertex of the search lattice, in node units along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridNode {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridNode {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        GridNode { x, y, z }
    }
}

/// Bijective encoding `x + size_x * y + size_x * size_y * z` of a `GridNode`.
pub type NodeIndex = u32;

/// Continuous position in millimetres.
pub type Position = Point3<f64>;
/// Direction or offset in millimetres.
pub type Direction = Vector3<f64>;

/// Cumulative shortest-path distance.
pub type Distance = f64;
/// Edge cost, `1 / medialness`.
pub type EdgeWeight = f64;

/// Ordered node sequence from a leaf toward the root.
pub type Path<N> = Vec<N>;
