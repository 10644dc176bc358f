use log::debug;

use crate::error::{Error, Result};
use crate::filter::derivative::{DirectionalDerivativeFilter, MultiscaleDerivativeFilter};
use crate::filter::medialness::{Medialness, MedialnessFilter};
use crate::filter::sampler::ScalarFieldSampler;
use crate::graph::search_graph::SearchGraph;
use crate::graph::setup::{EdgeEvaluator, GraphSetup};
use crate::types::*;

/// Default distance between neighbouring grid nodes, in mm.
pub const NODE_SPACING_MM: f64 = 1.0 / 3.0;

/// Offsets of the 26-connected neighbourhood, z-major.
pub const NEIGHBOR_OFFSETS: [[i32; 3]; 26] = {
    let mut out = [[0i32; 3]; 26];
    let mut n = 0;
    let mut dz = -1;
    while dz <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dx = -1;
            while dx <= 1 {
                if !(dx == 0 && dy == 0 && dz == 0) {
                    out[n] = [dx, dy, dz];
                    n += 1;
                }
                dx += 1;
            }
            dy += 1;
        }
        dz += 1;
    }
    out
};

/// Physical placement of the node lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    /// Position of node (0, 0, 0).
    pub origin: Position,
    /// Size of the covered box in mm.
    pub extent: Direction,
    /// Distance between neighbouring nodes in mm.
    pub spacing: f64,
}

impl GridGeometry {
    pub fn new(origin: Position, extent: Direction) -> Self {
        Self::with_spacing(origin, extent, NODE_SPACING_MM)
    }

    pub fn with_spacing(origin: Position, extent: Direction, spacing: f64) -> Self {
        GridGeometry {
            origin,
            extent,
            spacing,
        }
    }

    /// Node count per axis. The far face of the box is included when it
    /// falls on a lattice plane.
    fn grid_size(&self) -> Result<[u32; 3]> {
        if !(self.spacing > 0.0) {
            return Err(Error::InvalidParameter {
                name: "node spacing",
                value: self.spacing,
            });
        }
        let mut size = [0u32; 3];
        for (axis, s) in size.iter_mut().enumerate() {
            let extent = self.extent[axis];
            if !(extent >= 0.0) || !extent.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "grid extent",
                    value: extent,
                });
            }
            let steps = (extent / self.spacing + 1e-9).floor() + 1.0;
            if steps > u32::MAX as f64 {
                return Err(Error::GridTooLarge { nodes: u64::MAX });
            }
            *s = steps as u32;
        }
        let total = size.iter().map(|&s| s as u64).product::<u64>();
        if total > NodeIndex::MAX as u64 + 1 {
            return Err(Error::GridTooLarge { nodes: total });
        }
        Ok(size)
    }
}

/// Graph over a regular 3D lattice whose edge weights are the inverse
/// medialness between 26-connected neighbours, evaluated on demand.
#[derive(Debug)]
pub struct WeightedGraph<S> {
    sampler: S,
    setup: GraphSetup,
    geometry: GridGeometry,
    size: [u32; 3],
    medialness: MedialnessFilter,
}

impl<S: ScalarFieldSampler> WeightedGraph<S> {
    pub fn new(sampler: S, geometry: GridGeometry, setup: GraphSetup) -> Result<Self> {
        if !sampler.is_ready() {
            return Err(Error::SamplerUnavailable);
        }
        let size = geometry.grid_size()?;
        let medialness = build_filter(&setup)?;
        debug!(
            "WeightedGraph: {}x{}x{} nodes at {:.3} mm, evaluator {:?}",
            size[0], size[1], size[2], geometry.spacing, setup.evaluator
        );
        Ok(WeightedGraph {
            sampler,
            setup,
            geometry,
            size,
            medialness,
        })
    }

    /// Swap in a new setup, rebuilding the filters. The grid is unchanged.
    pub fn reconfigure(&mut self, setup: GraphSetup) -> Result<()> {
        self.medialness = build_filter(&setup)?;
        debug!("WeightedGraph: reconfigured, evaluator {:?}", setup.evaluator);
        self.setup = setup;
        Ok(())
    }

    pub fn setup(&self) -> &GraphSetup {
        &self.setup
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn medialness_filter(&self) -> &MedialnessFilter {
        &self.medialness
    }

    pub fn grid_size(&self) -> [u32; 3] {
        self.size
    }

    pub fn node_count(&self) -> u64 {
        self.size.iter().map(|&s| s as u64).product()
    }

    pub fn contains(&self, node: GridNode) -> bool {
        node.x < self.size[0] && node.y < self.size[1] && node.z < self.size[2]
    }

    /// Nearest node to `position`, clamped to the grid.
    pub fn pick_node(&self, position: &Position) -> GridNode {
        let rel = (*position - self.geometry.origin) / self.geometry.spacing;
        let snap = |v: f64, size: u32| -> u32 {
            let r = v.round();
            if r <= 0.0 {
                0
            } else {
                (r as u64).min(size as u64 - 1) as u32
            }
        };
        GridNode {
            x: snap(rel.x, self.size[0]),
            y: snap(rel.y, self.size[1]),
            z: snap(rel.z, self.size[2]),
        }
    }

    pub fn node_position(&self, node: GridNode) -> Position {
        self.geometry.origin
            + Direction::new(node.x as f64, node.y as f64, node.z as f64) * self.geometry.spacing
    }

    pub fn compute_node_index(&self, node: GridNode) -> NodeIndex {
        debug_assert!(self.contains(node), "node {node:?} outside grid");
        node.x + self.size[0] * (node.y + self.size[1] * node.z)
    }

    pub fn fetch_node_by_index(&self, index: NodeIndex) -> GridNode {
        let sx = self.size[0];
        let sy = self.size[1];
        // sx * sy reaches 2^32 on a single-plane grid of full index range.
        let plane = sx as u64 * sy as u64;
        GridNode {
            x: index % sx,
            y: (index / sx) % sy,
            z: (index as u64 / plane) as u32,
        }
    }

    /// Neighbour of `node` at `offset`, if it lies inside the grid.
    pub fn offset_node(&self, node: GridNode, offset: [i32; 3]) -> Option<GridNode> {
        let x = node.x.checked_add_signed(offset[0])?;
        let y = node.y.checked_add_signed(offset[1])?;
        let z = node.z.checked_add_signed(offset[2])?;
        let n = GridNode { x, y, z };
        self.contains(n).then_some(n)
    }

    /// In-grid 26-neighbours of `node`.
    pub fn neighbors(&self, node: GridNode) -> impl Iterator<Item = GridNode> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |&off| self.offset_node(node, off))
    }

    pub fn is_bidirectional(&self) -> bool {
        self.setup.evaluator.is_bidirectional()
    }

    fn early_out_threshold(&self) -> f64 {
        if self.setup.early_out {
            self.setup.min_medialness
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Medialness of the edge `p0 -> p1` and the radius estimate that goes
    /// with it.
    ///
    /// Midpoint and multi-point rules divide by the edge length in node
    /// spacings, so `1 / medialness` is the length-weighted cost of the edge.
    pub fn compute_edge(&self, p0: &Position, p1: &Position) -> Medialness {
        let delta = p1 - p0;
        let length = delta.norm();
        let axis = delta / length;
        let units = length / self.geometry.spacing;
        let threshold = self.early_out_threshold();
        let at = |p: &Position, t: f64| self.medialness.evaluate(&self.sampler, p, &axis, t);

        match self.setup.evaluator {
            EdgeEvaluator::ByDestination => at(p1, threshold),
            EdgeEvaluator::Gaussian => {
                let mid = p0 + delta * 0.5;
                scaled(at(&mid, threshold * units), units)
            }
            EdgeEvaluator::Trapeze => {
                let m0 = at(p0, f64::NEG_INFINITY);
                let m1 = at(p1, f64::NEG_INFINITY);
                scaled(weighted(&[(m0, 0.5), (m1, 0.5)]), units)
            }
            EdgeEvaluator::Simpson => {
                let mid = p0 + delta * 0.5;
                let m0 = at(p0, f64::NEG_INFINITY);
                let mm = at(&mid, f64::NEG_INFINITY);
                let m1 = at(p1, f64::NEG_INFINITY);
                scaled(
                    weighted(&[(m0, 1.0 / 6.0), (mm, 4.0 / 6.0), (m1, 1.0 / 6.0)]),
                    units,
                )
            }
        }
    }
}

impl<S: ScalarFieldSampler> SearchGraph for WeightedGraph<S> {
    type Node = GridNode;

    fn expand(
        &self,
        node: GridNode,
        reachable: &dyn Fn(GridNode) -> bool,
        edges: &mut Vec<(EdgeWeight, GridNode)>,
        on_radius: &mut dyn FnMut(GridNode, GridNode, f64),
    ) {
        let p0 = self.node_position(node);
        for &offset in &NEIGHBOR_OFFSETS {
            let Some(neighbor) = self.offset_node(node, offset) else {
                continue;
            };
            if !reachable(neighbor) {
                continue;
            }
            let m = self.compute_edge(&p0, &self.node_position(neighbor));
            // Non-positive medialness would give an infinite weight.
            if m.value >= self.setup.min_medialness && m.value > 0.0 {
                edges.push((1.0 / m.value, neighbor));
                on_radius(node, neighbor, m.radius);
            }
        }
    }

    fn node_index(&self, node: GridNode) -> NodeIndex {
        self.compute_node_index(node)
    }

    fn node_at_index(&self, index: NodeIndex) -> GridNode {
        self.fetch_node_by_index(index)
    }

    fn is_bidirectional(&self) -> bool {
        self.setup.evaluator.is_bidirectional()
    }
}

fn build_filter(setup: &GraphSetup) -> Result<MedialnessFilter> {
    setup.validate()?;
    let derivative = MultiscaleDerivativeFilter::new(
        DirectionalDerivativeFilter::new(setup.min_hu, setup.max_hu, setup.gamma),
        setup.scales()?,
    );
    Ok(MedialnessFilter::new(derivative, setup.radii()?, setup.min_contrast))
}

fn scaled(m: Medialness, units: f64) -> Medialness {
    if m.is_none() {
        return m;
    }
    Medialness {
        value: m.value / units,
        radius: m.radius,
    }
}

/// Weighted combination of point evaluations; radii are combined with the
/// same weights.
fn weighted(parts: &[(Medialness, f64)]) -> Medialness {
    if parts.iter().any(|(m, _)| m.is_none()) {
        return Medialness::NONE;
    }
    let value = parts.iter().map(|(m, w)| m.value * w).sum();
    let radius = parts.iter().map(|(m, w)| m.radius * w).sum();
    Medialness { value, radius }
}
