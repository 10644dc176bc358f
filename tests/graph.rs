use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vesseltrace::filter::{ScalarFieldSampler, VolumeSampler};
use vesseltrace::graph::*;
use vesseltrace::types::{Direction, GridNode, Position};
use vesseltrace::Error;

type Field = fn(&Position) -> f64;

/// Bright tube of radius 1 mm along x through (y, z) = (1.5, 1.5).
fn tube(p: &Position) -> f64 {
    let rho = ((p.y - 1.5).powi(2) + (p.z - 1.5).powi(2)).sqrt();
    500.0 / (1.0 + ((rho - 1.0) / 0.1).exp())
}

fn flat(_: &Position) -> f64 {
    200.0
}

fn small_setup(evaluator: EdgeEvaluator) -> GraphSetup {
    GraphSetup {
        min_scale: 0.5,
        max_scale: 1.0,
        scale_samples: 2,
        min_hu: 0.0,
        max_hu: 1000.0,
        gamma: 1.0,
        min_radius: 0.5,
        max_radius: 2.0,
        radius_samples: 4,
        min_contrast: 50.0,
        evaluator,
        min_medialness: 0.1,
        early_out: true,
    }
}

fn tube_geometry() -> GridGeometry {
    GridGeometry::with_spacing(Position::origin(), Direction::new(4.0, 3.0, 3.0), 0.5)
}

fn make_graph(field: Field, evaluator: EdgeEvaluator) -> WeightedGraph<Field> {
    WeightedGraph::new(field, tube_geometry(), small_setup(evaluator)).unwrap()
}

#[derive(Debug)]
struct NotLoaded;

impl ScalarFieldSampler for NotLoaded {
    fn value_at(&self, _: &Position) -> f64 {
        0.0
    }

    fn is_ready(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Grid layout
// ---------------------------------------------------------------------------

#[test]
fn grid_size_includes_far_face() {
    let g = make_graph(flat, EdgeEvaluator::ByDestination);
    assert_eq!(g.grid_size(), [9, 7, 7]);
    assert_eq!(g.node_count(), 441);
    assert!(g.contains(GridNode::new(8, 6, 6)));
    assert!(!g.contains(GridNode::new(9, 0, 0)));
    assert!(!g.contains(GridNode::new(0, 7, 0)));
}

#[test]
fn default_node_spacing() {
    let geometry = GridGeometry::new(Position::origin(), Direction::new(1.0, 2.0, 0.0));
    assert_eq!(geometry.spacing, NODE_SPACING_MM);
    let g = WeightedGraph::new(flat as Field, geometry, GraphSetup::default()).unwrap();
    assert_eq!(g.grid_size(), [4, 7, 1]);
}

#[test]
fn node_index_is_a_bijection() {
    let g = make_graph(flat, EdgeEvaluator::ByDestination);
    let mut seen = HashSet::new();
    for z in 0..7 {
        for y in 0..7 {
            for x in 0..9 {
                let n = GridNode::new(x, y, z);
                let i = g.compute_node_index(n);
                assert!((i as u64) < g.node_count());
                assert!(seen.insert(i), "index {i} reused");
                assert_eq!(g.fetch_node_by_index(i), n);
            }
        }
    }
    assert_eq!(g.compute_node_index(GridNode::new(1, 2, 3)), 1 + 9 * (2 + 7 * 3));
}

#[test]
fn node_index_round_trip_on_large_grid() {
    let geometry = GridGeometry::with_spacing(Position::origin(), Direction::new(100.0, 80.0, 60.0), 0.5);
    let g = WeightedGraph::new(flat as Field, geometry, GraphSetup::default()).unwrap();
    let [sx, sy, sz] = g.grid_size();
    assert_eq!([sx, sy, sz], [201, 161, 121]);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..2000 {
        let n = GridNode::new(rng.gen_range(0..sx), rng.gen_range(0..sy), rng.gen_range(0..sz));
        assert_eq!(g.fetch_node_by_index(g.compute_node_index(n)), n);
    }
}

#[test]
fn node_index_on_full_range_plane() {
    // 65536 x 65536 x 1 nodes: exactly the index range.
    let geometry = GridGeometry::with_spacing(Position::origin(), Direction::new(65535.0, 65535.0, 0.0), 1.0);
    let g = WeightedGraph::new(flat as Field, geometry, GraphSetup::default()).unwrap();
    assert_eq!(g.grid_size(), [65536, 65536, 1]);
    assert_eq!(g.node_count(), 1u64 << 32);

    let last = GridNode::new(65535, 65535, 0);
    assert_eq!(g.compute_node_index(last), u32::MAX);
    assert_eq!(g.fetch_node_by_index(u32::MAX), last);
    assert_eq!(g.fetch_node_by_index(0), GridNode::new(0, 0, 0));
    assert_eq!(g.fetch_node_by_index(65536 * 7 + 3), GridNode::new(3, 7, 0));
}

#[test]
fn oversized_grid_is_rejected() {
    let geometry = GridGeometry::new(Position::origin(), Direction::new(1e4, 1e4, 1e4));
    assert!(matches!(
        WeightedGraph::new(flat as Field, geometry, GraphSetup::default()),
        Err(Error::GridTooLarge { .. })
    ));
}

#[test]
fn bad_geometry_is_rejected() {
    let zero_spacing = GridGeometry::with_spacing(Position::origin(), Direction::new(1.0, 1.0, 1.0), 0.0);
    assert!(matches!(
        WeightedGraph::new(flat as Field, zero_spacing, GraphSetup::default()),
        Err(Error::InvalidParameter { name: "node spacing", .. })
    ));
    let negative = GridGeometry::new(Position::origin(), Direction::new(1.0, -1.0, 1.0));
    assert!(matches!(
        WeightedGraph::new(flat as Field, negative, GraphSetup::default()),
        Err(Error::InvalidParameter { name: "grid extent", .. })
    ));
}

#[test]
fn pick_node_rounds_and_clamps() {
    let g = make_graph(flat, EdgeEvaluator::ByDestination);
    assert_eq!(g.pick_node(&Position::new(0.74, 0.76, 1.24)), GridNode::new(1, 2, 2));
    assert_eq!(g.pick_node(&Position::new(-5.0, 100.0, 1.5)), GridNode::new(0, 6, 3));
    assert_eq!(g.pick_node(&g.node_position(GridNode::new(5, 4, 3))), GridNode::new(5, 4, 3));
}

#[test]
fn node_position_honours_origin() {
    let geometry = GridGeometry::with_spacing(Position::new(10.0, -2.0, 0.5), Direction::new(2.0, 2.0, 2.0), 0.5);
    let g = WeightedGraph::new(flat as Field, geometry, GraphSetup::default()).unwrap();
    assert_eq!(g.node_position(GridNode::new(2, 3, 4)), Position::new(11.0, -0.5, 2.5));
    assert_eq!(g.pick_node(&Position::new(11.0, -0.5, 2.5)), GridNode::new(2, 3, 4));
}

#[test]
fn neighbor_offsets_are_z_major_and_complete() {
    assert_eq!(NEIGHBOR_OFFSETS.len(), 26);
    assert_eq!(NEIGHBOR_OFFSETS[0], [-1, -1, -1]);
    assert_eq!(NEIGHBOR_OFFSETS[25], [1, 1, 1]);
    assert!(NEIGHBOR_OFFSETS[..9].iter().all(|o| o[2] == -1));
    assert!(NEIGHBOR_OFFSETS[17..].iter().all(|o| o[2] == 1));
    let unique: HashSet<[i32; 3]> = NEIGHBOR_OFFSETS.iter().copied().collect();
    assert_eq!(unique.len(), 26);
    assert!(!unique.contains(&[0, 0, 0]));
}

#[test]
fn neighbors_respect_grid_bounds() {
    let g = make_graph(flat, EdgeEvaluator::ByDestination);
    assert_eq!(g.neighbors(GridNode::new(0, 0, 0)).count(), 7);
    assert_eq!(g.neighbors(GridNode::new(4, 3, 0)).count(), 17);
    assert_eq!(g.neighbors(GridNode::new(4, 3, 3)).count(), 26);
    assert_eq!(g.neighbors(GridNode::new(8, 6, 6)).count(), 7);
    assert_eq!(g.offset_node(GridNode::new(0, 2, 2), [-1, 0, 0]), None);
    assert_eq!(g.offset_node(GridNode::new(0, 2, 2), [1, -1, 0]), Some(GridNode::new(1, 1, 2)));
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn default_setup_is_valid() {
    let setup = GraphSetup::default();
    setup.validate().unwrap();
    assert_eq!(setup.evaluator, EdgeEvaluator::Simpson);
    assert_eq!(setup.scales().unwrap().len(), 4);
    let radii = setup.radii().unwrap();
    assert_eq!(radii.len(), 10);
    assert_eq!(radii[0], 0.5);
    assert_eq!(radii[9], 5.0);
}

#[test]
fn invalid_setups_are_rejected() {
    let base = small_setup(EdgeEvaluator::Simpson);

    let s = GraphSetup { min_scale: 2.0, ..base.clone() };
    assert!(matches!(s.validate(), Err(Error::InvalidRange { name: "scale", .. })));

    let s = GraphSetup { radius_samples: 1, ..base.clone() };
    assert!(matches!(s.validate(), Err(Error::InvalidSampleCount { name: "radius", count: 1 })));

    let s = GraphSetup { min_scale: 0.0, ..base.clone() };
    assert!(matches!(s.validate(), Err(Error::InvalidParameter { name: "minimum scale", .. })));

    let s = GraphSetup { min_hu: 1000.0, ..base.clone() };
    assert!(matches!(s.validate(), Err(Error::InvalidRange { name: "HU", .. })));

    let s = GraphSetup { min_contrast: 0.0, ..base.clone() };
    assert!(matches!(s.validate(), Err(Error::InvalidParameter { name: "minimum contrast", .. })));

    let s = GraphSetup { gamma: f64::NAN, ..base.clone() };
    assert!(matches!(s.validate(), Err(Error::InvalidParameter { name: "gamma", .. })));

    let s = GraphSetup { min_radius: 3.0, ..base };
    assert!(WeightedGraph::new(flat as Field, tube_geometry(), s).is_err());
}

#[test]
fn sampler_must_be_ready() {
    assert!(matches!(
        WeightedGraph::new(NotLoaded, tube_geometry(), GraphSetup::default()),
        Err(Error::SamplerUnavailable)
    ));

    let empty = VolumeSampler::new(Vec::new(), [0, 0, 0], Direction::new(1.0, 1.0, 1.0), Position::origin()).unwrap();
    assert!(matches!(
        WeightedGraph::new(empty, tube_geometry(), GraphSetup::default()),
        Err(Error::SamplerUnavailable)
    ));
}

#[test]
fn bidirectionality_follows_evaluator() {
    assert!(!EdgeEvaluator::ByDestination.is_bidirectional());
    assert!(EdgeEvaluator::Gaussian.is_bidirectional());
    assert!(EdgeEvaluator::Trapeze.is_bidirectional());
    assert!(EdgeEvaluator::Simpson.is_bidirectional());

    let g = make_graph(flat, EdgeEvaluator::ByDestination);
    assert!(!SearchGraph::is_bidirectional(&g));
    let g = make_graph(flat, EdgeEvaluator::Trapeze);
    assert!(SearchGraph::is_bidirectional(&g));
}

#[test]
fn reconfigure_swaps_setup() {
    let mut g = make_graph(flat, EdgeEvaluator::ByDestination);
    g.reconfigure(small_setup(EdgeEvaluator::Gaussian)).unwrap();
    assert_eq!(g.setup().evaluator, EdgeEvaluator::Gaussian);
    assert!(g.is_bidirectional());
    assert_eq!(g.grid_size(), [9, 7, 7]);

    // A rejected setup leaves the previous one in place.
    let bad = GraphSetup { max_hu: -500.0, ..small_setup(EdgeEvaluator::Simpson) };
    assert!(g.reconfigure(bad).is_err());
    assert_eq!(g.setup().evaluator, EdgeEvaluator::Gaussian);

    let radii = GraphSetup { radius_samples: 6, ..small_setup(EdgeEvaluator::Gaussian) };
    g.reconfigure(radii).unwrap();
    assert_eq!(g.medialness_filter().radii().len(), 6);
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

fn expand_all(g: &WeightedGraph<Field>, node: GridNode) -> (Vec<(f64, GridNode)>, Vec<(GridNode, GridNode, f64)>) {
    let mut edges = Vec::new();
    let mut radii = Vec::new();
    g.expand(node, &|_: GridNode| true, &mut edges, &mut |a: GridNode, b: GridNode, r: f64| {
        radii.push((a, b, r))
    });
    (edges, radii)
}

#[test]
fn flat_field_has_no_edges() {
    for evaluator in [EdgeEvaluator::ByDestination, EdgeEvaluator::Gaussian, EdgeEvaluator::Simpson] {
        let g = make_graph(flat, evaluator);
        let (edges, radii) = expand_all(&g, GridNode::new(4, 3, 3));
        assert!(edges.is_empty(), "{evaluator:?}");
        assert!(radii.is_empty(), "{evaluator:?}");
    }
}

#[test]
fn tube_axis_edges_exist() {
    let g = make_graph(tube, EdgeEvaluator::ByDestination);
    let root = GridNode::new(0, 3, 3);
    let (edges, radii) = expand_all(&g, root);
    assert!(!edges.is_empty());
    assert_eq!(edges.len(), radii.len());

    let along = GridNode::new(1, 3, 3);
    let (w, _) = edges.iter().find(|(_, n)| *n == along).copied().unwrap();
    assert!(w >= 1.0 && w < 2.0, "weight {w}");

    let setup_radii = g.setup().radii().unwrap();
    for ((_, to), (from, rto, r)) in edges.iter().zip(&radii) {
        assert_eq!(*from, root);
        assert_eq!(to, rto);
        assert!(setup_radii.contains(r));
    }
}

#[test]
fn expand_skips_unreachable_neighbors() {
    let g = make_graph(tube, EdgeEvaluator::ByDestination);
    let blocked = GridNode::new(1, 3, 3);
    let mut edges = Vec::new();
    g.expand(GridNode::new(0, 3, 3), &|n: GridNode| n != blocked, &mut edges, &mut |_, _, _| {});
    assert!(!edges.is_empty());
    assert!(edges.iter().all(|(_, n)| *n != blocked));
}

#[test]
fn edge_weights_are_inverse_medialness() {
    let g = make_graph(tube, EdgeEvaluator::Gaussian);
    let a = GridNode::new(3, 3, 3);
    let (edges, _) = expand_all(&g, a);
    for (w, b) in edges {
        let m = g.compute_edge(&g.node_position(a), &g.node_position(b));
        assert_eq!(w, 1.0 / m.value);
        assert!(m.value >= g.setup().min_medialness);
    }
}

#[test]
fn symmetric_evaluators_score_both_directions_alike() {
    for evaluator in [EdgeEvaluator::Gaussian, EdgeEvaluator::Trapeze, EdgeEvaluator::Simpson] {
        let g = make_graph(tube, evaluator);
        for (a, b) in [
            (GridNode::new(2, 3, 3), GridNode::new(3, 3, 3)),
            (GridNode::new(2, 2, 3), GridNode::new(3, 3, 4)),
            (GridNode::new(5, 4, 2), GridNode::new(5, 5, 2)),
        ] {
            let pa = g.node_position(a);
            let pb = g.node_position(b);
            let forward = g.compute_edge(&pa, &pb);
            let backward = g.compute_edge(&pb, &pa);
            if forward.is_none() {
                assert!(backward.is_none(), "{evaluator:?} {a:?} {b:?}");
                continue;
            }
            assert!((forward.value - backward.value).abs() < 1e-12, "{evaluator:?} {a:?} {b:?}");
            assert!((forward.radius - backward.radius).abs() < 1e-12);
        }
    }
}

#[test]
fn longer_edges_cost_more() {
    // Multi-point rules divide by edge length in node spacings.
    let g = make_graph(tube, EdgeEvaluator::Trapeze);
    let a = GridNode::new(4, 3, 3);
    let straight = g.compute_edge(&g.node_position(a), &g.node_position(GridNode::new(5, 3, 3)));
    let unscaled = {
        let f = g.medialness_filter();
        let axis = Direction::x();
        let m0 = f.evaluate(g.sampler(), &g.node_position(a), &axis, f64::NEG_INFINITY);
        let m1 = f.evaluate(g.sampler(), &g.node_position(GridNode::new(5, 3, 3)), &axis, f64::NEG_INFINITY);
        0.5 * m0.value + 0.5 * m1.value
    };
    assert!((straight.value - unscaled).abs() < 1e-12);

    let diagonal = g.compute_edge(&g.node_position(a), &g.node_position(GridNode::new(5, 4, 4)));
    assert!(diagonal.value < straight.value);
}
