use std::f64::consts::PI;

use crate::filter::derivative::MultiscaleDerivativeFilter;
use crate::filter::edge_response::NormalizedEdgeResponse;
use crate::filter::sampler::ScalarFieldSampler;
use crate::types::{Direction, Position};

/// Number of evenly spaced radial rays around the axis.
pub const RADIAL_DIRECTIONS: usize = 8;

/// Medialness score and the radius at which it peaked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medialness {
    pub value: f64,
    pub radius: f64,
}

impl Medialness {
    /// Result when no candidate radius qualified.
    pub const NONE: Medialness = Medialness {
        value: f64::NEG_INFINITY,
        radius: 0.0,
    };

    pub fn is_none(&self) -> bool {
        self.value == f64::NEG_INFINITY
    }
}

/// Aggregates normalized edge responses over `RADIAL_DIRECTIONS` rays
/// perpendicular to an axis and keeps the best mean over candidate radii.
#[derive(Debug, Clone, PartialEq)]
pub struct MedialnessFilter {
    derivative: MultiscaleDerivativeFilter,
    radii: Vec<f64>,
    min_contrast: f64,
}

impl MedialnessFilter {
    /// `radii` must be non-empty and ascending.
    pub fn new(derivative: MultiscaleDerivativeFilter, radii: Vec<f64>, min_contrast: f64) -> Self {
        assert!(!radii.is_empty(), "medialness filter needs at least one radius");
        MedialnessFilter {
            derivative,
            radii,
            min_contrast,
        }
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn derivative(&self) -> &MultiscaleDerivativeFilter {
        &self.derivative
    }

    pub fn min_contrast(&self) -> f64 {
        self.min_contrast
    }

    /// Evaluate medialness at `position` around the unit `axis`.
    ///
    /// A radius whose partial sum plus one per remaining ray cannot reach
    /// `threshold` is abandoned; pass `f64::NEG_INFINITY` to evaluate every
    /// radius. Evaluation stops as soon as the score reaches 1.
    pub fn evaluate<S: ScalarFieldSampler + ?Sized>(
        &self,
        sampler: &S,
        position: &Position,
        axis: &Direction,
        threshold: f64,
    ) -> Medialness {
        let mut rays: Vec<NormalizedEdgeResponse<'_, S>> = radial_directions(axis)
            .into_iter()
            .map(|d| {
                NormalizedEdgeResponse::new(
                    sampler,
                    &self.derivative,
                    &self.radii,
                    self.min_contrast,
                    *position,
                    d,
                )
            })
            .collect();

        let weight = 1.0 / RADIAL_DIRECTIONS as f64;
        let mut best = Medialness::NONE;

        'radii: for (i, &radius) in self.radii.iter().enumerate() {
            let mut sum = 0.0;
            for (k, ray) in rays.iter_mut().enumerate() {
                sum += ray.score(i) * weight;
                let remaining = (RADIAL_DIRECTIONS - k - 1) as f64 * weight;
                if sum + remaining < threshold {
                    continue 'radii;
                }
            }
            if sum > best.value {
                best = Medialness { value: sum, radius };
                if sum >= 1.0 {
                    break;
                }
            }
        }
        best
    }
}

/// `RADIAL_DIRECTIONS` unit vectors perpendicular to `axis`.
///
/// The basis depends only on the line through `axis`, not its sign, so
/// `axis` and `-axis` produce the same rays.
pub fn radial_directions(axis: &Direction) -> [Direction; RADIAL_DIRECTIONS] {
    let axis = canonical_axis(axis);
    let helper = if axis.x.abs() <= axis.y.abs() && axis.x.abs() <= axis.z.abs() {
        Direction::x()
    } else if axis.y.abs() <= axis.z.abs() {
        Direction::y()
    } else {
        Direction::z()
    };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);
    std::array::from_fn(|k| {
        let angle = 2.0 * PI * k as f64 / RADIAL_DIRECTIONS as f64;
        u * angle.cos() + v * angle.sin()
    })
}

fn canonical_axis(axis: &Direction) -> Direction {
    let unit = axis.normalize();
    let flip = if unit.x != 0.0 {
        unit.x < 0.0
    } else if unit.y != 0.0 {
        unit.y < 0.0
    } else {
        unit.z < 0.0
    };
    if flip { -unit } else { unit }
}
