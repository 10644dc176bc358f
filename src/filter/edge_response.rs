use crate::filter::derivative::MultiscaleDerivativeFilter;
use crate::filter::sampler::ScalarFieldSampler;
use crate::types::{Direction, Position};

/// Normalized rising-edge strength along one radial ray.
///
/// `response(r)` is the negated multiscale derivative at `center + r·direction`,
/// so a bright structure falling off outward gives a positive response. The
/// score at radius `r` is the rise of `response(r)` over the best response at
/// any smaller sampled radius, divided by the largest response on the ray
/// (floored at `min_contrast`). Responses are memoized per radius sample.
#[derive(Debug)]
pub struct NormalizedEdgeResponse<'a, S: ?Sized> {
    sampler: &'a S,
    filter: &'a MultiscaleDerivativeFilter,
    radii: &'a [f64],
    min_contrast: f64,
    center: Position,
    direction: Direction,
    responses: Vec<Option<f64>>,
    ray_max: Option<f64>,
}

impl<'a, S: ScalarFieldSampler + ?Sized> NormalizedEdgeResponse<'a, S> {
    pub fn new(
        sampler: &'a S,
        filter: &'a MultiscaleDerivativeFilter,
        radii: &'a [f64],
        min_contrast: f64,
        center: Position,
        direction: Direction,
    ) -> Self {
        NormalizedEdgeResponse {
            sampler,
            filter,
            radii,
            min_contrast,
            center,
            direction,
            responses: vec![None; radii.len()],
            ray_max: None,
        }
    }

    pub fn radii(&self) -> &[f64] {
        self.radii
    }

    /// Raw response at radius sample `i`.
    pub fn response(&mut self, i: usize) -> f64 {
        if let Some(r) = self.responses[i] {
            return r;
        }
        let position = self.center + self.direction * self.radii[i];
        let r = -self
            .filter
            .response(self.sampler, &position, &self.direction)
            .value;
        self.responses[i] = Some(r);
        r
    }

    /// Largest response over all radius samples, floored at `min_contrast`.
    pub fn max_response(&mut self) -> f64 {
        if let Some(m) = self.ray_max {
            return m;
        }
        let mut m = self.min_contrast;
        for i in 0..self.radii.len() {
            m = m.max(self.response(i));
        }
        self.ray_max = Some(m);
        m
    }

    /// Edge strength in `[0, 1]` at radius sample `i`.
    pub fn score(&mut self, i: usize) -> f64 {
        let r = self.response(i);
        if r <= 0.0 {
            return 0.0;
        }
        // The innermost sample has nothing to rise over.
        let baseline = (0..i)
            .map(|j| self.response(j))
            .reduce(f64::max)
            .unwrap_or(0.0);
        ((r - baseline) / self.max_response()).clamp(0.0, 1.0)
    }
}
