use crate::error::{Error, Result};
use crate::util::linspace::linear_samples;

/// How an edge between two neighbouring nodes is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeEvaluator {
    /// Single evaluation at the destination node. Not symmetric.
    ByDestination,
    /// Single evaluation at the edge midpoint.
    Gaussian,
    /// Average of the two endpoint evaluations.
    Trapeze,
    /// Simpson's rule over both endpoints and the midpoint.
    #[default]
    Simpson,
}

impl EdgeEvaluator {
    pub fn is_bidirectional(self) -> bool {
        !matches!(self, EdgeEvaluator::ByDestination)
    }
}

/// Filter and graph parameters. Immutable once handed to a graph; use
/// `WeightedGraph::reconfigure` to swap in a new setup.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSetup {
    /// Derivative scale range in mm.
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_samples: usize,
    /// Intensity clamp applied before filtering.
    pub min_hu: f64,
    pub max_hu: f64,
    /// Scale normalization exponent.
    pub gamma: f64,
    /// Candidate vessel radius range in mm.
    pub min_radius: f64,
    pub max_radius: f64,
    pub radius_samples: usize,
    /// Floor of the per-ray maximum response used for normalization.
    pub min_contrast: f64,
    pub evaluator: EdgeEvaluator,
    /// Edges scoring below this medialness are not part of the graph.
    pub min_medialness: f64,
    /// Let the medialness filter abandon radii that cannot reach `min_medialness`.
    pub early_out: bool,
}

impl Default for GraphSetup {
    fn default() -> Self {
        GraphSetup {
            min_scale: 0.5,
            max_scale: 3.0,
            scale_samples: 4,
            min_hu: -100.0,
            max_hu: 1000.0,
            gamma: 1.0,
            min_radius: 0.5,
            max_radius: 5.0,
            radius_samples: 10,
            min_contrast: 100.0,
            evaluator: EdgeEvaluator::Simpson,
            min_medialness: 0.1,
            early_out: true,
        }
    }
}

impl GraphSetup {
    /// Check every invariant; graphs call this before building filters.
    pub fn validate(&self) -> Result<()> {
        self.scales()?;
        self.radii()?;
        if !(self.min_scale > 0.0) {
            return Err(Error::InvalidParameter {
                name: "minimum scale",
                value: self.min_scale,
            });
        }
        if !(self.min_radius > 0.0) {
            return Err(Error::InvalidParameter {
                name: "minimum radius",
                value: self.min_radius,
            });
        }
        if !(self.min_hu < self.max_hu) {
            return Err(Error::InvalidRange {
                name: "HU",
                min: self.min_hu,
                max: self.max_hu,
            });
        }
        if !self.gamma.is_finite() {
            return Err(Error::InvalidParameter {
                name: "gamma",
                value: self.gamma,
            });
        }
        if !(self.min_contrast > 0.0) {
            return Err(Error::InvalidParameter {
                name: "minimum contrast",
                value: self.min_contrast,
            });
        }
        if !self.min_medialness.is_finite() {
            return Err(Error::InvalidParameter {
                name: "minimum medialness",
                value: self.min_medialness,
            });
        }
        Ok(())
    }

    pub fn scales(&self) -> Result<Vec<f64>> {
        linear_samples("scale", self.min_scale, self.max_scale, self.scale_samples)
    }

    pub fn radii(&self) -> Result<Vec<f64>> {
        linear_samples("radius", self.min_radius, self.max_radius, self.radius_samples)
    }
}
