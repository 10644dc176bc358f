pub mod derivative;
pub mod edge_response;
pub mod medialness;
pub mod sampler;

pub use derivative::{DirectionalDerivativeFilter, MultiscaleDerivativeFilter, ScaleResponse};
pub use edge_response::NormalizedEdgeResponse;
pub use medialness::{Medialness, MedialnessFilter, RADIAL_DIRECTIONS};
pub use sampler::{ScalarFieldSampler, VolumeSampler};
