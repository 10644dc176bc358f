pub mod centerline;
pub mod engine;
pub mod radius_store;

pub use centerline::{Centerline, SignificantPath};
pub use engine::{CancelToken, DEFAULT_LENGTH_TO_RADIUS_RATIO, VesselExtractionEngine};
pub use radius_store::{EdgeRadiusStore, RadiusRecord};
