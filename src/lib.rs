pub mod error;
pub mod types;
pub mod util;
pub mod filter;
pub mod graph;
pub mod search;
pub mod extraction;

pub use error::{Error, Result};
pub use extraction::VesselExtractionEngine;
pub use graph::{GraphSetup, GridGeometry, WeightedGraph};
