//! Feature provenance and availability cataloging
//!
//! Provenance is carried internally as structured [`FeatureDescriptor`]
//! records; column-name rendering and parsing live only at the boundary where
//! external model adapters must address columns by name. The
//! [`AvailabilityCatalog`] maps (feature universe, availability level) to the
//! ordered column set known at that point in the quarter.

mod catalog;
mod descriptor;

pub use catalog::AvailabilityCatalog;
pub use descriptor::{AvailabilityLevel, FeatureDescriptor, FeatureUniverse, TransformKind};
