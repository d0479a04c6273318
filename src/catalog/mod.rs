//! Capability catalogue - approved tools, TOML loading, and access policy

mod capability;
mod catalogue;
mod policy;

pub use capability::Capability;
pub use catalogue::{CapabilityCatalogue, StaticCatalogue};
pub use policy::CapabilityPolicy;
