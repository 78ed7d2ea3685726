//! Read-only lookups

pub mod domain;
pub mod instance_pool;
pub mod network;

pub use domain::DomainLookup;
pub use instance_pool::{InstancePoolList, InstancePoolLookup};
pub use network::NetworkLookup;
