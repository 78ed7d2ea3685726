//! Managed resource kinds

pub mod affinity;
pub mod domain;
pub mod network;
pub mod sks_nodepool;

pub use affinity::AffinityResource;
pub use domain::DomainResource;
pub use network::NetworkResource;
pub use sks_nodepool::SksNodepoolResource;
