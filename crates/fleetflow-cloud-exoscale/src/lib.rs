//! Exoscale provider for FleetFlow
//!
//! This crate implements the CloudProvider trait for Exoscale, exposing a
//! fixed catalog of resource kinds and data sources backed by the Exoscale
//! v2 API.
//!
//! # Resources
//!
//! - `exoscale_network`: private networks (tags, managed DHCP ranges)
//! - `exoscale_affinity`: anti-affinity groups
//! - `exoscale_domain`: DNS domains
//! - `exoscale_sks_nodepool`: node pools of SKS clusters
//!
//! # Data sources
//!
//! - `exoscale_network`, `exoscale_domain`
//! - `exoscale_instance_pool`, `exoscale_instance_pool_list`
//!
//! # Requirements
//!
//! - `EXOSCALE_API_KEY` and `EXOSCALE_API_SECRET` must be set, or an
//!   [`ExoscaleConfig`] built explicitly
//!
//! # Example
//!
//! ```ignore
//! use fleetflow_cloud_exoscale::{ExoscaleConfig, ExoscaleProvider};
//! use fleetflow_cloud::CloudProvider;
//!
//! let provider = ExoscaleProvider::new(ExoscaleConfig::new(key, secret))?;
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod provider;
pub mod resources;

pub use api::ComputeApi;
pub use client::HttpComputeClient;
pub use config::ExoscaleConfig;
pub use error::{ExoscaleError, Result};
#[cfg(any(test, feature = "testing"))]
pub use mock::MemoryComputeApi;
pub use provider::{ExoscaleProvider, default_registry};
