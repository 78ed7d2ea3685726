//! FleetFlow Cloud Provisioning
//!
//! This crate provides the provider-independent half of FleetFlow's
//! declarative cloud provisioning: attribute schemas, the per-resource
//! state accessor, the generic lifecycle reconciler, planning and the
//! persisted state file.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               fleet-provision CLI                │
//! │        (plan / apply / destroy / import)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               fleetflow-cloud                    │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │   Planner    │  │  State Mgmt  │             │
//! │  └──────┬───────┘  └──────────────┘             │
//! │  ┌──────▼───────────────────────────────────┐   │
//! │  │  trait CloudProvider + Registry          │   │
//! │  │  Reconciler<K: ResourceKind>             │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │   exoscale    │
//!           │   provider    │
//!           └───────────────┘
//! ```

pub mod action;
pub mod data;
pub mod error;
pub mod lookup;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod registry;
pub mod schema;
pub mod state;
pub mod tags;
pub mod zone;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use data::{DEFAULT_TIMEOUT, Operation, ResourceData, Timeouts};
pub use error::{ApiErrorKind, CloudError, Result};
pub use lookup::{Selector, find_unique};
pub use planner::Planner;
pub use provider::{AuthStatus, CloudProvider, ResourceConfig, ResourceSet, parse_address};
pub use reconciler::{DataSource, Lifecycle, Reconciler, ResourceKind, read_data_source};
pub use registry::Registry;
pub use schema::{Attribute, AttributeType, Check, Schema};
pub use state::{GlobalState, ResourceState, ResourceStatus, StateLock, StateManager};
pub use tags::{TagPatch, Tags, diff_tags};
pub use zone::{Zone, ZoneDirectory, resolve_zone, search_zones};
