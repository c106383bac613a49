//! Core library for the proxyfleet instance manager.
//!
//! The crate exposes a provider abstraction over the compute instances that
//! run a fleet of forward proxies, plus a Google Compute Engine
//! implementation that lists, creates, starts, and removes them.

pub mod config;
pub mod gce;
pub mod model;
pub mod provider;
pub mod test_support;

pub use config::{ConfigError, GceConfig, PlacementPolicy, RANDOM_REGION};
pub use gce::{GceClient, GceError, GceProvider, PROVIDER_NAME};
pub use model::{InstanceAddress, InstanceModel, LifecycleState};
pub use provider::{CreatedInstance, ErrorKind, Provider, ProviderError, ProviderFuture};
