//! Google Compute Engine implementation of the provider contract.

pub mod api;
mod auth;
mod client;
mod control;
mod create;
mod error;
mod fetch;
pub mod status;
mod zone;

use crate::config::{GceConfig, PlacementPolicy};
use crate::model::InstanceModel;
use crate::provider::{CreatedInstance, Provider, ProviderFuture};
use api::ComputeApi;

pub use client::GceClient;
pub use error::GceError;

/// Tag identifying models produced by this provider.
pub const PROVIDER_NAME: &str = "gcloudcompute";

/// Provider that manages proxy instances through the Compute Engine API.
#[derive(Clone, Debug)]
pub struct GceProvider<C = GceClient> {
    api: C,
    config: GceConfig,
    placement: PlacementPolicy,
    instance_port: u16,
}

impl GceProvider<GceClient> {
    /// Constructs a provider backed by the Compute Engine REST API.
    ///
    /// # Errors
    ///
    /// Returns [`GceError::Config`] when the configuration fails validation,
    /// `instance_port` is zero, or the service account key is malformed.
    pub fn new(config: GceConfig, instance_port: u16) -> Result<Self, GceError> {
        Self::check(&config, instance_port)?;
        let api = GceClient::new(&config)?;
        Ok(Self::assemble(config, instance_port, api))
    }
}

impl<C: ComputeApi> GceProvider<C> {
    fn check(config: &GceConfig, instance_port: u16) -> Result<(), GceError> {
        config.validate()?;
        if instance_port == 0 {
            return Err(GceError::Config(String::from(
                "missing instance port: the proxy listening port must be non-zero",
            )));
        }
        Ok(())
    }

    /// Constructs a provider on top of an arbitrary [`ComputeApi`].
    ///
    /// # Errors
    ///
    /// Returns [`GceError::Config`] when the configuration fails validation
    /// or `instance_port` is zero.
    pub fn with_api(config: GceConfig, instance_port: u16, api: C) -> Result<Self, GceError> {
        Self::check(&config, instance_port)?;
        Ok(Self::assemble(config, instance_port, api))
    }

    fn assemble(config: GceConfig, instance_port: u16, api: C) -> Self {
        let placement = config.placement();
        Self {
            api,
            config,
            placement,
            instance_port,
        }
    }

    /// Returns the configuration the provider was built with.
    #[must_use]
    pub const fn config(&self) -> &GceConfig {
        &self.config
    }

    /// Returns the placement policy derived from the configured region.
    #[must_use]
    pub const fn placement(&self) -> &PlacementPolicy {
        &self.placement
    }

    /// Returns the proxy port attached to every resolved address.
    #[must_use]
    pub const fn instance_port(&self) -> u16 {
        self.instance_port
    }

    fn prefix(&self) -> &str {
        self.config.name.trim()
    }
}

impl<C: ComputeApi> Provider for GceProvider<C> {
    type Error = GceError;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn models(&self) -> ProviderFuture<'_, Vec<InstanceModel>, Self::Error> {
        Box::pin(self.fetch_models())
    }

    fn create_instances(
        &self,
        count: usize,
    ) -> ProviderFuture<'_, Vec<CreatedInstance>, Self::Error> {
        Box::pin(self.create(count))
    }

    fn start_instance<'a>(
        &'a self,
        model: &'a InstanceModel,
    ) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(self.start(model))
    }

    fn remove_instance<'a>(
        &'a self,
        model: &'a InstanceModel,
    ) -> ProviderFuture<'a, (), Self::Error> {
        Box::pin(self.remove(model))
    }
}

#[cfg(test)]
mod tests;
