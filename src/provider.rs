//! Provider abstraction for managing proxy instances across clouds.

use std::future::Future;
use std::pin::Pin;

use crate::model::InstanceModel;

/// Future returned by provider operations.
pub type ProviderFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Coarse classification of provider failures.
///
/// Callers use the kind to decide between alerting on misconfiguration,
/// backing off from an unavailable backend, and re-listing after a lookup
/// miss.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Required configuration was missing or invalid.
    Configuration,
    /// The backend API could not be reached or rejected the call.
    BackendUnavailable,
    /// A named instance expected to exist was absent.
    NotFound,
}

/// Errors surfaced by providers expose their [`ErrorKind`].
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// Returns the classification of this failure.
    fn kind(&self) -> ErrorKind;
}

/// Instance accepted by the backend during a batch creation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatedInstance {
    /// Generated instance name.
    pub name: String,
    /// Zone the instance was placed in.
    pub region: String,
}

/// Uniform contract implemented once per cloud backend.
pub trait Provider {
    /// Provider specific error type returned by the adapter.
    type Error: ProviderError;

    /// Stable tag used for model tagging and configuration lookups.
    fn name(&self) -> &str;

    /// Lists the in-scope instances currently known to the backend.
    ///
    /// Every call produces a fresh snapshot.
    fn models(&self) -> ProviderFuture<'_, Vec<InstanceModel>, Self::Error>;

    /// Creates `count` new instances.
    ///
    /// Instances created before a failure are left in place; the error
    /// reports them so the caller can reconcile.
    fn create_instances(
        &self,
        count: usize,
    ) -> ProviderFuture<'_, Vec<CreatedInstance>, Self::Error>;

    /// Starts the instance described by `model`.
    fn start_instance<'a>(&'a self, model: &'a InstanceModel)
    -> ProviderFuture<'a, (), Self::Error>;

    /// Deletes the instance described by `model`.
    fn remove_instance<'a>(
        &'a self,
        model: &'a InstanceModel,
    ) -> ProviderFuture<'a, (), Self::Error>;
}
