//! Start and delete calls for a single instance.

use tracing::debug;

use crate::model::InstanceModel;

use super::api::ComputeApi;
use super::{GceError, GceProvider, PROVIDER_NAME};

impl<C: ComputeApi> GceProvider<C> {
    pub(super) async fn start(&self, model: &InstanceModel) -> Result<(), GceError> {
        debug!(provider = PROVIDER_NAME, %model, "starting instance");
        self.api.start_instance(&model.region, &model.name).await
    }

    pub(super) async fn remove(&self, model: &InstanceModel) -> Result<(), GceError> {
        debug!(provider = PROVIDER_NAME, %model, "removing instance");
        self.api.delete_instance(&model.region, &model.name).await
    }
}
