//! Listing pipeline turning raw Compute Engine instances into models.
//!
//! The stages run in a fixed order: list, summarise, drop exiting
//! instances, drop instances outside the name prefix, then resolve regions
//! concurrently and build the models.

use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::model::{InstanceAddress, InstanceModel};

use super::api::{ComputeApi, ComputeInstance};
use super::status::{GceStatus, normalize};
use super::{GceError, GceProvider, PROVIDER_NAME};

/// Fields of an instance the pipeline works with.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct VmSummary {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) status: String,
    pub(super) ip: Option<String>,
    pub(super) tag: Option<String>,
    pub(super) raw: Value,
}

impl From<ComputeInstance> for VmSummary {
    fn from(instance: ComputeInstance) -> Self {
        Self {
            ip: instance.public_ip().map(str::to_owned),
            tag: instance.last_tag().map(str::to_owned),
            id: instance.id,
            name: instance.name,
            status: instance.status,
            raw: instance.raw,
        }
    }
}

pub(super) fn summarize(instances: Vec<ComputeInstance>) -> Vec<VmSummary> {
    instances.into_iter().map(VmSummary::from).collect()
}

pub(super) fn exclude_exiting(vms: Vec<VmSummary>) -> Vec<VmSummary> {
    vms.into_iter()
        .filter(|vm| {
            !vm.status
                .parse::<GceStatus>()
                .is_ok_and(GceStatus::is_exiting)
        })
        .collect()
}

pub(super) fn exclude_out_of_scope(vms: Vec<VmSummary>, prefix: &str) -> Vec<VmSummary> {
    vms.into_iter()
        .filter(|vm| vm.name.starts_with(prefix))
        .collect()
}

impl<C: ComputeApi> GceProvider<C> {
    pub(super) async fn fetch_models(&self) -> Result<Vec<InstanceModel>, GceError> {
        let instances = self.api.list_instances().await?;
        let listed = instances.len();

        let vms = exclude_out_of_scope(exclude_exiting(summarize(instances)), self.prefix());
        debug!(
            provider = PROVIDER_NAME,
            listed,
            in_scope = vms.len(),
            "fetched instances"
        );

        try_join_all(vms.into_iter().map(|vm| self.to_model(vm))).await
    }

    async fn to_model(&self, vm: VmSummary) -> Result<InstanceModel, GceError> {
        let region = self.region(&vm.name).await?;
        Ok(InstanceModel {
            state: normalize(&vm.status),
            address: InstanceAddress::from_ip(vm.ip.as_deref(), self.instance_port),
            id: vm.id,
            provider_name: PROVIDER_NAME.to_owned(),
            name: vm.name,
            manually_managed: false,
            region,
            tag: vm.tag,
            raw: vm.raw,
        })
    }
}
