//! Zone lookup and placement for Compute Engine instances.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::PlacementPolicy;

use super::api::{ComputeApi, ComputeInstance, ComputeZone};
use super::{GceError, GceProvider};

/// Pairs each name with a zone drawn uniformly and independently from
/// `zones`.
pub(super) fn assign_zones<R: Rng + ?Sized>(
    names: Vec<String>,
    zones: &[String],
    rng: &mut R,
) -> Result<Vec<(String, String)>, GceError> {
    names
        .into_iter()
        .map(|name| {
            zones
                .choose(rng)
                .map(|zone| (name, zone.clone()))
                .ok_or(GceError::NoZonesAvailable)
        })
        .collect()
}

impl<C: ComputeApi> GceProvider<C> {
    /// Returns the zone the named instance lives in.
    ///
    /// With an explicit zone configured the answer needs no API call; with
    /// random placement the project listing is searched for the instance.
    ///
    /// # Errors
    ///
    /// Returns [`GceError::InstanceNotFound`] when random placement is in use
    /// and no instance with that name (or no zone for it) is listed, or any
    /// error raised by the listing call.
    pub async fn region(&self, vm_name: &str) -> Result<String, GceError> {
        match &self.placement {
            PlacementPolicy::Zone(zone) => Ok(zone.clone()),
            PlacementPolicy::Random => {
                let instances = self.api.list_instances().await?;
                instances
                    .iter()
                    .find(|instance| instance.name == vm_name)
                    .and_then(ComputeInstance::zone_name)
                    .map(str::to_owned)
                    .ok_or_else(|| GceError::InstanceNotFound {
                        name: vm_name.to_owned(),
                    })
            }
        }
    }

    /// Lists the zones currently reporting `UP`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the zone listing call.
    pub async fn available_zones(&self) -> Result<Vec<String>, GceError> {
        let zones = self.api.list_zones().await?;
        Ok(zones
            .into_iter()
            .filter(ComputeZone::is_up)
            .map(|zone| zone.name)
            .collect())
    }
}
