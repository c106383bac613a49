//! Compute Engine API surface used by the provider.
//!
//! [`ComputeApi`] is the seam between the provider logic and the HTTP
//! client; unit tests substitute an in-memory implementation.

use serde::Deserialize;
use serde_json::Value;

use crate::provider::ProviderFuture;

use super::GceError;

/// Future returned by [`ComputeApi`] calls.
pub type ApiFuture<'a, T> = ProviderFuture<'a, T, GceError>;

/// Instance record as returned by the Compute Engine listing.
///
/// Only the fields the provider interprets are decoded; the listed JSON is
/// kept untouched in `raw`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComputeInstance {
    /// Numeric identifier, serialised by the API as a string.
    #[serde(default)]
    pub id: String,
    /// Instance name, unique within the project.
    #[serde(default)]
    pub name: String,
    /// Native status (for example `RUNNING`).
    #[serde(default)]
    pub status: String,
    /// Full URL of the zone hosting the instance.
    #[serde(default)]
    pub zone: String,
    /// Network tags applied to the instance.
    #[serde(default)]
    pub tags: Option<InstanceTags>,
    /// Attached network interfaces.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    /// Native record exactly as listed.
    #[serde(skip)]
    pub raw: Value,
}

/// Network tag block of an instance.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct InstanceTags {
    /// Tags in the order they were applied.
    #[serde(default)]
    pub items: Option<Vec<String>>,
}

/// Network interface of an instance.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// External access configurations (one-to-one NAT entries).
    #[serde(default)]
    pub access_configs: Vec<AccessConfig>,
}

/// External access configuration of a network interface.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AccessConfig {
    /// External IP address, absent until one is assigned.
    #[serde(rename = "natIP", default)]
    pub nat_ip: Option<String>,
}

impl ComputeInstance {
    /// Decodes a listed record and keeps the record itself in `raw`.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when a field has an unexpected shape.
    pub fn from_native(raw: Value) -> Result<Self, serde_json::Error> {
        let mut instance = Self::deserialize(&raw)?;
        instance.raw = raw;
        Ok(instance)
    }

    /// Returns the zone name (the last path segment of [`Self::zone`]).
    #[must_use]
    pub fn zone_name(&self) -> Option<&str> {
        self.zone
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }

    /// Returns the first non-empty external address across every interface.
    #[must_use]
    pub fn public_ip(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .flat_map(|interface| interface.access_configs.iter())
            .filter_map(|config| config.nat_ip.as_deref())
            .find(|ip| !ip.trim().is_empty())
    }

    /// Returns the most recently applied tag.
    #[must_use]
    pub fn last_tag(&self) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(|tags| tags.items.as_deref())
            .and_then(<[String]>::last)
            .map(String::as_str)
    }
}

/// Zone record as returned by the Compute Engine zone listing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ComputeZone {
    /// Zone name (for example `europe-west1-b`).
    pub name: String,
    /// Zone status, `UP` or `DOWN`.
    #[serde(default)]
    pub status: String,
}

impl ComputeZone {
    /// Whether new instances can be placed in the zone.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == "UP"
    }
}

/// Parameters of a single instance insertion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewInstance {
    /// Instance name.
    pub name: String,
    /// Target zone.
    pub zone: String,
    /// Machine type name.
    pub machine_type: String,
    /// Boot image reference (`projects/{project}/global/images/{image}`).
    pub source_image: String,
    /// Network tags.
    pub tags: Vec<String>,
    /// Whether inbound HTTP traffic is allowed.
    pub allow_http: bool,
}

/// Operations the provider needs from Compute Engine.
pub trait ComputeApi: Send + Sync {
    /// Lists every instance of the project across all zones.
    fn list_instances(&self) -> ApiFuture<'_, Vec<ComputeInstance>>;

    /// Lists every zone visible to the project.
    fn list_zones(&self) -> ApiFuture<'_, Vec<ComputeZone>>;

    /// Inserts a new instance.
    fn insert_instance<'a>(&'a self, request: &'a NewInstance) -> ApiFuture<'a, ()>;

    /// Starts a stopped instance.
    fn start_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ApiFuture<'a, ()>;

    /// Deletes an instance.
    fn delete_instance<'a>(&'a self, zone: &'a str, name: &'a str) -> ApiFuture<'a, ()>;
}
