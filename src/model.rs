//! Provider-agnostic representation of a proxy instance.
//!
//! Every adapter converts its native listing into [`InstanceModel`] values so
//! the scaling loop can reason about instances without knowing which cloud
//! they live on. Models are rebuilt on every listing and carry no identity
//! across calls.

use std::fmt;

/// Canonical lifecycle states shared by every provider.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LifecycleState {
    /// The instance is being provisioned or booted.
    Starting,
    /// The instance is running.
    Started,
    /// The instance is shutting down.
    Stopping,
    /// The instance is stopped or terminated.
    Stopped,
    /// The provider reported a state with no canonical equivalent.
    Error,
}

impl LifecycleState {
    /// Returns the upper-case label used in logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Started => "STARTED",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reachable proxy endpoint of an instance.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct InstanceAddress {
    /// Public IP address reported by the provider.
    pub hostname: String,
    /// Proxy listening port shared by the whole deployment.
    pub port: u16,
}

impl InstanceAddress {
    /// Builds an address when `ip` holds a non-empty value.
    ///
    /// Providers report missing addresses in several ways (absent field,
    /// empty string); all of them collapse to `None`.
    #[must_use]
    pub fn from_ip(ip: Option<&str>, port: u16) -> Option<Self> {
        ip.map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self {
                hostname: value.to_owned(),
                port,
            })
    }
}

impl fmt::Display for InstanceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Snapshot of a single provider instance in canonical form.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceModel {
    /// Provider-assigned identifier.
    pub id: String,
    /// Tag of the provider that produced the model.
    pub provider_name: String,
    /// Provider-native instance name.
    pub name: String,
    /// Canonical lifecycle state.
    pub state: LifecycleState,
    /// Whether the instance was provisioned by hand rather than by a provider.
    pub manually_managed: bool,
    /// Proxy endpoint, absent until the provider assigns a public IP.
    pub address: Option<InstanceAddress>,
    /// Zone or region the instance actually lives in.
    pub region: String,
    /// Most recently applied tag, if the instance carries any.
    pub tag: Option<String>,
    /// Native provider record, kept for diagnostics only.
    pub raw: serde_json::Value,
}

impl fmt::Display for InstanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}@{}",
            self.name, self.id, self.state, self.region
        )
    }
}
