//! Compute Engine status vocabulary and its canonical mapping.

use std::str::FromStr;

use thiserror::Error;
use tracing::error;

use crate::model::LifecycleState;

/// Instance statuses reported by the Compute Engine API.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GceStatus {
    /// Resources are being allocated.
    Provisioning,
    /// Resources are acquired and the instance is preparing for first boot.
    Staging,
    /// The instance is booting or running.
    Running,
    /// The instance is being stopped.
    Stopping,
    /// The instance is stopped.
    Stopped,
    /// The instance is being suspended.
    Suspending,
    /// The instance is suspended.
    Suspended,
    /// The instance is being repaired by the platform.
    Repairing,
    /// The instance was shut down and is not running.
    Terminated,
}

impl GceStatus {
    /// Returns the native API spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Staging => "STAGING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Suspending => "SUSPENDING",
            Self::Suspended => "SUSPENDED",
            Self::Repairing => "REPAIRING",
            Self::Terminated => "TERMINATED",
        }
    }

    /// Whether the instance is on its way out and must stay invisible to
    /// scaling decisions.
    #[must_use]
    pub const fn is_exiting(self) -> bool {
        matches!(self, Self::Stopping | Self::Suspending | Self::Terminated)
    }

    /// Maps the native status onto the canonical lifecycle.
    #[must_use]
    pub const fn lifecycle(self) -> LifecycleState {
        match self {
            Self::Provisioning | Self::Staging => LifecycleState::Starting,
            Self::Running => LifecycleState::Started,
            Self::Stopping | Self::Suspending => LifecycleState::Stopping,
            Self::Stopped | Self::Suspended | Self::Terminated => LifecycleState::Stopped,
            Self::Repairing => LifecycleState::Error,
        }
    }
}

/// A status string outside the Compute Engine vocabulary.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown instance status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for GceStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PROVISIONING" => Ok(Self::Provisioning),
            "STAGING" => Ok(Self::Staging),
            "RUNNING" => Ok(Self::Running),
            "STOPPING" => Ok(Self::Stopping),
            "STOPPED" => Ok(Self::Stopped),
            "SUSPENDING" => Ok(Self::Suspending),
            "SUSPENDED" => Ok(Self::Suspended),
            "REPAIRING" => Ok(Self::Repairing),
            "TERMINATED" => Ok(Self::Terminated),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Normalises a native status string.
///
/// Unknown values are logged and reported as [`LifecycleState::Error`] so the
/// instance stays visible to callers.
#[must_use]
pub fn normalize(native: &str) -> LifecycleState {
    match native.parse::<GceStatus>() {
        Ok(status) => status.lifecycle(),
        Err(err) => {
            error!(provider = super::PROVIDER_NAME, %err, "found unknown status");
            LifecycleState::Error
        }
    }
}
