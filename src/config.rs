//! Configuration loading via `ortho-config`.

use std::fmt;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Literal region value selecting randomised zone placement.
pub const RANDOM_REGION: &str = "random";

/// Google Compute Engine configuration derived from environment variables,
/// configuration files, and defaults.
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "GCE")]
pub struct GceConfig {
    /// Prefix shared by every instance this deployment manages. Defaults to
    /// `proxy`.
    #[ortho_config(default = "proxy".to_owned())]
    pub name: String,
    /// Google Cloud project that owns the instances and the boot image.
    pub project_id: String,
    /// Service account e-mail used as the token issuer.
    pub client_email: String,
    /// PEM encoded service account private key.
    pub private_key: String,
    /// Zone identifier (for example `europe-west1-b`) or `random`.
    pub region: String,
    /// Name of the boot image inside `project_id`.
    pub image_name: String,
    /// Machine type for new instances (for example `n1-standard-1`).
    pub machine_type: String,
    /// Comma-separated network tags applied to new instances.
    #[ortho_config(default = String::new())]
    pub tags: String,
}

/// Where new instances are placed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlacementPolicy {
    /// Every instance goes to the named zone.
    Zone(String),
    /// Each instance draws one of the zones currently reported `UP`.
    Random,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl GceConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [gce] in proxyfleet.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("proxyfleet")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the placement policy selected by [`GceConfig::region`].
    #[must_use]
    pub fn placement(&self) -> PlacementPolicy {
        let region = self.region.trim();
        if region == RANDOM_REGION {
            PlacementPolicy::Random
        } else {
            PlacementPolicy::Zone(region.to_owned())
        }
    }

    /// Splits [`GceConfig::tags`] into individual tags, dropping blanks.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Returns the private key with escaped newlines restored.
    ///
    /// Keys copied out of service account JSON files usually arrive in
    /// environment variables with literal `\n` sequences.
    #[must_use]
    pub fn private_key_pem(&self) -> String {
        self.private_key.replace("\\n", "\n")
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (
                &self.name,
                FieldMetadata::new("instance name prefix", "GCE_NAME", "name"),
            ),
            (
                &self.project_id,
                FieldMetadata::new("Google Cloud project ID", "GCE_PROJECT_ID", "project_id"),
            ),
            (
                &self.client_email,
                FieldMetadata::new(
                    "service account e-mail",
                    "GCE_CLIENT_EMAIL",
                    "client_email",
                ),
            ),
            (
                &self.private_key,
                FieldMetadata::new(
                    "service account private key",
                    "GCE_PRIVATE_KEY",
                    "private_key",
                ),
            ),
            (
                &self.region,
                FieldMetadata::new("zone (or \"random\")", "GCE_REGION", "region"),
            ),
            (
                &self.image_name,
                FieldMetadata::new("VM image", "GCE_IMAGE_NAME", "image_name"),
            ),
            (
                &self.machine_type,
                FieldMetadata::new("machine type", "GCE_MACHINE_TYPE", "machine_type"),
            ),
        ];
        for (value, metadata) in &required {
            Self::require_field(value, metadata)?;
        }
        Ok(())
    }
}

impl fmt::Debug for GceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GceConfig")
            .field("name", &self.name)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("region", &self.region)
            .field("image_name", &self.image_name)
            .field("machine_type", &self.machine_type)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
