//! Declared configuration: what a k3s harness resource and the provider
//! block say, before any merging or validation.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Create timeout applied when `timeouts.create` is unset.
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Resource-level configuration of a k3s harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct K3sHarnessConfig {
    /// Full image reference for the k3s container
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub disable_cni: Option<bool>,
    #[serde(default)]
    pub disable_traefik: Option<bool>,
    #[serde(default)]
    pub disable_metrics_server: Option<bool>,
    #[serde(default)]
    pub registries: BTreeMap<String, RegistryInput>,
    /// Existing networks to attach the harness containers to
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkInput>,
    #[serde(default)]
    pub sandbox: Option<SandboxInput>,
    #[serde(default)]
    pub timeouts: TimeoutsInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryInput {
    #[serde(default)]
    pub auth: Option<RegistryAuthInput>,
    #[serde(default)]
    pub tls: Option<RegistryTlsInput>,
    #[serde(default)]
    pub mirror: Option<RegistryMirrorInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAuthInput {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTlsInput {
    #[serde(default)]
    pub cert_file: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default)]
    pub ca_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMirrorInput {
    #[serde(default)]
    pub endpoints: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInput {
    pub name: String,
}

impl NetworkInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxInput {
    /// Defaults to the kubectl image when unset
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub privileged: Option<bool>,
    #[serde(default)]
    pub envs: BTreeMap<String, String>,
    #[serde(default)]
    pub mounts: Vec<MountInput>,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountInput {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutsInput {
    /// Duration string such as `5m` or `90s`
    #[serde(default)]
    pub create: Option<String>,
}

impl TimeoutsInput {
    pub fn create_timeout(&self) -> Result<Duration> {
        match self.create.as_deref() {
            None => Ok(DEFAULT_CREATE_TIMEOUT),
            Some(raw) => humantime::parse_duration(raw).map_err(|e| {
                HarnessError::InvalidInput(format!("invalid create timeout {raw:?}: {e}"))
            }),
        }
    }
}

/// Provider-global k3s defaults merged into every harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct K3sProviderDefaults {
    #[serde(default)]
    pub registries: BTreeMap<String, RegistryInput>,
    #[serde(default)]
    pub networks: Vec<NetworkInput>,
}
