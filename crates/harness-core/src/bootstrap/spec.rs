//! The resolved bootstrap specification handed to a [`HandleFactory`].
//!
//! [`HandleFactory`]: crate::orchestrator::HandleFactory

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Serialize, Serializer};

use super::reference::ImageRef;

/// Sandbox image used when the resource does not name one.
pub const DEFAULT_SANDBOX_IMAGE: &str = "cgr.dev/chainguard/kubectl:latest-dev";

pub(crate) fn default_sandbox_image() -> ImageRef {
    static IMAGE: OnceLock<ImageRef> = OnceLock::new();
    IMAGE
        .get_or_init(|| {
            ImageRef::parse(DEFAULT_SANDBOX_IMAGE).expect("default sandbox image is valid")
        })
        .clone()
}

/// k3s builtin component toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClusterToggles {
    pub disable_cni: bool,
    pub disable_traefik: bool,
    pub disable_metrics_server: bool,
}

impl Default for ClusterToggles {
    fn default() -> Self {
        Self {
            disable_cni: false,
            disable_traefik: true,
            disable_metrics_server: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindMount {
    /// Absolute host path
    pub source: PathBuf,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxSpec {
    pub image: ImageRef,
    pub privileged: bool,
    pub env: BTreeMap<String, String>,
    pub mounts: Vec<BindMount>,
    pub networks: Vec<String>,
}

impl Default for SandboxSpec {
    fn default() -> Self {
        Self {
            image: default_sandbox_image(),
            privileged: false,
            env: BTreeMap::new(),
            mounts: Vec::new(),
            networks: Vec::new(),
        }
    }
}

/// Registry credentials: either looked up ambiently by registry name, or
/// given explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RegistryAuth {
    Keychain,
    Static {
        username: String,
        #[serde(serialize_with = "redact")]
        password: String,
        #[serde(serialize_with = "redact")]
        auth: String,
    },
}

fn redact<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("<redacted>")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryTls {
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryConfig {
    pub auth: Option<RegistryAuth>,
    pub tls: Option<RegistryTls>,
    /// Alternate endpoints, in declared order
    pub mirror_endpoints: Vec<String>,
}

/// Fully merged cluster bootstrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapSpec {
    pub toggles: ClusterToggles,
    /// Explicit k3s image; the orchestrator's own default applies when unset
    pub image: Option<ImageRef>,
    pub sandbox: SandboxSpec,
    pub registries: BTreeMap<String, RegistryConfig>,
    /// Extra docker networks; duplicates are preserved
    pub networks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toggles() {
        let t = ClusterToggles::default();
        assert!(!t.disable_cni);
        assert!(t.disable_traefik);
        assert!(t.disable_metrics_server);
    }

    #[test]
    fn test_default_sandbox_image() {
        assert_eq!(
            SandboxSpec::default().image.to_string(),
            DEFAULT_SANDBOX_IMAGE
        );
    }

    #[test]
    fn test_static_auth_secrets_are_redacted() {
        let auth = RegistryAuth::Static {
            username: "robot".to_string(),
            password: "hunter2".to_string(),
            auth: String::new(),
        };
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["source"], "static");
        assert_eq!(json["username"], "robot");
        assert_eq!(json["password"], "<redacted>");
        assert_eq!(json["auth"], "");
    }
}
