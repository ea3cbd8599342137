//! Bootstrap assembly as an explicit, ordered list of mutations.
//!
//! [`plan_mutations`] validates the declared inputs and emits one
//! [`ConfigMutation`] per setting; [`BootstrapSpec::apply`] folds them onto a
//! default spec. Merge and append order is part of the contract:
//!
//! - networks: resource networks first, then every provider network,
//!   duplicates kept
//! - registries: provider entries overwrite resource entries on name clash

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::config::{K3sHarnessConfig, K3sProviderDefaults, RegistryAuthInput, RegistryInput};
use super::paths::absolutize;
use super::reference::ImageRef;
use super::spec::{
    default_sandbox_image, BindMount, BootstrapSpec, ClusterToggles, RegistryAuth, RegistryTls,
};
use crate::error::{HarnessError, Result};

/// One configuration change applied to a [`BootstrapSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigMutation {
    Toggles(ClusterToggles),
    ClusterImage(ImageRef),
    SandboxImage(ImageRef),
    SandboxPrivileged(bool),
    SandboxMount(BindMount),
    SandboxNetwork(String),
    SandboxEnv(BTreeMap<String, String>),
    RegistryAuth { registry: String, auth: RegistryAuth },
    RegistryTls { registry: String, tls: RegistryTls },
    RegistryMirror { registry: String, endpoints: Vec<String> },
    Networks(Vec<String>),
}

impl BootstrapSpec {
    pub fn apply(&mut self, mutation: ConfigMutation) {
        match mutation {
            ConfigMutation::Toggles(toggles) => self.toggles = toggles,
            ConfigMutation::ClusterImage(image) => self.image = Some(image),
            ConfigMutation::SandboxImage(image) => self.sandbox.image = image,
            ConfigMutation::SandboxPrivileged(privileged) => self.sandbox.privileged = privileged,
            ConfigMutation::SandboxMount(mount) => self.sandbox.mounts.push(mount),
            ConfigMutation::SandboxNetwork(network) => self.sandbox.networks.push(network),
            ConfigMutation::SandboxEnv(env) => self.sandbox.env.extend(env),
            ConfigMutation::RegistryAuth { registry, auth } => {
                self.registries.entry(registry).or_default().auth = Some(auth);
            }
            ConfigMutation::RegistryTls { registry, tls } => {
                self.registries.entry(registry).or_default().tls = Some(tls);
            }
            ConfigMutation::RegistryMirror {
                registry,
                endpoints,
            } => {
                self.registries.entry(registry).or_default().mirror_endpoints = endpoints;
            }
            ConfigMutation::Networks(networks) => self.networks.extend(networks),
        }
    }

    /// Fold mutations, in order, onto a default spec.
    pub fn from_mutations(mutations: impl IntoIterator<Item = ConfigMutation>) -> Self {
        let mut spec = BootstrapSpec::default();
        for mutation in mutations {
            spec.apply(mutation);
        }
        spec
    }
}

/// Everything the builder reads.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapSources<'a> {
    pub resource: &'a K3sHarnessConfig,
    pub defaults: &'a K3sProviderDefaults,
    /// Directory relative mount sources resolve against
    pub working_dir: &'a Path,
}

/// Resource registries overlaid with provider registries. Provider entries
/// win on name clash.
pub fn merge_registries(
    resource: &BTreeMap<String, RegistryInput>,
    global: &BTreeMap<String, RegistryInput>,
) -> BTreeMap<String, RegistryInput> {
    let mut merged = resource.clone();
    for (name, registry) in global {
        merged.insert(name.clone(), registry.clone());
    }
    merged
}

/// Resource network names followed by every provider network name.
pub fn collect_networks(resource: &K3sHarnessConfig, defaults: &K3sProviderDefaults) -> Vec<String> {
    resource
        .networks
        .values()
        .chain(defaults.networks.iter())
        .map(|n| n.name.clone())
        .collect()
}

/// All three explicit fields unset selects the ambient keychain lookup.
pub fn resolve_auth(input: &RegistryAuthInput) -> RegistryAuth {
    match (&input.username, &input.password, &input.auth) {
        (None, None, None) => RegistryAuth::Keychain,
        (username, password, auth) => RegistryAuth::Static {
            username: username.clone().unwrap_or_default(),
            password: password.clone().unwrap_or_default(),
            auth: auth.clone().unwrap_or_default(),
        },
    }
}

fn validate_endpoints(registry: &str, endpoints: &[String]) -> Result<()> {
    for endpoint in endpoints {
        if endpoint.trim().is_empty() || endpoint.chars().any(char::is_whitespace) {
            return Err(HarnessError::InvalidInput(format!(
                "malformed mirror endpoint {endpoint:?} for registry {registry}"
            )));
        }
    }
    Ok(())
}

/// Validate the declared inputs and produce the ordered mutation list.
pub fn plan_mutations(sources: BootstrapSources<'_>) -> Result<Vec<ConfigMutation>> {
    let BootstrapSources {
        resource,
        defaults,
        working_dir,
    } = sources;
    let base = ClusterToggles::default();
    let mut mutations = vec![ConfigMutation::Toggles(ClusterToggles {
        disable_cni: resource.disable_cni.unwrap_or(base.disable_cni),
        disable_traefik: resource.disable_traefik.unwrap_or(base.disable_traefik),
        disable_metrics_server: resource
            .disable_metrics_server
            .unwrap_or(base.disable_metrics_server),
    })];

    if let Some(image) = &resource.image {
        mutations.push(ConfigMutation::ClusterImage(ImageRef::parse(image)?));
    }

    if let Some(sandbox) = &resource.sandbox {
        let image = match &sandbox.image {
            Some(image) => ImageRef::parse(image)?,
            None => default_sandbox_image(),
        };
        mutations.push(ConfigMutation::SandboxImage(image));
        mutations.push(ConfigMutation::SandboxPrivileged(
            sandbox.privileged.unwrap_or(false),
        ));

        for mount in &sandbox.mounts {
            mutations.push(ConfigMutation::SandboxMount(BindMount {
                source: absolutize(working_dir, &mount.source)?,
                target: mount.destination.clone(),
            }));
        }

        for network in sandbox.networks.values() {
            mutations.push(ConfigMutation::SandboxNetwork(network.name.clone()));
        }

        mutations.push(ConfigMutation::SandboxEnv(sandbox.envs.clone()));
    }

    let registries = merge_registries(&resource.registries, &defaults.registries);
    for (name, registry) in &registries {
        if let Some(auth) = &registry.auth {
            mutations.push(ConfigMutation::RegistryAuth {
                registry: name.clone(),
                auth: resolve_auth(auth),
            });
        }

        if let Some(tls) = &registry.tls {
            mutations.push(ConfigMutation::RegistryTls {
                registry: name.clone(),
                tls: RegistryTls {
                    cert_file: tls.cert_file.as_ref().map(PathBuf::from),
                    key_file: tls.key_file.as_ref().map(PathBuf::from),
                    ca_file: tls.ca_file.as_ref().map(PathBuf::from),
                },
            });
        }

        if let Some(mirror) = &registry.mirror {
            let endpoints = mirror.endpoints.clone().unwrap_or_default();
            validate_endpoints(name, &endpoints)?;
            mutations.push(ConfigMutation::RegistryMirror {
                registry: name.clone(),
                endpoints,
            });
        }
    }

    mutations.push(ConfigMutation::Networks(collect_networks(resource, defaults)));

    debug!(mutations = mutations.len(), "planned bootstrap mutations");
    Ok(mutations)
}

/// Validate, plan and fold in one step.
pub fn build_bootstrap_spec(sources: BootstrapSources<'_>) -> Result<BootstrapSpec> {
    Ok(BootstrapSpec::from_mutations(plan_mutations(sources)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::config::{
        MountInput, NetworkInput, RegistryMirrorInput, RegistryTlsInput, SandboxInput,
    };

    fn sources<'a>(
        resource: &'a K3sHarnessConfig,
        defaults: &'a K3sProviderDefaults,
    ) -> BootstrapSources<'a> {
        BootstrapSources {
            resource,
            defaults,
            working_dir: Path::new("/work"),
        }
    }

    fn mirror(endpoints: &[&str]) -> RegistryInput {
        RegistryInput {
            mirror: Some(RegistryMirrorInput {
                endpoints: Some(endpoints.iter().map(|s| s.to_string()).collect()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_only() {
        let spec = build_bootstrap_spec(sources(
            &K3sHarnessConfig::default(),
            &K3sProviderDefaults::default(),
        ))
        .unwrap();
        assert_eq!(spec, BootstrapSpec::default());
    }

    #[test]
    fn test_resource_toggles_win() {
        let resource = K3sHarnessConfig {
            disable_cni: Some(true),
            disable_traefik: Some(false),
            ..Default::default()
        };
        let spec = build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default()))
            .unwrap();
        assert!(spec.toggles.disable_cni);
        assert!(!spec.toggles.disable_traefik);
        assert!(spec.toggles.disable_metrics_server);
    }

    #[test]
    fn test_provider_registry_overwrites_resource_registry() {
        let resource = BTreeMap::from([("a".to_string(), mirror(&["https://x"]))]);
        let global = BTreeMap::from([
            ("a".to_string(), mirror(&["https://y"])),
            ("b".to_string(), mirror(&["https://z"])),
        ]);
        let merged = merge_registries(&resource, &global);
        assert_eq!(merged["a"], mirror(&["https://y"]));
        assert_eq!(merged["b"], mirror(&["https://z"]));
    }

    #[test]
    fn test_networks_append_keeps_duplicates() {
        let resource = K3sHarnessConfig {
            networks: BTreeMap::from([("primary".to_string(), NetworkInput::new("n1"))]),
            ..Default::default()
        };
        let defaults = K3sProviderDefaults {
            networks: vec![NetworkInput::new("n1"), NetworkInput::new("n2")],
            ..Default::default()
        };
        let spec = build_bootstrap_spec(sources(&resource, &defaults)).unwrap();
        assert_eq!(spec.networks, vec!["n1", "n1", "n2"]);
    }

    #[test]
    fn test_auth_without_fields_uses_keychain() {
        assert_eq!(
            resolve_auth(&RegistryAuthInput::default()),
            RegistryAuth::Keychain
        );
    }

    #[test]
    fn test_partial_auth_is_static_without_inference() {
        let auth = resolve_auth(&RegistryAuthInput {
            username: Some("robot".to_string()),
            ..Default::default()
        });
        assert_eq!(
            auth,
            RegistryAuth::Static {
                username: "robot".to_string(),
                password: String::new(),
                auth: String::new(),
            }
        );
    }

    #[test]
    fn test_mirror_endpoints_keep_order_and_default_empty() {
        let resource = K3sHarnessConfig {
            registries: BTreeMap::from([
                ("ordered".to_string(), mirror(&["https://b", "https://a"])),
                (
                    "bare".to_string(),
                    RegistryInput {
                        mirror: Some(RegistryMirrorInput { endpoints: None }),
                        ..Default::default()
                    },
                ),
            ]),
            ..Default::default()
        };
        let spec = build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default()))
            .unwrap();
        assert_eq!(
            spec.registries["ordered"].mirror_endpoints,
            vec!["https://b", "https://a"]
        );
        assert!(spec.registries["bare"].mirror_endpoints.is_empty());
    }

    #[test]
    fn test_malformed_mirror_endpoint_is_invalid_input() {
        let resource = K3sHarnessConfig {
            registries: BTreeMap::from([("r".to_string(), mirror(&["https://ok", " "]))]),
            ..Default::default()
        };
        let err = build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default()))
            .unwrap_err();
        assert!(matches!(err, HarnessError::InvalidInput(_)));
    }

    #[test]
    fn test_tls_material_is_carried() {
        let resource = K3sHarnessConfig {
            registries: BTreeMap::from([(
                "secure".to_string(),
                RegistryInput {
                    tls: Some(RegistryTlsInput {
                        ca_file: Some("/certs/ca.pem".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        };
        let spec = build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default()))
            .unwrap();
        let tls = spec.registries["secure"].tls.as_ref().unwrap();
        assert_eq!(tls.ca_file, Some(PathBuf::from("/certs/ca.pem")));
        assert!(spec.registries["secure"].auth.is_none());
    }

    #[test]
    fn test_sandbox_inputs_pass_through() {
        let resource = K3sHarnessConfig {
            sandbox: Some(SandboxInput {
                privileged: Some(true),
                envs: BTreeMap::from([("KUBECONFIG".to_string(), "/k".to_string())]),
                mounts: vec![MountInput {
                    source: "manifests".to_string(),
                    destination: "/manifests".to_string(),
                }],
                networks: BTreeMap::from([
                    ("b".to_string(), NetworkInput::new("net-b")),
                    ("a".to_string(), NetworkInput::new("net-a")),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let spec = build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default()))
            .unwrap();
        assert!(spec.sandbox.privileged);
        assert_eq!(spec.sandbox.image.to_string(), crate::bootstrap::DEFAULT_SANDBOX_IMAGE);
        assert_eq!(spec.sandbox.env["KUBECONFIG"], "/k");
        assert_eq!(
            spec.sandbox.mounts,
            vec![BindMount {
                source: PathBuf::from("/work/manifests"),
                target: "/manifests".to_string(),
            }]
        );
        assert_eq!(spec.sandbox.networks, vec!["net-a", "net-b"]);
    }

    #[test]
    fn test_invalid_images_abort() {
        let resource = K3sHarnessConfig {
            image: Some("Not A Ref".to_string()),
            ..Default::default()
        };
        assert!(build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default())).is_err());

        let resource = K3sHarnessConfig {
            sandbox: Some(SandboxInput {
                image: Some("bad image".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(build_bootstrap_spec(sources(&resource, &K3sProviderDefaults::default())).is_err());
    }

    #[test]
    fn test_mutation_order_is_stable() {
        let resource = K3sHarnessConfig {
            image: Some("rancher/k3s:v1.29.0-k3s1".to_string()),
            ..Default::default()
        };
        let first = plan_mutations(sources(&resource, &K3sProviderDefaults::default())).unwrap();
        let second = plan_mutations(sources(&resource, &K3sProviderDefaults::default())).unwrap();
        assert_eq!(first, second);
        assert!(matches!(first.first(), Some(ConfigMutation::Toggles(_))));
        assert!(matches!(first.last(), Some(ConfigMutation::Networks(_))));
    }
}
