//! Bootstrap: composing a k3s cluster specification from overlapping sources.
//!
//! # Modules
//!
//! - [`config`]:    declared resource and provider inputs (serde models)
//! - [`reference`]: `ImageRef` validation
//! - [`paths`]:     mount source resolution against the working directory
//! - [`spec`]:      the resolved `BootstrapSpec`
//! - [`builder`]:   `ConfigMutation` list and `build_bootstrap_spec()`

pub mod builder;
pub mod config;
pub mod paths;
pub mod reference;
pub mod spec;

pub use builder::{
    build_bootstrap_spec, collect_networks, merge_registries, plan_mutations, resolve_auth,
    BootstrapSources, ConfigMutation,
};
pub use config::{
    K3sHarnessConfig, K3sProviderDefaults, MountInput, NetworkInput, RegistryAuthInput,
    RegistryInput, RegistryMirrorInput, RegistryTlsInput, SandboxInput, TimeoutsInput,
    DEFAULT_CREATE_TIMEOUT,
};
pub use reference::ImageRef;
pub use spec::{
    BindMount, BootstrapSpec, ClusterToggles, RegistryAuth, RegistryConfig, RegistryTls,
    SandboxSpec, DEFAULT_SANDBOX_IMAGE,
};
