//! harnessctl - plan, render and apply k3s test harnesses
//!
//! ## Commands
//!
//! - `plan`: Compute a harness id and add it to its inventory
//! - `render`: Print the resolved bootstrap spec for a harness config
//! - `apply`: Plan, register features and create a harness (dry run)
//! - `inventory`: List the harnesses and features recorded for a seed

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use harness_core::{
    build_bootstrap_spec, init_tracing, Attachment, BootstrapSources, DryRunFactory,
    FeatureBinding, HarnessController, HarnessError, HarnessState, K3sHarnessConfig, LogFormat,
    PlanOutcome, PlanRequest, ProviderConfig, ProviderStore,
};
use harness_inventory::{Feature, FsInventoryStore, InventoryStore, MemoryInventoryStore, Seed};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "harnessctl")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan and apply k3s test harnesses", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "HARNESS_LOG_JSON")]
    json: bool,

    /// Provider configuration file (JSON)
    #[arg(long, global = true, env = "HARNESS_PROVIDER_CONFIG")]
    provider_config: Option<PathBuf>,

    /// Persist inventories in this directory (default: in-memory)
    #[arg(long, global = true, env = "HARNESS_INVENTORY_DIR")]
    inventory_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the harness id and add it to the inventory
    Plan {
        /// Harness name
        #[arg(short, long, default_value = "k3s")]
        name: String,

        /// Inventory seed
        #[arg(short, long)]
        seed: String,
    },

    /// Print the resolved bootstrap spec as JSON
    Render {
        /// Harness configuration file (JSON); empty config when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Plan and create a harness against the dry-run orchestrator
    Apply {
        /// Harness name
        #[arg(short, long, default_value = "k3s")]
        name: String,

        /// Inventory seed
        #[arg(short, long)]
        seed: String,

        /// Harness configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Feature to register first, as NAME[:KEY=VALUE,...]
        #[arg(short, long = "feature", value_parser = parse_feature)]
        features: Vec<Feature>,

        /// Harness state file; read as prior state and rewritten after apply
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// List harnesses and their features for a seed
    Inventory {
        /// Inventory seed
        #[arg(short, long)]
        seed: String,
    },
}

#[derive(Serialize)]
struct ApplyOutput {
    state: HarnessState,
    attached: bool,
    diagnostics: Vec<harness_core::Diagnostic>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(LogFormat::from_json_flag(cli.json), level);

    let store = build_store(cli.provider_config.as_deref(), cli.inventory_dir.as_deref())?;

    match cli.command {
        Commands::Plan { name, seed } => cmd_plan(store, &name, &seed).await,
        Commands::Render { config } => cmd_render(&store, config.as_deref()),
        Commands::Apply {
            name,
            seed,
            config,
            features,
            state,
        } => {
            let output = cmd_apply(
                store,
                &name,
                &seed,
                config.as_deref(),
                features,
                state.as_deref(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::Inventory { seed } => cmd_inventory(&store, &seed).await,
    }
}

fn build_store(
    provider_config: Option<&Path>,
    inventory_dir: Option<&Path>,
) -> Result<Arc<ProviderStore>> {
    let config = match provider_config {
        Some(path) => ProviderConfig::load(path).map_err(diagnostic)?,
        None => ProviderConfig::default(),
    };

    let inventories: Arc<dyn InventoryStore> = match inventory_dir {
        Some(dir) => Arc::new(
            FsInventoryStore::new(dir)
                .with_context(|| format!("Failed to open inventory directory {:?}", dir))?,
        ),
        None => Arc::new(MemoryInventoryStore::new()),
    };

    Ok(Arc::new(ProviderStore::new(
        config,
        inventories,
        Arc::new(DryRunFactory),
    )))
}

/// Surface a harness error the way the host would: title plus detail.
fn diagnostic(err: HarnessError) -> anyhow::Error {
    anyhow!("{}", err.to_diagnostic())
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).context(format!("Failed to read {:?}", path))?;
    serde_json::from_str(&raw).context(format!("Failed to parse {:?}", path))
}

fn load_harness_config(path: Option<&Path>) -> Result<K3sHarnessConfig> {
    match path {
        Some(path) => read_json_file(path),
        None => Ok(K3sHarnessConfig::default()),
    }
}

/// Parse `NAME[:KEY=VALUE,...]` into a feature.
fn parse_feature(raw: &str) -> std::result::Result<Feature, String> {
    let (name, labels) = match raw.split_once(':') {
        Some((name, labels)) => (name, Some(labels)),
        None => (raw, None),
    };
    if name.trim().is_empty() {
        return Err(format!("feature name missing in {raw:?}"));
    }

    let mut feature = Feature::new(name.trim());
    for pair in labels.into_iter().flat_map(|l| l.split(',')) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got {pair:?}"))?;
        if key.trim().is_empty() {
            return Err(format!("empty label key in {raw:?}"));
        }
        feature = feature.with_label(key.trim(), value.trim());
    }
    Ok(feature)
}

async fn cmd_plan(store: Arc<ProviderStore>, name: &str, seed: &str) -> Result<()> {
    let controller = HarnessController::new(store);
    let outcome = controller
        .plan(PlanRequest {
            name: name.to_string(),
            inventory: Seed::from(seed),
            prior_state: None,
        })
        .await
        .map_err(diagnostic)?;

    let newly_added = matches!(outcome, PlanOutcome::Planned { newly_added: true, .. });
    println!("Harness: {}", outcome.state().id);
    println!("Newly added: {}", newly_added);

    Ok(())
}

fn cmd_render(store: &ProviderStore, config: Option<&Path>) -> Result<()> {
    let resource = load_harness_config(config)?;
    let working_dir = std::env::current_dir().context("Failed to resolve working directory")?;

    let spec = build_bootstrap_spec(BootstrapSources {
        resource: &resource,
        defaults: store.k3s_defaults(),
        working_dir: &working_dir,
    })
    .map_err(diagnostic)?;

    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

async fn cmd_apply(
    store: Arc<ProviderStore>,
    name: &str,
    seed: &str,
    config: Option<&Path>,
    features: Vec<Feature>,
    state_path: Option<&Path>,
) -> Result<ApplyOutput> {
    let resource = load_harness_config(config)?;
    let prior_state: Option<HarnessState> = match state_path {
        Some(path) if path.exists() => Some(read_json_file(path)?),
        _ => None,
    };

    let controller = HarnessController::new(Arc::clone(&store));
    let binding = FeatureBinding::new(store);

    let outcome = controller
        .plan(PlanRequest {
            name: name.to_string(),
            inventory: Seed::from(seed),
            prior_state,
        })
        .await
        .map_err(diagnostic)?;

    let planned = match outcome {
        PlanOutcome::Unchanged(prior) => {
            info!(harness = %prior.id, "harness already applied");
            let state = controller.read(prior);
            return Ok(ApplyOutput {
                attached: false,
                state,
                diagnostics: Vec::new(),
            });
        }
        PlanOutcome::Planned { state, .. } => state,
    };

    for feature in features {
        binding
            .register(&planned, feature)
            .await
            .map_err(diagnostic)?;
    }

    let created = controller
        .create(&planned, &resource)
        .await
        .map_err(diagnostic)?;
    for diag in &created.diagnostics {
        eprintln!("{diag}");
    }

    let attached = match binding.attach(&created.state).map_err(diagnostic)? {
        Attachment::Running(handle) => {
            info!(harness = %handle.id(), "features attached");
            true
        }
        Attachment::Skipped => false,
    };

    if let Some(path) = state_path {
        std::fs::write(path, serde_json::to_vec_pretty(&created.state)?)
            .context(format!("Failed to write state to {:?}", path))?;
    }

    Ok(ApplyOutput {
        state: created.state,
        attached,
        diagnostics: created.diagnostics,
    })
}

async fn cmd_inventory(store: &ProviderStore, seed: &str) -> Result<()> {
    let inventory = store.inventory(&Seed::from(seed));
    let harnesses = inventory.harnesses().await?;
    if harnesses.is_empty() {
        bail!("No harnesses recorded for seed {:?}", seed);
    }

    for harness in harnesses {
        println!("{}", harness);
        for feature in inventory.get_features(&harness).await? {
            let labels: Vec<String> = feature
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            println!("  {} [{}]", feature.name, labels.join(","));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_with_labels() {
        let feature = parse_feature("smoke:env=prod,team=infra").unwrap();
        assert_eq!(feature.name, "smoke");
        assert_eq!(feature.labels.get("env").map(String::as_str), Some("prod"));
        assert_eq!(feature.labels.get("team").map(String::as_str), Some("infra"));
    }

    #[test]
    fn test_parse_feature_rejects_malformed() {
        assert!(parse_feature("smoke").unwrap().labels.is_empty());
        assert!(parse_feature(":env=prod").is_err());
        assert!(parse_feature("smoke:env").is_err());
        assert!(parse_feature("smoke:=prod").is_err());
    }

    #[tokio::test]
    async fn test_apply_skips_on_label_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let provider = dir.path().join("provider.json");
        std::fs::write(&provider, r#"{"labels": {"env": "prod"}}"#).unwrap();

        let store = build_store(Some(provider.as_path()), None).unwrap();
        let output = cmd_apply(
            store,
            "k3s",
            "abc",
            None,
            vec![parse_feature("smoke:env=dev").unwrap()],
            None,
        )
        .await
        .unwrap();

        assert!(output.state.skipped);
        assert!(!output.attached);
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_writes_state_and_reapply_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let inventory_dir = dir.path().join("inventory");

        let store = build_store(None, Some(inventory_dir.as_path())).unwrap();
        let first = cmd_apply(store, "k3s", "abc", None, vec![], Some(state_path.as_path()))
            .await
            .unwrap();
        assert!(first.attached);
        assert_eq!(first.state.id.as_str(), "k3s-ba7816bf8f01");

        let store = build_store(None, Some(inventory_dir.as_path())).unwrap();
        let second = cmd_apply(store, "k3s", "abc", None, vec![], Some(state_path.as_path()))
            .await
            .unwrap();
        assert!(!second.attached);
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn test_missing_provider_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_store(Some(dir.path().join("absent.json").as_path()), None).unwrap_err();
        assert!(err.to_string().contains("invalid provider data"));
    }
}
