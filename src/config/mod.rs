// ABOUTME: Configuration types and parsing for sync.yml.
// ABOUTME: Handles YAML parsing, file discovery and CLI override merging.

mod credentials;
mod init;

pub use credentials::{
    DOCKER_CONFIG_FILENAME, docker_config_path, load_docker_auth, lookup_docker_auth,
};
pub use init::init_config;

use crate::error::{Error, Result};
use crate::runtime::{RegistryAuth, RuntimeConfig, RuntimeType};
use crate::sync::SyncOptions;
use crate::types::{RegistryContext, SyncDirection};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "sync.yml";
pub const CONFIG_FILENAME_ALT: &str = "sync.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".image-sync/config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Registry host (and optional port) on the registry side of the sync.
    #[serde(deserialize_with = "deserialize_registry")]
    pub registry: String,

    /// Overrides the namespace taken from each image path.
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub direction: SyncDirection,

    /// Batch entries, synced in order.
    #[serde(deserialize_with = "deserialize_images")]
    pub images: NonEmpty<String>,

    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,

    /// Pause before each simulated stage in dry-run mode.
    #[serde(default, with = "humantime_serde")]
    pub dry_run_delay: Option<Duration>,

    /// Login for `registry`. Without it, the Docker client config is consulted.
    #[serde(default)]
    pub auth: Option<RegistryAuth>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Registry side of every entry in the batch.
    pub fn context(&self) -> RegistryContext {
        RegistryContext::new(self.registry.clone(), self.namespace.clone())
            .direction(self.direction)
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            runtime: self.runtime,
            socket: self.socket.clone(),
        }
    }

    /// Explicit `auth` block, scoped to `registry` unless it names a server.
    pub fn explicit_auth(&self) -> Option<RegistryAuth> {
        self.auth.clone().map(|auth| RegistryAuth {
            server: Some(auth.server.unwrap_or_else(|| self.registry.clone())),
            ..auth
        })
    }

    /// Credentials for `registry`: the `auth` block, else the Docker client config.
    pub fn registry_auth(&self) -> Option<RegistryAuth> {
        self.explicit_auth().or_else(|| {
            docker_config_path().and_then(|path| load_docker_auth(&path, &self.registry))
        })
    }

    /// Dry runs never talk to a registry, so they skip the credential lookup.
    pub fn sync_options(&self, dry_run: bool) -> SyncOptions {
        SyncOptions {
            dry_run,
            dry_run_delay: self.dry_run_delay.unwrap_or_default(),
            auth: if dry_run { None } else { self.registry_auth() },
        }
    }

    pub fn template() -> Self {
        Config {
            registry: "registry.example.com".to_string(),
            namespace: None,
            direction: SyncDirection::default(),
            images: NonEmpty {
                head: "library/alpine:3.20".to_string(),
                tail: vec!["library/busybox".to_string()],
            },
            runtime: None,
            socket: None,
            dry_run_delay: None,
            auth: None,
        }
    }
}

// Custom deserializers

fn deserialize_registry<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let trimmed = s.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(serde::de::Error::custom("registry cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn deserialize_images<'de, D>(deserializer: D) -> std::result::Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let images: Vec<String> = values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    NonEmpty::from_vec(images)
        .ok_or_else(|| serde::de::Error::custom("at least one image is required"))
}
