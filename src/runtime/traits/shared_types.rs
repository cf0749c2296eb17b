// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ImageSummary, RegistryAuth and the dangling-tag convention.

use crate::types::ImageId;
use serde::Deserialize;

/// Placeholder tag some runtimes report for untagged images.
pub const NONE_TAG: &str = "<none>:<none>";

/// A local image as seen by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// Full image id (`sha256:...`).
    pub id: ImageId,
    /// Repository tags (`repo:tag`).
    pub tags: Vec<String>,
}

impl ImageSummary {
    pub fn new(id: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: ImageId::new(id),
            tags,
        }
    }

    /// An image with no real tags.
    pub fn is_dangling(&self) -> bool {
        self.tags.iter().all(|t| t == NONE_TAG)
    }

    pub fn short_id(&self) -> &str {
        self.id.short()
    }
}

/// Registry authentication credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryAuth {
    /// Username.
    pub username: String,
    /// Password or token.
    pub password: String,
    /// Registry server (e.g., "ghcr.io"). `None` sends the credentials everywhere.
    #[serde(default)]
    pub server: Option<String>,
}

impl RegistryAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            server: None,
        }
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Whether these credentials belong to the registry hosting `repository`.
    pub fn applies_to(&self, repository: &str) -> bool {
        match &self.server {
            Some(server) => registry_host(server) == repository_host(repository),
            None => true,
        }
    }
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

/// Host of the registry that serves `repository` (`docker.io` when unqualified).
pub fn repository_host(repository: &str) -> &str {
    match repository.split_once('/') {
        Some((first, _)) if first.contains(['.', ':']) || first == "localhost" => first,
        _ => DEFAULT_REGISTRY,
    }
}

/// Strip scheme and path from a server address, e.g. `https://index.docker.io/v1/`.
pub fn registry_host(server: &str) -> &str {
    let host = server
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = host.split('/').next().unwrap_or(host);
    match host {
        "index.docker.io" | "registry-1.docker.io" => DEFAULT_REGISTRY,
        other => other,
    }
}

/// Registry that unqualified image names resolve to.
pub const DEFAULT_REGISTRY: &str = "docker.io";
