// ABOUTME: Registry credentials taken from the Docker client config file.
// ABOUTME: Reads `auths[<registry>]` from config.json when sync.yml has no auth block.

use crate::runtime::traits::{RegistryAuth, registry_host};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DOCKER_CONFIG_FILENAME: &str = "config.json";

#[derive(Debug, Default, Deserialize)]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// `$DOCKER_CONFIG/config.json`, else `~/.docker/config.json`.
pub fn docker_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("DOCKER_CONFIG") {
        return Some(PathBuf::from(dir).join(DOCKER_CONFIG_FILENAME));
    }
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".docker")
            .join(DOCKER_CONFIG_FILENAME)
    })
}

/// Credentials stored for `registry` in a Docker config file, if any.
///
/// A missing or unreadable file means anonymous access, not an error.
pub fn load_docker_auth(path: &Path, registry: &str) -> Option<RegistryAuth> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no docker client config");
            return None;
        }
    };
    lookup_docker_auth(&content, registry)
}

/// Credentials for `registry` in a Docker `config.json` document.
///
/// Server keys are compared by host, so `https://reg.example.com/v2/`
/// matches `reg.example.com`. Entries that only name a credential helper
/// carry no secret and are skipped.
pub fn lookup_docker_auth(content: &str, registry: &str) -> Option<RegistryAuth> {
    let file: DockerConfigFile = match serde_json::from_str(content) {
        Ok(file) => file,
        Err(e) => {
            debug!(error = %e, "ignoring malformed docker client config");
            return None;
        }
    };

    let wanted = registry_host(registry);
    let entry = file
        .auths
        .iter()
        .find(|(server, _)| registry_host(server) == wanted)
        .map(|(_, entry)| entry)?;

    let (username, password) = match (&entry.username, &entry.password) {
        (Some(username), Some(password)) => (username.clone(), password.clone()),
        _ => decode_basic(entry.auth.as_deref()?)?,
    };

    debug!(registry, username = %username, "using docker client credentials");
    Some(RegistryAuth::new(username, password).server(registry))
}

/// Decode a base64 `user:password` pair.
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
