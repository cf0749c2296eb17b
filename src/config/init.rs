// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates sync.yml template files.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

/// Write a starter `sync.yml` into `dir` and return its path.
pub fn init_config(dir: &Path, registry: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(r) = registry {
        let r = r.trim().trim_end_matches('/');
        if r.is_empty() {
            return Err(Error::InvalidConfig("registry cannot be empty".to_string()));
        }
        config.registry = r.to_string();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(config_path)
}

fn generate_template_yaml(config: &Config) -> String {
    let images: String = config
        .images
        .iter()
        .map(|image| format!("  - {image}\n"))
        .collect();

    format!(
        r#"registry: {}
# namespace: team
# direction: to-registry   # or from-registry
images:
{}# runtime: docker          # or podman; detected when unset
# socket: /var/run/docker.sock
# dry_run_delay: 200ms
# auth:                    # else read from ~/.docker/config.json
#   username: ci
#   password: change-me
"#,
        config.registry, images
    )
}
