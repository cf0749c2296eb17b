// ABOUTME: Batch spec parsing and source/destination image resolution.
// ABOUTME: Handles specs like app, app:tag, vendor/app:tag, localhost:5000/app.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageSpecError {
    #[error("image spec cannot be empty")]
    Empty,

    #[error("invalid character in image spec: {0:?}")]
    InvalidChar(char),

    #[error("image name is empty in spec: {0}")]
    EmptyName(String),

    #[error("tag is empty in spec: {0}")]
    EmptyTag(String),
}

/// A parsed batch entry: `[path/domain/]name[:tag]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    raw: String,
    path_domain: Option<String>,
    name: String,
    tag: String,
}

impl ImageSpec {
    pub fn parse(input: &str) -> Result<Self, ParseImageSpecError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageSpecError::Empty);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_') {
                return Err(ParseImageSpecError::InvalidChar(c));
            }
        }

        // Split on the last colon unless what follows is a path (registry port)
        let (repo, tag) = match input.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, after),
            _ => (input, DEFAULT_TAG),
        };

        if tag.is_empty() {
            return Err(ParseImageSpecError::EmptyTag(input.to_string()));
        }

        let (path_domain, name) = match repo.rsplit_once('/') {
            Some((domain, name)) => (Some(domain), name),
            None => (None, repo),
        };

        if name.is_empty() {
            return Err(ParseImageSpecError::EmptyName(input.to_string()));
        }

        Ok(Self {
            raw: input.to_string(),
            path_domain: path_domain.filter(|d| !d.is_empty()).map(str::to_string),
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    /// The spec as written, trimmed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn path_domain(&self) -> Option<&str> {
        self.path_domain.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The namespace implied by the path: its final segment.
    fn namespace(&self) -> Option<&str> {
        self.path_domain
            .as_deref()
            .and_then(|d| d.rsplit('/').next())
            .filter(|ns| !ns.is_empty())
    }
}

impl fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Which side of the transfer the configured registry sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Mirror images named by their path into the configured registry.
    #[default]
    ToRegistry,
    /// Pull images out of the configured registry and retag them by their path.
    FromRegistry,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::ToRegistry => write!(f, "to-registry"),
            SyncDirection::FromRegistry => write!(f, "from-registry"),
        }
    }
}

/// Registry side of a sync: domain, optional namespace override, direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryContext {
    pub registry: String,
    pub namespace: Option<String>,
    pub direction: SyncDirection,
}

impl RegistryContext {
    pub fn new(registry: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            registry: registry.into(),
            namespace: namespace.filter(|ns| !ns.trim().is_empty()),
            direction: SyncDirection::default(),
        }
    }

    pub fn direction(mut self, direction: SyncDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Domain of the image on the registry side.
    ///
    /// An explicit namespace wins; otherwise the last segment of the spec's
    /// path is reused as the namespace.
    fn registry_domain(&self, spec: &ImageSpec) -> String {
        let registry = self.registry.trim_end_matches('/');
        match (self.namespace.as_deref(), spec.namespace()) {
            (Some(ns), _) | (None, Some(ns)) => format!("{registry}/{ns}"),
            (None, None) => registry.to_string(),
        }
    }
}

/// One image addressed in two registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    image_name: String,
    source_domain: Option<String>,
    dest_domain: Option<String>,
    tag: String,
    dry_run: bool,
}

impl ImageReference {
    pub fn new(
        source_domain: Option<&str>,
        dest_domain: Option<&str>,
        image_name: &str,
        tag: &str,
    ) -> Result<Self, ParseImageSpecError> {
        if image_name.is_empty() {
            return Err(ParseImageSpecError::EmptyName(image_name.to_string()));
        }
        if tag.is_empty() {
            return Err(ParseImageSpecError::EmptyTag(image_name.to_string()));
        }

        let domain = |d: Option<&str>| {
            d.map(|d| d.trim_matches('/'))
                .filter(|d| !d.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            image_name: image_name.to_string(),
            source_domain: domain(source_domain),
            dest_domain: domain(dest_domain),
            tag: tag.to_string(),
            dry_run: false,
        })
    }

    /// Resolve a batch spec against the registry context.
    pub fn resolve(spec: &ImageSpec, context: &RegistryContext) -> Self {
        let registry_domain = context.registry_domain(spec);
        let (source, dest) = match context.direction {
            SyncDirection::ToRegistry => (
                spec.path_domain().map(str::to_string),
                Some(registry_domain),
            ),
            SyncDirection::FromRegistry => (
                Some(registry_domain),
                spec.path_domain().map(str::to_string),
            ),
        };

        Self {
            image_name: spec.name().to_string(),
            source_domain: source.filter(|d| !d.is_empty()),
            dest_domain: dest.filter(|d| !d.is_empty()),
            tag: spec.tag().to_string(),
            dry_run: false,
        }
    }

    /// Mark this reference for simulation. Only meaningful at construction.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn source_domain(&self) -> Option<&str> {
        self.source_domain.as_deref()
    }

    pub fn dest_domain(&self) -> Option<&str> {
        self.dest_domain.as_deref()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn source_repo(&self) -> String {
        join_repo(self.source_domain.as_deref(), &self.image_name)
    }

    pub fn dest_repo(&self) -> String {
        join_repo(self.dest_domain.as_deref(), &self.image_name)
    }

    pub fn source_name(&self) -> String {
        format!("{}:{}", self.source_repo(), self.tag)
    }

    pub fn dest_name(&self) -> String {
        format!("{}:{}", self.dest_repo(), self.tag)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_name(), self.dest_name())
    }
}

fn join_repo(domain: Option<&str>, name: &str) -> String {
    match domain {
        Some(domain) => format!("{domain}/{name}"),
        None => name.to_string(),
    }
}
