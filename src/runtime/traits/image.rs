// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Pull, inspect, tag, push, list and remove container images.

use super::sealed::Sealed;
use super::shared_types::{ImageSummary, RegistryAuth};
use crate::types::StatusRecord;
use async_trait::async_trait;

/// Image operations against the local image store and remote registries.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Pull `repository:tag` from its registry.
    async fn pull_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError>;

    /// Look up a local image by name or id. `None` if it does not exist.
    async fn inspect_image(&self, name: &str) -> Result<Option<ImageSummary>, ImageError>;

    /// Add `target` (`repo:tag`) as an extra tag on an image.
    async fn tag_image(&self, image: &ImageSummary, target: &str) -> Result<bool, ImageError>;

    /// Push `repository:tag`, returning the status records in stream order.
    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<Vec<StatusRecord>, ImageError>;

    /// List top-level local images.
    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError>;

    /// Remove an image by name or id.
    async fn remove_image(&self, name_or_id: &str, force: bool) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("tag not found: {0}")]
    InvalidTag(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("tag failed: {0}")]
    TagFailed(String),

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
