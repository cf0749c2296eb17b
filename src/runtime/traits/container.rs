// ABOUTME: Container listing trait for container runtimes.
// ABOUTME: Only what is needed to tell whether an image is in use.

use super::sealed::Sealed;
use crate::types::{ContainerId, ImageId};
use async_trait::async_trait;

/// Container queries.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Include stopped containers.
    pub all: bool,
}

impl ContainerFilters {
    /// Running and stopped containers alike.
    pub fn all() -> Self {
        Self { all: true }
    }
}

/// Summary information about a container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    /// Container ID.
    pub id: ContainerId,
    /// Container name, without the leading slash.
    pub name: String,
    /// Full id of the backing image.
    pub image_id: ImageId,
    /// Current state.
    pub state: String,
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("runtime error: {0}")]
    Runtime(String),
}
