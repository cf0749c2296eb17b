// ABOUTME: Runtime handle that connects on first use.
// ABOUTME: Lets dry runs and config errors finish without touching a socket.

use super::bollard::BollardRuntime;
use super::detection::detect_runtime;
use super::error::RuntimeError;
use super::traits::sealed::Sealed;
use super::traits::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSummary, ImageError, ImageOps,
    ImageSummary, RegistryAuth, RuntimeInfo,
};
use super::types::RuntimeConfig;
use crate::types::StatusRecord;
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// A [`BollardRuntime`] that is detected, connected and pinged on first use.
pub struct LazyRuntime {
    config: RuntimeConfig,
    inner: OnceCell<BollardRuntime>,
}

impl LazyRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    /// Whether a connection has been established yet.
    pub fn is_connected(&self) -> bool {
        self.inner.initialized()
    }

    /// Get the connected runtime, connecting if needed.
    pub async fn get(&self) -> Result<&BollardRuntime, RuntimeError> {
        self.inner
            .get_or_try_init(|| async {
                let info = detect_runtime(&self.config)?;
                tracing::info!(
                    runtime = %info.runtime_type,
                    socket = %info.socket_path,
                    "connecting to container runtime"
                );
                let runtime = BollardRuntime::connect(&info)?;
                runtime.ping().await?;
                Ok::<_, RuntimeError>(runtime)
            })
            .await
    }

    async fn images(&self) -> Result<&BollardRuntime, ImageError> {
        self.get()
            .await
            .map_err(|e| ImageError::Runtime(e.to_string()))
    }
}

impl Sealed for LazyRuntime {}

#[async_trait]
impl ImageOps for LazyRuntime {
    async fn pull_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        self.images().await?.pull_image(repository, tag, auth).await
    }

    async fn inspect_image(&self, name: &str) -> Result<Option<ImageSummary>, ImageError> {
        self.images().await?.inspect_image(name).await
    }

    async fn tag_image(&self, image: &ImageSummary, target: &str) -> Result<bool, ImageError> {
        self.images().await?.tag_image(image, target).await
    }

    async fn push_image(
        &self,
        repository: &str,
        tag: &str,
        auth: Option<&RegistryAuth>,
    ) -> Result<Vec<StatusRecord>, ImageError> {
        self.images().await?.push_image(repository, tag, auth).await
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, ImageError> {
        self.images().await?.list_images().await
    }

    async fn remove_image(&self, name_or_id: &str, force: bool) -> Result<(), ImageError> {
        self.images().await?.remove_image(name_or_id, force).await
    }
}

#[async_trait]
impl ContainerOps for LazyRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        self.get()
            .await
            .map_err(|e| ContainerError::Runtime(e.to_string()))?
            .list_containers(filters)
            .await
    }
}
