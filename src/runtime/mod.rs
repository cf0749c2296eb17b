// ABOUTME: Container runtime access for Docker and Podman.
// ABOUTME: Capability traits, bollard adapter, lazy connection and detection.

mod bollard;
mod detection;
mod error;
#[cfg(test)]
pub(crate) mod fake;
mod lazy;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local, detect_runtime};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use lazy::LazyRuntime;
pub use traits::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSummary, FullRuntime, ImageError,
    ImageOps, ImageSummary, RegistryAuth, RuntimeInfoError,
};
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};
