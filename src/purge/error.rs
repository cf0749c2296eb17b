// ABOUTME: Error types for purging local images.
// ABOUTME: Listing and removal failures are fatal; a missing image is not an error.

use crate::runtime::{ContainerError, ImageError};
use crate::types::InvalidIdentifierError;

#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    /// A malformed image id was given.
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifierError),

    #[error("failed to list images: {0}")]
    ListImages(#[source] ImageError),

    #[error("failed to list containers: {0}")]
    ListContainers(#[from] ContainerError),

    #[error("failed to look up image {name}: {source}")]
    Lookup { name: String, source: ImageError },

    /// The image is busy or vanished while being removed.
    #[error("failed to remove image {image}: {source}")]
    RemovalFailure { image: String, source: ImageError },
}
