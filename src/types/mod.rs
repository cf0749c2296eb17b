// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Image references, batch specs, status records and runtime IDs.

mod id;
mod image_ref;
mod status;

pub use id::{
    ContainerId, DIGEST_PREFIX, ImageId, InvalidIdentifierError, MIN_IDENTIFIER_LEN,
};
pub use image_ref::{
    DEFAULT_TAG, ImageReference, ImageSpec, ParseImageSpecError, RegistryContext, SyncDirection,
};
pub use status::{StatusRecord, parse_status_stream};
