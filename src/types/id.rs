// ABOUTME: Phantom-typed identifiers for compile-time type safety.
// ABOUTME: Prevents mixing image and container IDs; normalizes image digests.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use thiserror::Error;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum ContainerMarker {}
pub enum ImageMarker {}

/// Digest algorithm prefix used by the runtime for image IDs.
pub const DIGEST_PREFIX: &str = "sha256:";

/// Shortest accepted identifier, prefix included.
pub const MIN_IDENTIFIER_LEN: usize = 19;

/// A type-safe identifier that prevents accidental mixing of different ID types.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

pub type ContainerId = Id<ContainerMarker>;
pub type ImageId = Id<ImageMarker>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("image id is too short: {padded}")]
pub struct InvalidIdentifierError {
    /// The offending id, padded with `?` to the minimum length.
    pub padded: String,
}

impl Id<ImageMarker> {
    /// Normalize a possibly truncated image id into digest form.
    ///
    /// `abcd1234...` becomes `sha256:abcd1234...`. Ids shorter than
    /// [`MIN_IDENTIFIER_LEN`] after prefixing are rejected.
    pub fn normalize(raw: &str) -> Result<Self, InvalidIdentifierError> {
        let raw = raw.trim();
        let value = if raw.starts_with(DIGEST_PREFIX) {
            raw.to_string()
        } else {
            format!("{DIGEST_PREFIX}{raw}")
        };

        if value.len() < MIN_IDENTIFIER_LEN {
            return Err(InvalidIdentifierError {
                padded: format!("{value:?<width$}", width = MIN_IDENTIFIER_LEN),
            });
        }

        Ok(Self::new(value))
    }

    /// Short form used in human-facing output: the prefix plus ten hex digits.
    pub fn short(&self) -> &str {
        let end = if self.value.starts_with(DIGEST_PREFIX) {
            DIGEST_PREFIX.len() + 10
        } else {
            10
        };
        self.value.get(..end).unwrap_or(&self.value)
    }

    /// Whether this id starts with the given (normalized) prefix.
    pub fn matches_prefix(&self, prefix: &ImageId) -> bool {
        self.value.starts_with(prefix.as_str())
    }
}
