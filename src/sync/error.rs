// ABOUTME: Error types for the pull -> tag -> push pipeline.
// ABOUTME: Every variant aborts one batch entry, never the batch.

use crate::runtime::ImageError;
use crate::types::ParseImageSpecError;

/// Why a single batch entry was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The batch spec could not be parsed.
    #[error("invalid image reference: {0}")]
    InvalidReference(#[from] ParseImageSpecError),

    /// Source repository does not exist.
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// Source repository exists but the tag does not.
    #[error("invalid tag <{0}>")]
    InvalidTag(String),

    /// Any other pull error.
    #[error("pull failed: {0}")]
    PullFailure(String),

    /// The local retag did not complete.
    #[error("tag failed: {0}")]
    TagFailure(String),

    /// Network, auth or registry-side push rejection.
    #[error("push failed: {0}")]
    PushFailure(String),
}

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Pull,
    Tag,
    Push,
}

impl SyncError {
    pub fn stage(&self) -> Stage {
        match self {
            SyncError::InvalidReference(_) => Stage::Resolve,
            SyncError::ImageNotFound(_) | SyncError::InvalidTag(_) | SyncError::PullFailure(_) => {
                Stage::Pull
            }
            SyncError::TagFailure(_) => Stage::Tag,
            SyncError::PushFailure(_) => Stage::Push,
        }
    }

    /// Map a runtime pull error; `tag` is reported for missing tags.
    pub(crate) fn from_pull(err: ImageError, tag: &str) -> Self {
        match err {
            ImageError::NotFound(name) => SyncError::ImageNotFound(name),
            ImageError::InvalidTag(_) => SyncError::InvalidTag(tag.to_string()),
            other => SyncError::PullFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_errors_map_by_kind() {
        let err = SyncError::from_pull(ImageError::NotFound("app:1".into()), "1");
        assert!(matches!(err, SyncError::ImageNotFound(_)));

        let err = SyncError::from_pull(ImageError::InvalidTag("app:nope".into()), "nope");
        assert_eq!(err.to_string(), "invalid tag <nope>");

        let err = SyncError::from_pull(ImageError::Runtime("socket closed".into()), "1");
        assert!(matches!(err, SyncError::PullFailure(msg) if msg.contains("socket closed")));
    }

    #[test]
    fn stages() {
        assert_eq!(SyncError::TagFailure("x".into()).stage(), Stage::Tag);
        assert_eq!(SyncError::PushFailure("x".into()).stage(), Stage::Push);
        assert_eq!(
            SyncError::InvalidReference(ParseImageSpecError::Empty).stage(),
            Stage::Resolve
        );
    }
}
