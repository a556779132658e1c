//! # Manifest Errors

use thiserror::Error;

/// Error type for manifest transformations
///
/// The engine is a pure transformation: every error is fatal for the call
/// and no partial output is produced.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to decode YAML manifest: {0}")]
    Decode(#[source] serde_yaml::Error),
    #[error("Failed to encode YAML manifest: {0}")]
    Encode(#[source] serde_yaml::Error),
}

impl ManifestError {
    /// Check if the input could not be parsed
    pub fn is_decode(&self) -> bool {
        matches!(self, ManifestError::Decode(_))
    }

    /// Check if a tree could not be serialized back to bytes
    pub fn is_encode(&self) -> bool {
        matches!(self, ManifestError::Encode(_))
    }
}
