//! Error types for the device adapter crate.

use accel_sched_core::{CodecError, CoreError};
use thiserror::Error;

/// Errors that can occur in device adapter operations.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// A required node annotation is absent.
    #[error("annotation {key} not found on node {node}")]
    AnnotationNotFound {
        /// Node name.
        node: String,
        /// Missing annotation key.
        key: String,
    },

    /// A node annotation is present but malformed.
    #[error("failed to decode devices on node {node}: {source}")]
    Decode {
        /// Node name.
        node: String,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// The node registered the family but advertises no devices.
    #[error("no devices found on node {node}")]
    NoDevices {
        /// Node name.
        node: String,
    },

    /// The device family has no registered annotation keys.
    #[error("device family not registered: {0}")]
    UnregisteredFamily(String),

    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    KubeApi(#[from] kube::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A node annotation patch was rejected.
    #[error("Node patch failed: {0}")]
    PatchFailed(String),
}

impl DeviceError {
    /// Whether the caller should simply skip this node for the family.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::AnnotationNotFound { .. } | Self::NoDevices { .. })
    }

    /// Whether the error points at unreadable node state worth alerting on.
    #[must_use]
    pub fn is_corrupt_state(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<CoreError> for DeviceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnregisteredFamily(family) => Self::UnregisteredFamily(family),
            CoreError::Codec(source) => Self::Decode {
                node: String::new(),
                source,
            },
        }
    }
}

/// A specialized Result type for device adapter operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let not_found = DeviceError::AnnotationNotFound {
            node: "node-a".to_string(),
            key: "hami.io/node-dcu-register".to_string(),
        };
        let empty = DeviceError::NoDevices {
            node: "node-a".to_string(),
        };
        let corrupt = DeviceError::Decode {
            node: "node-a".to_string(),
            source: CodecError::MissingDelimiter(':'),
        };

        assert!(not_found.is_skippable());
        assert!(empty.is_skippable());
        assert!(!corrupt.is_skippable());

        assert!(corrupt.is_corrupt_state());
        assert!(!not_found.is_corrupt_state());
        assert!(!empty.is_corrupt_state());
    }

    #[test]
    fn decode_error_keeps_cause() {
        let err = DeviceError::Decode {
            node: "node-a".to_string(),
            source: CodecError::MissingDelimiter(':'),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "annotation payload has no ':' delimiter");
    }

    #[test]
    fn patch_failure_is_not_node_state() {
        let err = DeviceError::PatchFailed("forbidden".to_string());
        assert!(!err.is_skippable());
        assert!(!err.is_corrupt_state());
        assert_eq!(err.to_string(), "Node patch failed: forbidden");
    }

    #[test]
    fn from_core_error() {
        let err: DeviceError = CoreError::UnregisteredFamily("DCU".to_string()).into();
        assert!(matches!(err, DeviceError::UnregisteredFamily(f) if f == "DCU"));
    }
}
