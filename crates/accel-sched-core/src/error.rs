//! Common error types for accel-sched.
//!
//! This module provides the codec and registry errors shared by every
//! device adapter crate.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Structural failures while decoding an annotation payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload has none of the expected record delimiters.
    #[error("annotation payload has no '{0}' delimiter")]
    MissingDelimiter(char),

    /// A record has the wrong number of fields.
    #[error("expected {expected} fields, got {got} in segment {segment:?}")]
    FieldCount {
        /// Number of fields the format requires.
        expected: usize,
        /// Number of fields found.
        got: usize,
        /// The offending record.
        segment: String,
    },
}

/// Core errors that can occur throughout accel-sched.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No annotation keys were registered for the device family.
    #[error("device family not registered: {0}")]
    UnregisteredFamily(String),

    /// An annotation payload could not be decoded.
    #[error("decode error: {0}")]
    Codec(#[from] CodecError),
}
