//! Unified error handling for Thermowire
//!
//! This crate provides the error types shared by every Thermowire component.
//! `LookupError` is the small, copyable taxonomy returned by the sensor
//! accessors; `ThermowireError` covers everything else (files, JSON,
//! configuration).

use std::io;
use std::path::PathBuf;

/// Result type alias using ThermowireError
pub type Result<T> = std::result::Result<T, ThermowireError>;

/// Outcome of resolving a sensor through the flattened index space.
///
/// Success is `Ok(_)`; these are the only failure kinds an accessor reports.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupError {
    #[error("sensor index is out of range")]
    IndexOutOfRange,

    #[error("sensor name not found")]
    NameNotFound,

    #[error("sensor address not found")]
    AddressNotFound,
}

/// Unified error type for all Thermowire operations
#[derive(thiserror::Error, Debug)]
pub enum ThermowireError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("Failed to open {path} for writing: {source}")]
    FileOpen {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to serialize JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    // ============================================================================
    // Sensor Errors
    // ============================================================================
    #[error("Invalid device address: {0}")]
    InvalidAddress(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },
}

impl ThermowireError {
    /// Create an invalid configuration value error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(input: impl Into<String>) -> Self {
        Self::InvalidAddress(input.into())
    }

    /// True for the file errors raised while persisting data.
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileOpen { .. } | Self::FileWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_display() {
        assert_eq!(LookupError::IndexOutOfRange.to_string(), "sensor index is out of range");
        assert_eq!(LookupError::NameNotFound.to_string(), "sensor name not found");
        assert_eq!(LookupError::AddressNotFound.to_string(), "sensor address not found");
    }

    #[test]
    fn test_address_error_is_not_a_file_error() {
        let err = ThermowireError::invalid_address("40.1");
        assert_eq!(err.to_string(), "Invalid device address: 40.1");
        assert!(!err.is_file_error());
    }

    #[test]
    fn test_file_open_message_names_path() {
        let err = ThermowireError::FileOpen {
            path: PathBuf::from("/data/names.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/data/names.json"));
        assert!(err.is_file_error());
    }

    #[test]
    fn test_helpers() {
        let err = ThermowireError::invalid_config("interval_ms", "too short");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for interval_ms: too short"
        );
        assert!(!err.is_file_error());
    }
}
