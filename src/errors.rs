//! Error Types
//!
//! This module defines the error types used throughout the editor core.
//!
//! # Overview
//!
//! The main error type [`EditorError`] covers all failure modes including:
//! - Storage downloads and conversion-service calls
//! - Model decoding and export serialization
//! - Configuration and I/O errors
//!
//! None of these are fatal to an editor session. Operations that mutate the
//! scene catch them at their boundary and keep the rendered message as state.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, EditorError>`.
//!
//! ```rust,ignore
//! use animsync::errors::{EditorError, Result};
//!
//! fn fetch() -> Result<Vec<u8>> {
//!     Err(EditorError::Download("bucket not found".into()))
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

/// The main error type for the editor core.
#[derive(Error, Debug)]
pub enum EditorError {
    // ========================================================================
    // Loading Errors
    // ========================================================================
    /// The storage collaborator failed or returned no data.
    #[error("Failed to download file: {0}")]
    Download(String),

    /// The conversion service answered with a non-success status.
    #[error("Failed to convert model: {reason}")]
    Conversion {
        /// Reason reported by the service, or the HTTP status text.
        reason: String,
    },

    /// The conversion service did not answer within the configured timeout.
    #[error("Failed to convert model: no response after {0:?}")]
    ConversionTimeout(Duration),

    /// Bytes were fetched but could not be decoded into a scene subtree.
    #[error("Failed to parse model: {0}")]
    Parse(String),

    /// The file extension is not one the editor accepts.
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// A model URL could not be resolved into a bucket and a path.
    #[error("Invalid model source: {0}")]
    InvalidSource(String),

    // ========================================================================
    // Export Errors
    // ========================================================================
    /// Serialization of the current model failed.
    #[error("Failed to export model: {0}")]
    Export(String),

    // ========================================================================
    // HTTP & Network Errors
    // ========================================================================
    /// Transport-level failure (connection refused, DNS, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status} {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Status text or body excerpt
        message: String,
    },

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // ========================================================================
    // I/O & Configuration Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid settings value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EditorError {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Only transport failures and timeouts qualify; a service that answered
    /// with a reason will answer the same way again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::ConversionTimeout(_))
    }

    /// Whether this failure should leave a fallback placeholder in the scene.
    #[must_use]
    pub fn shows_placeholder(&self) -> bool {
        matches!(
            self,
            Self::Download(_) | Self::Parse(_) | Self::Base64(_) | Self::InvalidSource(_)
        )
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<gltf::Error> for EditorError {
    fn from(err: gltf::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<image::ImageError> for EditorError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

/// Alias for `Result<T, EditorError>`.
pub type Result<T> = std::result::Result<T, EditorError>;
