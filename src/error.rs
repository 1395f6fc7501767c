// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the quoting pipeline
//!
//! Every stage returns [`QuoteResult`]. Each variant carries the offending
//! value so callers can build user-facing messages without parsing strings,
//! and [`QuoteError::kind`] gives a stable code for programmatic handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline stages
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Errors produced by the decode → normalize → analyze → price pipeline
#[derive(Debug, Error)]
pub enum QuoteError {
    /// File extension is not one of the recognized formats
    #[error("unsupported format: {extension:?} (expected stl, 3mf or obj)")]
    UnsupportedFormat { extension: String },

    /// Material key is not in the material table
    #[error("unknown material: {key:?}")]
    UnknownMaterial { key: String },

    /// Scale factor is not a finite positive number
    #[error("invalid scale factor: {scale}")]
    InvalidScale { scale: f64 },

    /// Packaged file is not a readable ZIP archive
    #[error("invalid archive: {reason}")]
    InvalidArchive { reason: String },

    /// Archive contains no model part
    #[error("archive contains no model part")]
    NoModelPart,

    /// Decoding produced no vertices or no triangles
    #[error("file contains no geometry")]
    NoGeometry,

    /// Content of a supported format could not be decoded
    #[error("malformed {format} file: {details}")]
    MalformedFile { format: String, details: String },

    /// Geometric measurement failed (empty or non-finite input)
    #[error("computation error: {reason}")]
    ComputationError { reason: String },
}

/// Machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    UnknownMaterial,
    InvalidScale,
    InvalidArchive,
    NoModelPart,
    NoGeometry,
    MalformedFile,
    ComputationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::UnknownMaterial => "unknown_material",
            ErrorKind::InvalidScale => "invalid_scale",
            ErrorKind::InvalidArchive => "invalid_archive",
            ErrorKind::NoModelPart => "no_model_part",
            ErrorKind::NoGeometry => "no_geometry",
            ErrorKind::MalformedFile => "malformed_file",
            ErrorKind::ComputationError => "computation_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QuoteError {
    /// Stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuoteError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            QuoteError::UnknownMaterial { .. } => ErrorKind::UnknownMaterial,
            QuoteError::InvalidScale { .. } => ErrorKind::InvalidScale,
            QuoteError::InvalidArchive { .. } => ErrorKind::InvalidArchive,
            QuoteError::NoModelPart => ErrorKind::NoModelPart,
            QuoteError::NoGeometry => ErrorKind::NoGeometry,
            QuoteError::MalformedFile { .. } => ErrorKind::MalformedFile,
            QuoteError::ComputationError { .. } => ErrorKind::ComputationError,
        }
    }

    pub(crate) fn malformed(format: &str, details: impl Into<String>) -> Self {
        QuoteError::MalformedFile {
            format: format.to_string(),
            details: details.into(),
        }
    }

    pub(crate) fn computation(reason: impl Into<String>) -> Self {
        QuoteError::ComputationError {
            reason: reason.into(),
        }
    }

    /// Whether the error is caused by the request itself rather than the file content
    pub fn is_request_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnsupportedFormat | ErrorKind::UnknownMaterial | ErrorKind::InvalidScale
        )
    }
}
