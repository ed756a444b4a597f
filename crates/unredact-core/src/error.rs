// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Unredact.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Unredact operations.
#[derive(Debug, Error)]
pub enum UnredactError {
    // -- Input errors --
    #[error("input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("not a PDF file: {}", .0.display())]
    NotAPdf(PathBuf),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image decoding failed: {0}")]
    ImageError(String),

    #[error("unsupported image encoding: {0}")]
    UnsupportedImage(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Run control --
    #[error("processing cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, UnredactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_name_the_path() {
        let err = UnredactError::NotAPdf(PathBuf::from("notes.txt"));
        assert_eq!(err.to_string(), "not a PDF file: notes.txt");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: UnredactError = io_err.into();
        assert!(matches!(err, UnredactError::Io(_)));
    }
}
