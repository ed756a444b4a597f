// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to plain English with a suggestion. The
// severity tells the caller whether the run can continue.

use crate::error::UnredactError;

/// How far the damage reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// One embedded object was skipped; the rest of the page is fine.
    Skipped,
    /// This file could not be rebuilt; other files in a batch continue.
    FileFailed,
    /// Nothing can be processed until the user fixes the invocation.
    Fatal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert an `UnredactError` into a `HumanError`.
pub fn humanize_error(err: &UnredactError) -> HumanError {
    match err {
        // -- Input errors --
        UnredactError::InputNotFound(path) => HumanError {
            message: format!("'{}' does not exist.", path.display()),
            suggestion: "Check the spelling of the path, or pass a folder containing PDF files."
                .into(),
            severity: Severity::Fatal,
        },

        UnredactError::NotAPdf(path) => HumanError {
            message: format!("'{}' is not a PDF file.", path.display()),
            suggestion: "Only files ending in .pdf can be processed.".into(),
            severity: Severity::Fatal,
        },

        // -- Document errors --
        UnredactError::PdfError(detail) => {
            if detail.contains("encrypt") || detail.contains("Decryption") {
                HumanError {
                    message: "This PDF is encrypted.".into(),
                    suggestion: "Remove the password protection first, then try again.".into(),
                    severity: Severity::FileFailed,
                }
            } else {
                HumanError {
                    message: "This PDF could not be read or rebuilt.".into(),
                    suggestion: format!(
                        "The file may be damaged. Try re-saving it from a PDF viewer. ({detail})"
                    ),
                    severity: Severity::FileFailed,
                }
            }
        }

        UnredactError::ImageError(detail) => HumanError {
            message: "An embedded image could not be decoded and was left out.".into(),
            suggestion: format!("The rest of the page was recovered normally. ({detail})"),
            severity: Severity::Skipped,
        },

        UnredactError::UnsupportedImage(detail) => HumanError {
            message: "An embedded image uses an encoding that cannot be inspected.".into(),
            suggestion: format!(
                "The image was copied unchanged, so a box inside it stays visible. ({detail})"
            ),
            severity: Severity::Skipped,
        },

        // -- Configuration --
        UnredactError::Config(detail) => HumanError {
            message: "The configuration is not valid.".into(),
            suggestion: detail.clone(),
            severity: Severity::Fatal,
        },

        UnredactError::Cancelled => HumanError {
            message: "Processing was stopped before it finished.".into(),
            suggestion: "Files completed before the stop were saved.".into(),
            severity: Severity::Fatal,
        },

        // -- Storage --
        UnredactError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Choose an output folder you are allowed to write to.".into(),
                severity: Severity::FileFailed,
            },
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file disappeared while it was being processed.".into(),
                suggestion: "Make sure no other program is moving the files.".into(),
                severity: Severity::FileFailed,
            },
            _ => HumanError {
                message: "A file could not be read or written.".into(),
                suggestion: format!("Check free disk space and try again. ({io_err})"),
                severity: Severity::FileFailed,
            },
        },

        UnredactError::Serialization(err) => HumanError {
            message: "The configuration file is not valid JSON.".into(),
            suggestion: format!("Fix the file and try again. ({err})"),
            severity: Severity::Fatal,
        },
    }
}
