// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quire.

use thiserror::Error;

/// Top-level error type for all Quire operations.
#[derive(Debug, Error)]
pub enum QuireError {
    // -- Caller mistakes, detected before any rendering --
    #[error("validation failed: {0}")]
    Validation(String),

    // -- Per-page failures --
    #[error("rendering page {page} failed: {reason}")]
    Render { page: usize, reason: String },

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    // -- Cache --
    #[error("cache error: {0}")]
    Cache(String),

    // -- Document container --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Control flow --
    #[error("operation cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    Internal(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How the orchestrator should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input. Fail fast, never retry.
    Validation,
    /// Scoped to one page. Record it and continue with the remaining pages.
    PerPage,
    /// Cache trouble. Log it and treat the lookup as a miss.
    Cache,
    /// Abort the whole operation.
    Fatal,
}

impl QuireError {
    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a render error on `page` (0-based).
    pub fn render(page: usize, reason: impl std::fmt::Display) -> Self {
        Self::Render {
            page,
            reason: reason.to_string(),
        }
    }

    /// Classify the error for propagation decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Render { .. } | Self::Image(_) | Self::Encode(_) => ErrorClass::PerPage,
            Self::Cache(_) => ErrorClass::Cache,
            Self::Pdf(_)
            | Self::Cancelled
            | Self::Internal(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorClass::Fatal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;
