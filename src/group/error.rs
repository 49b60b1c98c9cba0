//! Error types for group management operations.
//!
//! This module defines errors that can occur during group operations,
//! including storage errors, membership rule violations, and assignment
//! generation failures.

use thiserror::Error;

use crate::assignment::GenerationError;

/// Error type for group operations.
#[derive(Error, Debug)]
pub enum GroupError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Group or member not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data provided or read back from storage.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Membership or couple state conflict.
    #[error("Membership conflict: {0}")]
    MembershipConflict(String),

    /// The requester may not perform this operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Another generation for the same group has not finished yet.
    #[error("Assignment generation already in progress for group: {0}")]
    GenerationInProgress(String),

    /// Members or couples changed while assignments were being generated.
    #[error("Group changed during assignment generation: {0}")]
    MembershipChanged(String),

    /// Assignment generation failed.
    #[error("Assignment generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Result type alias for group operations.
pub type Result<T> = std::result::Result<T, GroupError>;
