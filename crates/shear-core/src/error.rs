//! Error types shared across the workspace.

use thiserror::Error;

/// A subdomain's tag set does not name exactly one known role.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RoleError {
    /// None of the tags is a role tag.
    #[error("no role tag among {tags:?}")]
    Unrecognized {
        /// The tags that were present.
        tags: Vec<String>,
    },
    /// More than one role tag is present.
    #[error("conflicting role tags '{first}' and '{second}'")]
    Ambiguous {
        /// First role tag found.
        first: &'static str,
        /// Second role tag found.
        second: &'static str,
    },
}

/// Errors from per-subdomain field management.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    /// `add_field` was called for a name that already exists.
    #[error("field '{field}' already exists on subdomain '{subdomain}'")]
    Exists {
        /// Subdomain name.
        subdomain: String,
        /// Field name.
        field: String,
    },
    /// A field was read or written that was never added.
    #[error("field '{field}' not found on subdomain '{subdomain}'")]
    Missing {
        /// Subdomain name.
        subdomain: String,
        /// Field name.
        field: String,
    },
    /// A buffer did not match the subdomain's node count.
    #[error("field '{field}' on subdomain '{subdomain}' has {actual} values, expected {expected}")]
    LengthMismatch {
        /// Subdomain name.
        subdomain: String,
        /// Field name.
        field: String,
        /// Node count of the subdomain.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
    /// An initializer refused to fill a field.
    #[error("initializer cannot fill field '{field}': {reason}")]
    Init {
        /// Field name.
        field: String,
        /// Why the initializer failed.
        reason: String,
    },
}
