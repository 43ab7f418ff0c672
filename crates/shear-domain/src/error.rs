//! Domain-level error types.

use shear_core::{FieldError, SubdomainId};
use thiserror::Error;

/// Errors from domain construction and domain-wide field management.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A subdomain with this id is already present.
    #[error("duplicate subdomain id {id} ('{name}')")]
    DuplicateId {
        /// The repeated id.
        id: SubdomainId,
        /// Name of the rejected subdomain.
        name: String,
    },
    /// No subdomain has this id.
    #[error("no subdomain with id {0}")]
    UnknownSubdomain(SubdomainId),
    /// No subdomain at this position.
    #[error("no subdomain at position {0}")]
    NoSuchIndex(usize),
    /// A per-subdomain field operation failed.
    #[error(transparent)]
    Field(#[from] FieldError),
}
