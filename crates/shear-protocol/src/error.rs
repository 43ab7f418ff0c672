//! Dispatch errors for the rate-accumulation protocol.

use shear_core::{FieldError, Role, RoleError};
use shear_domain::DomainError;
use std::fmt;
use thiserror::Error;

/// The protocol operation being performed, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `allocate_rate_storage`.
    AllocateRateStorage,
    /// `scale_rates`.
    ScaleRates,
    /// `intra_rhs`.
    IntraRhs,
    /// `inter_rhs`.
    InterRhs,
    /// `add_rates`.
    AddRates,
    /// `fill_minus_traces`.
    FillTraces,
}

impl Operation {
    /// Operation name as it appears in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::AllocateRateStorage => "allocate_rate_storage",
            Self::ScaleRates => "scale_rates",
            Self::IntraRhs => "intra_rhs",
            Self::InterRhs => "inter_rhs",
            Self::AddRates => "add_rates",
            Self::FillTraces => "fill_minus_traces",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rate-accumulation operation could not be carried out.
///
/// Every variant names the subdomain and the operation. All of them are
/// fatal: the state is undefined once one has been returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RateError {
    /// The tag set does not resolve to exactly one role.
    #[error("{operation} on subdomain '{subdomain}': {source}")]
    UnknownRole {
        /// Subdomain name.
        subdomain: String,
        /// Operation attempted.
        operation: Operation,
        /// Why the role could not be resolved.
        #[source]
        source: RoleError,
    },
    /// The role tag and the geometry payload disagree.
    #[error("{operation} on subdomain '{subdomain}': tagged {role} but geometry is {geometry}")]
    RoleMismatch {
        /// Subdomain name.
        subdomain: String,
        /// Operation attempted.
        operation: Operation,
        /// Role from the tag set.
        role: Role,
        /// Description of the geometry actually present.
        geometry: &'static str,
    },
    /// A field the operation needs is absent or malformed.
    #[error("{operation} on subdomain '{subdomain}': {source}")]
    Field {
        /// Subdomain name.
        subdomain: String,
        /// Operation attempted.
        operation: Operation,
        /// Underlying field error.
        #[source]
        source: FieldError,
    },
    /// A subdomain the operation refers to is not in the domain.
    #[error("{operation} on subdomain '{subdomain}': {source}")]
    Domain {
        /// Subdomain name.
        subdomain: String,
        /// Operation attempted.
        operation: Operation,
        /// Underlying domain error.
        #[source]
        source: DomainError,
    },
}

impl RateError {
    /// The subdomain named by the error.
    pub fn subdomain(&self) -> &str {
        match self {
            Self::UnknownRole { subdomain, .. }
            | Self::RoleMismatch { subdomain, .. }
            | Self::Field { subdomain, .. }
            | Self::Domain { subdomain, .. } => subdomain,
        }
    }

    /// The operation named by the error.
    pub fn operation(&self) -> Operation {
        match self {
            Self::UnknownRole { operation, .. }
            | Self::RoleMismatch { operation, .. }
            | Self::Field { operation, .. }
            | Self::Domain { operation, .. } => *operation,
        }
    }

    /// Wrap a field error.
    pub fn field(subdomain: &str, operation: Operation, source: FieldError) -> Self {
        Self::Field {
            subdomain: subdomain.to_owned(),
            operation,
            source,
        }
    }

    /// Wrap a domain error.
    pub fn domain(subdomain: &str, operation: Operation, source: DomainError) -> Self {
        Self::Domain {
            subdomain: subdomain.to_owned(),
            operation,
            source,
        }
    }
}
