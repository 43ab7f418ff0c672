//! Core types and identifiers for the shear elastodynamics solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: the
//! [`Real`] scalar, strongly-typed ids, the subdomain [`Role`] derived
//! from tag sets, the names of the elastic state fields, and the
//! field-level error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod tag;

pub use error::{FieldError, RoleError};
pub use field::{
    minus, plus, prefixed, PrefixedNames, GRID_X, GRID_Y, GRID_Z, MATERIAL_FIELDS, NUM_FIELDS,
    STATE_FIELDS, TRACE_MATERIAL_FIELDS,
};
pub use id::{ElementId, Rank, SubdomainId};
pub use tag::{GlueKind, Role, TagSet};

/// Floating-point type used for every field, coefficient, and coordinate.
pub type Real = f64;
