//! Tagged subdomains and their per-node field storage.
//!
//! A [`Domain`] is the ordered set of [`Subdomain`]s one process owns.
//! Each subdomain carries a tag set, a polynomial order, a node count,
//! a geometry payload, and an ordered map of named `Vec<Real>` fields
//! that all share the node count.
//!
//! # Layout
//!
//! ```text
//! Domain
//! ├── Vec<Subdomain>            (partition order)
//! │   ├── TagSet                (role + user tags)
//! │   ├── Geometry              (volume elements | glue faces | detached)
//! │   └── IndexMap<String, Vec<Real>>
//! └── IndexMap<SubdomainId, usize>
//! ```
//!
//! Fields are declared and initialized across every subdomain matching
//! a [`TagPredicate`], which is the only way new quantities enter the
//! domain. Read access for output goes through [`Snapshot`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod geometry;
pub mod hash;
pub mod init;
pub mod predicate;
pub mod snapshot;
pub mod subdomain;

pub use domain::Domain;
pub use error::DomainError;
pub use geometry::{
    ElementGeom, Geometry, GlueFace, GlueGeometry, GluePartner, InteriorFace, VolumeGeometry,
};
pub use hash::snapshot_hash;
pub use init::{ConstantFill, FieldInit, FnInit, InitContext};
pub use predicate::TagPredicate;
pub use snapshot::{Snapshot, SnapshotEntry};
pub use subdomain::Subdomain;
