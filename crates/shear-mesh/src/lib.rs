//! Mesh and partition provision for shear.
//!
//! The time-stepping core never looks at mesh topology directly. It
//! consumes a [`Partition`]: the elements one rank owns, each with its
//! target subdomain, polynomial order, bounding box, and the owner of
//! whatever lies across each of its four faces. Anything that can
//! produce that list implements [`MeshProvider`].
//!
//! # Providers
//!
//! - [`BrickMesh`]: `2^L x 2^L` uniform quadrilaterals on the unit square,
//!   optionally periodic ([`Connectivity`]), Morton-ordered, with
//!   contiguous rank and subdomain cuts.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod brick;
pub mod connectivity;
pub mod error;
pub mod morton;
pub mod partition;

#[cfg(test)]
pub(crate) mod compliance;

pub use brick::BrickMesh;
pub use connectivity::Connectivity;
pub use error::MeshError;
pub use partition::{
    Bounds, ElementInfo, Face, FaceNeighbor, MeshProvider, NeighborElement, Partition,
};
