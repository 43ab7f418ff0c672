//! shear: explicit low-storage Runge-Kutta elastodynamics on tagged
//! subdomains.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all shear sub-crates. For most users, adding `shear` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use shear::prelude::*;
//!
//! let config = SolverConfig {
//!     order: 3,
//!     dt: 1e-3,
//!     end_time: 5e-3,
//!     ..SolverConfig::default()
//! };
//! let mode = StressFreeBox::new(1, 1, config.material);
//!
//! let mut sim = Simulation::new(config, Box::new(SelfComm::new())).unwrap();
//! sim.initialize(&mode).unwrap();
//! let steps = sim.run().unwrap();
//! assert_eq!(steps, 5);
//! assert!(sim.snapshot().max_abs("v3") > 0.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `shear-core` | `Real`, ids, roles and tag sets, field names |
//! | [`mesh`] | `shear-mesh` | `MeshProvider`, partitions, the brick mesh |
//! | [`domain`] | `shear-domain` | Subdomains, field storage, snapshots |
//! | [`protocol`] | `shear-protocol` | The rate-accumulation trait and dispatch errors |
//! | [`kernel`] | `shear-kernel` | LGL bases, fluxes, `ElasticRates` |
//! | [`comm`] | `shear-comm` | The `Communicator` trait and in-process worlds |
//! | [`engine`] | `shear-engine` | Stepper, exchange, configuration, run driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids, and tags (`shear-core`).
pub use shear_core as types;

/// Mesh partition interface and the brick mesh (`shear-mesh`).
///
/// Implement [`mesh::MeshProvider`] to run on a different mesh.
pub use shear_mesh as mesh;

/// Tagged subdomains and field storage (`shear-domain`).
pub use shear_domain as domain;

/// The rate-accumulation protocol (`shear-protocol`).
///
/// [`protocol::RateAccumulation`] is the main extension point for a
/// different spatial operator.
pub use shear_protocol as protocol;

/// Numerical kernels (`shear-kernel`).
pub use shear_kernel as kernel;

/// Message passing (`shear-comm`).
pub use shear_comm as comm;

/// Time integration and run orchestration (`shear-engine`).
pub use shear_engine as engine;

/// Common imports for typical shear usage.
///
/// ```rust
/// use shear::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use shear_core::{GlueKind, Rank, Real, Role, SubdomainId, TagSet, STATE_FIELDS};

    // Domain
    pub use shear_domain::{
        snapshot_hash, ConstantFill, Domain, FieldInit, FnInit, Snapshot, Subdomain, TagPredicate,
    };

    // Mesh
    pub use shear_mesh::{BrickMesh, Connectivity, MeshProvider};

    // Protocol
    pub use shear_protocol::{RateAccumulation, RateError};

    // Kernels
    pub use shear_kernel::{ElasticRates, Material};

    // Communication
    pub use shear_comm::{ChannelComm, CommError, Communicator, SelfComm};

    // Engine
    pub use shear_engine::{
        LsrkMethod, LsrkStepper, SetupError, Simulation, SolverConfig, StepError, StepMetrics,
        StressFreeBox,
    };
}
