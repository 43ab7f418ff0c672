//! Numerical kernels for the shear elastodynamics solver.
//!
//! - [`basis`]: Legendre-Gauss-Lobatto nodes, weights, differentiation
//!   and interpolation matrices.
//! - [`flux`]: pointwise upwind and boundary Riemann solutions.
//! - [`elastic`]: order-generic volume, boundary, and glue kernels.
//! - [`registry`]: order-specialized kernel selection.
//! - [`rates`]: [`ElasticRates`], the rate-accumulation protocol
//!   implementation driven by the stepper.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod basis;
pub mod elastic;
pub mod flux;
pub mod material;
pub mod rates;
pub mod registry;

pub use basis::LglBasis;
pub use material::Material;
pub use rates::{ElasticRates, ElasticRatesBuilder};
pub use registry::KernelRegistry;
