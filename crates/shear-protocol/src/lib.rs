//! The rate-accumulation protocol: the spatial operator as five
//! per-subdomain operations.
//!
//! A low-storage Runge-Kutta stepper drives any [`RateAccumulation`]
//! implementation through `scale_rates`, `intra_rhs`, `inter_rhs` and
//! `add_rates` each stage, after `allocate_rate_storage` once at setup.
//! Implementations dispatch on the subdomain's [`Role`](shear_core::Role)
//! with the helpers in [`dispatch`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod rate;

pub use dispatch::{expect_glue, expect_volume, role_of};
pub use error::{Operation, RateError};
pub use rate::RateAccumulation;
pub use shear_core::{prefixed, PrefixedNames};
