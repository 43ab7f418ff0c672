//! Time integration and run orchestration for the shear solver.
//!
//! Ties the lower crates together: [`setup`] turns a mesh partition into
//! a tagged [`Domain`](shear_domain::Domain), [`exchange`] moves glue
//! traces between subdomains and ranks, [`stepper`] drives any
//! [`RateAccumulation`](shear_protocol::RateAccumulation) through a
//! low-storage Runge-Kutta [`method`], and [`simulation`] runs the
//! whole pipeline from a [`SolverConfig`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod exchange;
pub mod initial;
pub mod method;
pub mod metrics;
pub mod setup;
pub mod simulation;
pub mod stepper;

pub use config::{ConfigError, SolverConfig};
pub use exchange::{Exchange, ExchangeError, MATERIAL_TAG, STATE_TAG};
pub use initial::StressFreeBox;
pub use method::{LsrkMethod, Tableau};
pub use metrics::{ExchangeMetrics, StepMetrics};
pub use setup::{build_domain, SetupError};
pub use simulation::{Progress, Simulation};
pub use stepper::{LsrkStepper, StepError, StepperState, RATE_PREFIX, STATE_PREFIX};
