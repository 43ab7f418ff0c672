//! Test utilities and mock types for shear development.
//!
//! Provides rate-protocol fixtures with known solutions, a
//! call-counting [`Communicator`](shear_comm::Communicator) wrapper, and
//! a harness that runs a closure on every rank of a threaded world.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod comm;
pub mod fixtures;
pub mod harness;

pub use comm::{CallCounts, CountingComm};
pub use fixtures::{decay_domain, FailingRates, ForcedDecay, DECAY_FIELD};
pub use harness::{run_ranks, TEST_TIMEOUT};
