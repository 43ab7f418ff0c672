//! The [`Communicator`] trait and its request handles.

use crate::error::CommError;
use shear_core::{Rank, Real};
use std::fmt;

/// Message tag. Sender and receiver must agree on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a posted send or receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Request(pub(crate) u64);

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A finished request.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    /// Which request finished.
    pub request: Request,
    /// The payload of a receive; `None` for a send.
    pub data: Option<Vec<Real>>,
}

/// Non-blocking point-to-point messaging addressed by rank.
///
/// Messages between one pair of ranks with one tag are delivered in the
/// order they were sent. Receives posted for different sources complete
/// in arrival order.
///
/// # Object Safety
///
/// This trait is object-safe; the stepper holds a
/// `Box<dyn Communicator>`.
pub trait Communicator: Send {
    /// This process's rank.
    fn rank(&self) -> Rank;

    /// Number of ranks in the world.
    fn size(&self) -> u32;

    /// Post a send of `data` to `dest`.
    fn isend(&mut self, dest: Rank, tag: Tag, data: Vec<Real>) -> Result<Request, CommError>;

    /// Post a receive of exactly `len` values from `source`.
    fn irecv(&mut self, source: Rank, tag: Tag, len: usize) -> Result<Request, CommError>;

    /// Block until one request in `pending` completes, remove it from
    /// `pending`, and return it.
    ///
    /// # Errors
    ///
    /// [`CommError::NothingPending`] if `pending` is empty,
    /// [`CommError::Timeout`] if nothing arrives in time, or any error
    /// attached to the completing message.
    fn wait_any(&mut self, pending: &mut Vec<Request>) -> Result<Completion, CommError>;

    /// Complete `request` if it is already finished, without blocking.
    fn test(&mut self, request: Request) -> Result<Option<Completion>, CommError>;
}
