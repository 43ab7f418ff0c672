//! Communication errors.

use crate::traits::{Request, Tag};
use shear_core::Rank;
use thiserror::Error;

/// A failed or mismatched message-passing operation.
///
/// Every variant is fatal to a time step: without the missing data the
/// numerical state is undefined.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommError {
    /// `wait_any` saw nothing arrive within the configured timeout.
    #[error("rank {rank}: no message arrived within {waited_ms} ms")]
    Timeout {
        /// The waiting rank.
        rank: Rank,
        /// How long it waited.
        waited_ms: u64,
    },
    /// The peer's endpoint was dropped.
    #[error("rank {rank}: peer rank {peer} disconnected")]
    Disconnected {
        /// The local rank.
        rank: Rank,
        /// The vanished peer.
        peer: Rank,
    },
    /// A message arrived with a different length than the receive posted.
    #[error(
        "rank {rank}: message from rank {source_rank} tag {tag} has {actual} values, expected {expected}"
    )]
    LengthMismatch {
        /// The receiving rank.
        rank: Rank,
        /// The sending rank.
        source_rank: Rank,
        /// Message tag.
        tag: Tag,
        /// Length the receive was posted with.
        expected: usize,
        /// Length that arrived.
        actual: usize,
    },
    /// A rank outside the world.
    #[error("rank {rank} is outside a world of size {size}")]
    InvalidRank {
        /// The offending rank.
        rank: Rank,
        /// World size.
        size: u32,
    },
    /// The request is not outstanding on this communicator.
    #[error("unknown request {0}")]
    UnknownRequest(Request),
    /// `wait_any` was called with no outstanding requests.
    #[error("wait_any called with no pending requests")]
    NothingPending,
    /// No posted receive can ever be satisfied.
    #[error("rank {rank}: pending receives can never complete")]
    Starved {
        /// The waiting rank.
        rank: Rank,
    },
}
