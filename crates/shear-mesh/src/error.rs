//! Error types for mesh construction and partitioning.

use thiserror::Error;

/// Errors arising from mesh construction or partition queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Refinement level beyond what the provider supports.
    #[error("refinement level {level} exceeds maximum {max}")]
    LevelTooDeep {
        /// Requested level.
        level: u32,
        /// Largest supported level.
        max: u32,
    },
    /// A count that must be positive was zero.
    #[error("{name} must be at least 1")]
    Zero {
        /// Which parameter.
        name: &'static str,
    },
    /// More parts requested than there are elements to cut.
    #[error("cannot cut {elements} elements into {parts} {name}")]
    TooManyParts {
        /// `"ranks"` or `"subdomains"`.
        name: &'static str,
        /// Requested part count.
        parts: u64,
        /// Elements available.
        elements: u64,
    },
    /// The queried rank is not in `0..size`.
    #[error("rank {rank} out of range for world size {size}")]
    RankOutOfRange {
        /// Offending rank.
        rank: u32,
        /// World size.
        size: u32,
    },
}
