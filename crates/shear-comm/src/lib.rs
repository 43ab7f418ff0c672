//! Point-to-point message passing between ranks.
//!
//! The solver needs only non-blocking send and receive addressed by rank
//! and tag, plus explicit completion: [`Communicator::wait_any`] blocks
//! until one of a set of posted requests finishes, in whatever order the
//! messages actually arrive.
//!
//! Two implementations are provided:
//!
//! - [`SelfComm`]: a world of one rank. Messages to self are delivered
//!   immediately.
//! - [`ChannelComm`]: `size` ranks in one process, each usually driven by
//!   its own thread, connected by crossbeam channels.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod error;
mod mailbox;
pub mod self_comm;
pub mod traits;

pub use channel::ChannelComm;
pub use error::CommError;
pub use self_comm::SelfComm;
pub use traits::{Communicator, Completion, Request, Tag};
