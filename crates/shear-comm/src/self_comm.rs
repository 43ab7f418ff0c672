//! A world of one rank.

use crate::error::CommError;
use crate::mailbox::{Envelope, Mailbox};
use crate::traits::{Communicator, Completion, Request, Tag};
use shear_core::{Rank, Real};

/// Single-rank communicator. Sends to rank 0 are delivered at once;
/// every other rank is invalid.
#[derive(Debug)]
pub struct SelfComm {
    mailbox: Mailbox,
}

impl Default for SelfComm {
    fn default() -> Self {
        Self::new()
    }
}

impl SelfComm {
    /// Create the communicator.
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox::new(Rank(0)),
        }
    }

    fn check(&self, rank: Rank) -> Result<(), CommError> {
        if rank != Rank(0) {
            return Err(CommError::InvalidRank { rank, size: 1 });
        }
        Ok(())
    }
}

impl Communicator for SelfComm {
    fn rank(&self) -> Rank {
        Rank(0)
    }

    fn size(&self) -> u32 {
        1
    }

    fn isend(&mut self, dest: Rank, tag: Tag, data: Vec<Real>) -> Result<Request, CommError> {
        self.check(dest)?;
        self.mailbox.deliver(Envelope {
            source: Rank(0),
            tag,
            data,
        });
        Ok(self.mailbox.post_send())
    }

    fn irecv(&mut self, source: Rank, tag: Tag, len: usize) -> Result<Request, CommError> {
        self.check(source)?;
        Ok(self.mailbox.post_recv(source, tag, len))
    }

    fn wait_any(&mut self, pending: &mut Vec<Request>) -> Result<Completion, CommError> {
        self.mailbox
            .complete_any(pending)?
            .ok_or(CommError::Starved { rank: Rank(0) })
    }

    fn test(&mut self, request: Request) -> Result<Option<Completion>, CommError> {
        self.mailbox.try_complete(request)
    }
}
