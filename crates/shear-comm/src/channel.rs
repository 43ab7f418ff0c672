//! Ranks as threads connected by crossbeam channels.

use crate::error::CommError;
use crate::mailbox::{Envelope, Mailbox};
use crate::traits::{Communicator, Completion, Request, Tag};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use shear_core::{Rank, Real};
use std::time::{Duration, Instant};

/// One rank of an in-process message-passing world.
///
/// Every rank owns an unbounded inbox; sends never block. Create a whole
/// world with [`ChannelComm::world`] and move each endpoint to the thread
/// that drives that rank.
///
/// A send to an exited rank fails with [`CommError::Disconnected`]. A
/// wait on an exited rank cannot tell it from a slow one and ends in
/// [`CommError::Timeout`].
#[derive(Debug)]
pub struct ChannelComm {
    rank: Rank,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    mailbox: Mailbox,
    timeout: Duration,
}

impl ChannelComm {
    /// Create `size` connected endpoints, index `r` being rank `r`.
    ///
    /// `timeout` bounds every [`Communicator::wait_any`] call.
    pub fn world(size: u32, timeout: Duration) -> Vec<ChannelComm> {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| crossbeam_channel::unbounded()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(r, inbox)| {
                let rank = Rank(r as u32);
                ChannelComm {
                    rank,
                    peers: senders.clone(),
                    inbox,
                    mailbox: Mailbox::new(rank),
                    timeout,
                }
            })
            .collect()
    }

    /// The wait timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn check(&self, rank: Rank) -> Result<(), CommError> {
        if rank.index() >= self.peers.len() {
            return Err(CommError::InvalidRank {
                rank,
                size: self.size(),
            });
        }
        Ok(())
    }

    fn drain(&mut self) {
        loop {
            match self.inbox.try_recv() {
                Ok(envelope) => self.mailbox.deliver(envelope),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> u32 {
        self.peers.len() as u32
    }

    fn isend(&mut self, dest: Rank, tag: Tag, data: Vec<Real>) -> Result<Request, CommError> {
        self.check(dest)?;
        tracing::trace!(rank = %self.rank, dest = %dest, tag = %tag, len = data.len(), "isend");
        self.peers[dest.index()]
            .send(Envelope {
                source: self.rank,
                tag,
                data,
            })
            .map_err(|_| CommError::Disconnected {
                rank: self.rank,
                peer: dest,
            })?;
        Ok(self.mailbox.post_send())
    }

    fn irecv(&mut self, source: Rank, tag: Tag, len: usize) -> Result<Request, CommError> {
        self.check(source)?;
        tracing::trace!(rank = %self.rank, source = %source, tag = %tag, len, "irecv");
        Ok(self.mailbox.post_recv(source, tag, len))
    }

    fn wait_any(&mut self, pending: &mut Vec<Request>) -> Result<Completion, CommError> {
        let start = Instant::now();
        let deadline = start + self.timeout;
        loop {
            if let Some(done) = self.mailbox.complete_any(pending)? {
                return Ok(done);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.inbox.recv_timeout(remaining) {
                Ok(envelope) => self.mailbox.deliver(envelope),
                // The own-inbox sender in `peers` keeps the channel open,
                // so a dead peer shows up here as a timeout.
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return Err(CommError::Timeout {
                        rank: self.rank,
                        waited_ms: start.elapsed().as_millis() as u64,
                    })
                }
            }
        }
    }

    fn test(&mut self, request: Request) -> Result<Option<Completion>, CommError> {
        self.drain();
        self.mailbox.try_complete(request)
    }
}
