//! Request bookkeeping shared by the communicator implementations.

use crate::error::CommError;
use crate::traits::{Completion, Request, Tag};
use indexmap::IndexMap;
use shear_core::{Rank, Real};
use std::collections::VecDeque;

/// A message in flight.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub source: Rank,
    pub tag: Tag,
    pub data: Vec<Real>,
}

#[derive(Clone, Copy, Debug)]
enum Posted {
    Send,
    Recv { source: Rank, tag: Tag, len: usize },
}

/// Posted requests plus messages that arrived before a matching receive
/// was completed.
#[derive(Debug)]
pub(crate) struct Mailbox {
    rank: Rank,
    next: u64,
    posted: IndexMap<Request, Posted>,
    arrived: IndexMap<(Rank, Tag), VecDeque<Vec<Real>>>,
}

impl Mailbox {
    pub fn new(rank: Rank) -> Self {
        Self {
            rank,
            next: 0,
            posted: IndexMap::new(),
            arrived: IndexMap::new(),
        }
    }

    fn allocate(&mut self, posted: Posted) -> Request {
        let request = Request(self.next);
        self.next += 1;
        self.posted.insert(request, posted);
        request
    }

    /// Record a send that has already been handed to the transport.
    pub fn post_send(&mut self) -> Request {
        self.allocate(Posted::Send)
    }

    pub fn post_recv(&mut self, source: Rank, tag: Tag, len: usize) -> Request {
        self.allocate(Posted::Recv { source, tag, len })
    }

    pub fn deliver(&mut self, envelope: Envelope) {
        tracing::trace!(
            rank = %self.rank,
            source = %envelope.source,
            tag = %envelope.tag,
            len = envelope.data.len(),
            "message arrived"
        );
        self.arrived
            .entry((envelope.source, envelope.tag))
            .or_default()
            .push_back(envelope.data);
    }

    /// Complete `request` from messages already delivered.
    pub fn try_complete(&mut self, request: Request) -> Result<Option<Completion>, CommError> {
        let posted = *self
            .posted
            .get(&request)
            .ok_or(CommError::UnknownRequest(request))?;
        match posted {
            Posted::Send => {
                self.posted.shift_remove(&request);
                Ok(Some(Completion {
                    request,
                    data: None,
                }))
            }
            Posted::Recv { source, tag, len } => {
                let Some(data) = self
                    .arrived
                    .get_mut(&(source, tag))
                    .and_then(VecDeque::pop_front)
                else {
                    return Ok(None);
                };
                self.posted.shift_remove(&request);
                if data.len() != len {
                    return Err(CommError::LengthMismatch {
                        rank: self.rank,
                        source_rank: source,
                        tag,
                        expected: len,
                        actual: data.len(),
                    });
                }
                Ok(Some(Completion {
                    request,
                    data: Some(data),
                }))
            }
        }
    }

    /// Complete the first request in `pending` that can finish now.
    pub fn complete_any(
        &mut self,
        pending: &mut Vec<Request>,
    ) -> Result<Option<Completion>, CommError> {
        if pending.is_empty() {
            return Err(CommError::NothingPending);
        }
        for pos in 0..pending.len() {
            if let Some(done) = self.try_complete(pending[pos])? {
                pending.remove(pos);
                return Ok(Some(done));
            }
        }
        Ok(None)
    }
}
