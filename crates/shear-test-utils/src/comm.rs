//! Communicator wrappers for observing message traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shear_comm::{CommError, Communicator, Completion, Request, Tag};
use shear_core::{Rank, Real};

/// Per-operation call counters shared between a [`CountingComm`] and
/// the test that boxed it away.
#[derive(Debug, Default)]
pub struct CallCounts {
    isend: AtomicU64,
    irecv: AtomicU64,
    wait_any: AtomicU64,
    test: AtomicU64,
}

impl CallCounts {
    pub fn isend(&self) -> u64 {
        self.isend.load(Ordering::Relaxed)
    }

    pub fn irecv(&self) -> u64 {
        self.irecv.load(Ordering::Relaxed)
    }

    pub fn wait_any(&self) -> u64 {
        self.wait_any.load(Ordering::Relaxed)
    }

    pub fn test(&self) -> u64 {
        self.test.load(Ordering::Relaxed)
    }

    /// Calls of every messaging operation. `rank` and `size` are not
    /// counted.
    pub fn total(&self) -> u64 {
        self.isend() + self.irecv() + self.wait_any() + self.test()
    }
}

/// Forwards to an inner communicator, counting every messaging call.
pub struct CountingComm<C> {
    inner: C,
    counts: Arc<CallCounts>,
}

impl<C: Communicator> CountingComm<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            counts: Arc::new(CallCounts::default()),
        }
    }

    /// Handle that stays readable after the communicator is moved.
    pub fn counts(&self) -> Arc<CallCounts> {
        Arc::clone(&self.counts)
    }
}

impl<C: Communicator> Communicator for CountingComm<C> {
    fn rank(&self) -> Rank {
        self.inner.rank()
    }

    fn size(&self) -> u32 {
        self.inner.size()
    }

    fn isend(&mut self, dest: Rank, tag: Tag, data: Vec<Real>) -> Result<Request, CommError> {
        self.counts.isend.fetch_add(1, Ordering::Relaxed);
        self.inner.isend(dest, tag, data)
    }

    fn irecv(&mut self, source: Rank, tag: Tag, len: usize) -> Result<Request, CommError> {
        self.counts.irecv.fetch_add(1, Ordering::Relaxed);
        self.inner.irecv(source, tag, len)
    }

    fn wait_any(&mut self, pending: &mut Vec<Request>) -> Result<Completion, CommError> {
        self.counts.wait_any.fetch_add(1, Ordering::Relaxed);
        self.inner.wait_any(pending)
    }

    fn test(&mut self, request: Request) -> Result<Option<Completion>, CommError> {
        self.counts.test.fetch_add(1, Ordering::Relaxed);
        self.inner.test(request)
    }
}
