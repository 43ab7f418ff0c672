//! Multi-rank runs on threads.

use std::thread;
use std::time::Duration;

use shear_comm::ChannelComm;

/// Default bound on one exchange wait in tests.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `body` once per rank of a `size`-rank channel world, each on its
/// own thread, and return the results in rank order.
///
/// A panic on any rank is re-raised on the caller.
pub fn run_ranks<T, F>(size: u32, body: F) -> Vec<T>
where
    T: Send,
    F: Fn(ChannelComm) -> T + Sync,
{
    let world = ChannelComm::world(size, TEST_TIMEOUT);
    thread::scope(|s| {
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| {
                let body = &body;
                s.spawn(move || body(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(v) => v,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
