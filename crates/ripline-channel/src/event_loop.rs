//! Contract between a channel and the readiness notifier driving it.

use std::io;

use crate::interest::Interest;

/// Per-channel registration handle onto an event loop.
///
/// The handle is the only side effect a channel exerts on its loop. Calls
/// are idempotent per state: registering an already-registered channel or
/// deregistering an unregistered one must not corrupt the loop. The loop
/// drives the channel back by invoking `Channel::handle_readable` on the
/// readable edge and `Channel::handle_writable` on the writable edge.
///
/// A registration failure is fatal for the channel: it reports the error
/// through its pipeline and closes.
pub trait LoopHandle {
    /// First registration with the given interest set.
    fn register(&mut self, interest: Interest) -> io::Result<()>;

    /// Updates the interest set of an existing registration.
    fn reregister(&mut self, interest: Interest) -> io::Result<()>;

    /// Removes the registration entirely.
    fn deregister(&mut self) -> io::Result<()>;
}
