//! Interest-set tracking and registration decisions.
//!
//! The channel is registered with its event loop exactly when its interest
//! is not [`Interest::None`]. Interest changes are requested as additive
//! bit operations (include/exclude read or write); each change yields at
//! most one registration call for the loop.

/// The set of I/O readiness edges a channel wants notification for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interest {
    /// No notifications wanted; the channel is not registered.
    #[default]
    None,
    /// Readable-edge notifications only.
    Read,
    /// Writable-edge notifications only.
    Write,
    /// Both readable- and writable-edge notifications.
    Both,
}

impl Interest {
    fn from_bits(read: bool, write: bool) -> Self {
        match (read, write) {
            (false, false) => Interest::None,
            (true, false) => Interest::Read,
            (false, true) => Interest::Write,
            (true, true) => Interest::Both,
        }
    }

    /// True if the read bit is set.
    pub fn contains_read(self) -> bool {
        matches!(self, Interest::Read | Interest::Both)
    }

    /// True if the write bit is set.
    pub fn contains_write(self) -> bool {
        matches!(self, Interest::Write | Interest::Both)
    }

    /// Returns this interest with the read bit set.
    pub fn with_read(self) -> Self {
        Self::from_bits(true, self.contains_write())
    }

    /// Returns this interest with the read bit cleared.
    pub fn without_read(self) -> Self {
        Self::from_bits(false, self.contains_write())
    }

    /// Returns this interest with the write bit set.
    pub fn with_write(self) -> Self {
        Self::from_bits(self.contains_read(), true)
    }

    /// Returns this interest with the write bit cleared.
    pub fn without_write(self) -> Self {
        Self::from_bits(self.contains_read(), false)
    }
}

/// A registration call the channel must issue to its event loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopCommand {
    /// First registration with the given interest.
    Register(Interest),
    /// Interest update for an existing registration.
    Reregister(Interest),
    /// Remove the registration entirely.
    Deregister,
}

/// Tracks the current interest and derives the loop call for each change.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterestState {
    current: Interest,
}

impl InterestState {
    /// Creates a state with no interest armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current interest.
    pub fn current(&self) -> Interest {
        self.current
    }

    /// Adds the read bit.
    pub fn include_read(&mut self) -> Option<LoopCommand> {
        self.transition_to(self.current.with_read())
    }

    /// Removes the read bit.
    pub fn exclude_read(&mut self) -> Option<LoopCommand> {
        self.transition_to(self.current.without_read())
    }

    /// Adds the write bit.
    pub fn include_write(&mut self) -> Option<LoopCommand> {
        self.transition_to(self.current.with_write())
    }

    /// Removes the write bit.
    pub fn exclude_write(&mut self) -> Option<LoopCommand> {
        self.transition_to(self.current.without_write())
    }

    /// Moves to `target`, returning the registration call to issue, if any.
    ///
    /// Leaving `None` registers, reaching `None` deregisters, everything
    /// else is a reregistration with the merged interest.
    pub fn transition_to(&mut self, target: Interest) -> Option<LoopCommand> {
        if target == self.current {
            return None;
        }
        let command = if self.current == Interest::None {
            LoopCommand::Register(target)
        } else if target == Interest::None {
            LoopCommand::Deregister
        } else {
            LoopCommand::Reregister(target)
        };
        self.current = target;
        Some(command)
    }

    /// Forgets the current interest without issuing a loop call.
    ///
    /// Used on the close path, where the channel deregisters itself.
    pub fn clear(&mut self) {
        self.current = Interest::None;
    }
}
