//! Pipeline event dispatch contract.
//!
//! The channel owns its pipeline and fires inbound events into it. Handlers
//! cannot call back into the channel mid-dispatch (the channel is mutably
//! borrowed while firing), so they record follow-up requests on a
//! [`ChannelActions`] collector which the channel applies once dispatch
//! returns.

use std::net::SocketAddr;

use crate::{
    buffer::ByteCursor,
    completion::{PromiseHandle, WritePromise},
    error::ErrorKind,
};

/// Payloads a user may submit for transmission.
#[derive(Debug)]
pub enum OutboundMessage {
    /// Raw bytes for the connected byte-stream transport.
    Bytes(ByteCursor),
    /// An addressed datagram. Meaningful only on connectionless transports;
    /// byte-stream channels reject it without touching channel state.
    Datagram {
        /// Destination address of the datagram.
        target: SocketAddr,
        /// Datagram payload.
        payload: ByteCursor,
    },
}

/// Deferred operations collected while pipeline callbacks run.
#[derive(Debug, Default)]
pub struct ChannelActions {
    read_requested: bool,
    flush_requested: bool,
    close_requested: bool,
    writes: Vec<(OutboundMessage, WritePromise)>,
}

impl ChannelActions {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the channel keep reading after this dispatch.
    pub fn request_read(&mut self) {
        self.read_requested = true;
    }

    /// Requests a flush of the pending write queue after this dispatch.
    pub fn request_flush(&mut self) {
        self.flush_requested = true;
    }

    /// Requests that the channel close after this dispatch.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Submits a payload for transmission after this dispatch.
    pub fn write(&mut self, message: OutboundMessage) -> PromiseHandle {
        let (promise, handle) = WritePromise::pair();
        self.writes.push((message, promise));
        handle
    }

    /// True if a handler re-requested a read during dispatch.
    pub fn read_requested(&self) -> bool {
        self.read_requested
    }

    /// True if a handler requested a flush during dispatch.
    pub fn flush_requested(&self) -> bool {
        self.flush_requested
    }

    /// True if a handler requested a close during dispatch.
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Drains the writes submitted during dispatch, in submission order.
    pub fn take_writes(&mut self) -> Vec<(OutboundMessage, WritePromise)> {
        std::mem::take(&mut self.writes)
    }
}

/// Inbound event contract between a channel and its handler chain.
///
/// Events arrive on the channel's loop thread in the order the channel
/// produced them. Default implementations ignore every event, so handlers
/// override only what they need.
pub trait Pipeline {
    /// The channel was registered on its event loop.
    fn channel_registered(&mut self, actions: &mut ChannelActions) {
        let _ = actions;
    }

    /// The channel was removed from its event loop.
    fn channel_unregistered(&mut self, actions: &mut ChannelActions) {
        let _ = actions;
    }

    /// The channel's socket is connected and usable.
    fn channel_active(&mut self, actions: &mut ChannelActions) {
        let _ = actions;
    }

    /// The channel's socket is closed.
    fn channel_inactive(&mut self, actions: &mut ChannelActions) {
        let _ = actions;
    }

    /// Bytes arrived from the socket.
    fn channel_read(&mut self, actions: &mut ChannelActions, buffer: ByteCursor) {
        let _ = (actions, buffer);
    }

    /// The read batch for this readiness notification is finished.
    fn channel_read_complete(&mut self, actions: &mut ChannelActions) {
        let _ = actions;
    }

    /// The channel's writability flipped. Channels start implicitly
    /// writable; notifications alternate false/true from there.
    fn writability_changed(&mut self, actions: &mut ChannelActions, writable: bool) {
        let _ = (actions, writable);
    }

    /// An error surfaced on the channel.
    fn error_caught(&mut self, actions: &mut ChannelActions, error: ErrorKind) {
        let _ = (actions, error);
    }
}

/// Pipeline that ignores every event.
///
/// This is the default pipeline when none is specified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPipeline;

impl Pipeline for NoOpPipeline {}
