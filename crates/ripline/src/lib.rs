#![warn(missing_docs)]

//! Ripline: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports
//! the most commonly used types to build non-blocking byte-stream
//! channels:
//!
//! - Channel and its options (`Channel`, `ChannelOption`, `ChannelConfig`)
//! - The contracts a channel consumes (`StreamSocket`, `LoopHandle`, `Pipeline`)
//! - Buffers and completions (`ByteCursor`, `PromiseHandle`)
//! - A concrete TCP transport (`TcpStreamSocket`)
//!
//! Example
//! ```ignore
//! use ripline::prelude::*;
//!
//! let socket = TcpStreamSocket::connect("127.0.0.1:9000".parse().unwrap())?;
//! let mut channel = Channel::new(socket, my_loop_handle, my_pipeline,
//!     &ChannelConfig::default());
//! channel.register(|_| Ok(()))?;
//!
//! let written = channel.write(OutboundMessage::Bytes(b"hello".as_slice().into()));
//! channel.flush();
//! // The event loop drives the rest via handle_readable / handle_writable.
//! ```

// Core types: buffers, completions, config, errors, contracts
pub use ripline_core::{
    buffer::ByteCursor,
    completion::{PromiseHandle, WriteOutcome, WritePromise},
    config::ChannelConfig,
    constants,
    error::{ErrorKind, Result},
    options::{SocketOption, SocketOptionKey},
    pipeline::{ChannelActions, NoOpPipeline, OutboundMessage, Pipeline},
    pool::BufferPool,
    transport::StreamSocket,
};
// Channel engine: the channel, interest tracking, queue, strategies
pub use ripline_channel::{
    event_loop::LoopHandle,
    interest::{Interest, InterestState, LoopCommand},
    pending_queue::{PendingWriteQueue, WriteSink},
    recv_alloc::{AdaptiveRecvAllocator, FixedRecvAllocator, RecvAllocator},
    statistics::ChannelStatistics,
    Channel, ChannelOption, ChannelOptionKey,
};
// Concrete TCP transport
pub use ripline_tcp::TcpStreamSocket;

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        ByteCursor, Channel, ChannelActions, ChannelConfig, ChannelOption, ErrorKind, Interest,
        LoopHandle, NoOpPipeline, OutboundMessage, Pipeline, PromiseHandle, RecvAllocator, Result,
        StreamSocket, TcpStreamSocket,
    };
}
