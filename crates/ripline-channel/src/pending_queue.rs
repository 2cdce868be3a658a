//! FIFO of pending writes with vectored draining.
//!
//! Buffers submitted by users wait here until the socket accepts them.
//! Draining coalesces the queue into a single plain or gathering write per
//! attempt; buffer cursors advance only after the syscall result is known,
//! so a would-block leaves the queue untouched.

use std::{
    collections::VecDeque,
    io::{self, IoSlice},
};

use ripline_core::{
    buffer::ByteCursor,
    completion::WritePromise,
    constants::DEFAULT_WRITEV_LIMIT,
    error::ErrorKind,
    transport::StreamSocket,
};

/// Destination of a drain attempt: one plain write or one gathering write.
///
/// Any [`StreamSocket`] is a sink; tests substitute scripted sinks.
pub trait WriteSink {
    /// Transmits a single contiguous buffer.
    fn write_single(&mut self, buf: &[u8]) -> io::Result<Option<usize>>;

    /// Transmits multiple buffers in order with one syscall.
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<Option<usize>>;
}

impl<S: StreamSocket> WriteSink for S {
    fn write_single(&mut self, buf: &[u8]) -> io::Result<Option<usize>> {
        self.write(buf)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<Option<usize>> {
        self.writev(bufs)
    }
}

/// One buffered write awaiting transmission.
#[derive(Debug)]
struct PendingWrite {
    buffer: ByteCursor,
    promise: WritePromise,
}

/// FIFO of pending writes with an outstanding-bytes counter.
///
/// Invariants: `outstanding` equals the sum of unread bytes across queued
/// nodes, and the queue is empty exactly when `outstanding` is zero.
/// Completions fire in enqueue order, each exactly once, and a node is
/// unlinked from the queue before its completion is signaled.
#[derive(Debug)]
pub struct PendingWriteQueue {
    writes: VecDeque<PendingWrite>,
    outstanding: usize,
    /// Max buffers offered to one gathering write
    writev_limit: usize,
}

impl PendingWriteQueue {
    /// Creates a queue offering at most `writev_limit` buffers per gathering write.
    pub fn new(writev_limit: usize) -> Self {
        assert!(writev_limit > 0, "writev_limit must be positive");
        Self { writes: VecDeque::new(), outstanding: 0, writev_limit }
    }

    /// Appends a buffer and its completion to the queue.
    pub fn enqueue(&mut self, buffer: ByteCursor, promise: WritePromise) {
        debug_assert!(buffer.readable_bytes() > 0, "enqueued buffer must have unread bytes");
        self.outstanding += buffer.readable_bytes();
        self.writes.push_back(PendingWrite { buffer, promise });
    }

    /// Returns true if no writes are queued.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Returns the number of queued writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns the total unsent bytes across all queued writes.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Attempts one drain step against `sink`.
    ///
    /// Returns `Ok(None)` if the queue is empty, `Ok(Some(true))` if the
    /// offered batch was fully accepted (there may be more work), and
    /// `Ok(Some(false))` if the sink blocked or accepted only part of the
    /// batch. A sink error propagates with the queue unchanged.
    ///
    /// A lone queued buffer goes through `write_single`; two or more go
    /// through `write_vectored`, capped at the queue's writev limit.
    /// Fully-drained nodes are unlinked and succeeded in FIFO order; a
    /// partially-drained head has its cursor advanced in place.
    pub fn consume<K>(&mut self, sink: &mut K) -> io::Result<Option<bool>>
    where
        K: WriteSink + ?Sized,
    {
        if self.writes.is_empty() {
            return Ok(None);
        }

        let (accepted, offered) = if self.writes.len() == 1 {
            let buf = self.writes[0].buffer.as_readable();
            let offered = buf.len();
            match sink.write_single(buf)? {
                None => return Ok(Some(false)),
                Some(n) => (n, offered),
            }
        } else {
            let count = self.writes.len().min(self.writev_limit);
            let mut slices = Vec::with_capacity(count);
            for write in self.writes.iter().take(count) {
                slices.push(IoSlice::new(write.buffer.as_readable()));
            }
            let offered: usize = slices.iter().map(|slice| slice.len()).sum();
            match sink.write_vectored(&slices)? {
                None => return Ok(Some(false)),
                Some(n) => (n, offered),
            }
        };

        assert!(accepted <= offered, "sink accepted more bytes than offered");
        if accepted == 0 {
            // Zero-byte acceptance is kernel backpressure; report partial
            // without looping.
            return Ok(Some(false));
        }

        self.outstanding -= accepted;
        let mut remaining = accepted;
        while remaining > 0 {
            let head_len = match self.writes.front() {
                Some(write) => write.buffer.readable_bytes(),
                None => break,
            };
            if remaining >= head_len {
                // Unlink before signaling: the completion may enqueue again
                // and must observe a consistent queue.
                if let Some(write) = self.writes.pop_front() {
                    write.promise.succeed();
                }
                remaining -= head_len;
            } else {
                if let Some(write) = self.writes.front_mut() {
                    write.buffer.skip(remaining);
                }
                remaining = 0;
            }
        }

        Ok(Some(accepted == offered))
    }

    /// Fails every queued write with `error`, emptying the queue.
    pub fn fail_all(&mut self, error: &ErrorKind) {
        while let Some(write) = self.writes.pop_front() {
            self.outstanding -= write.buffer.readable_bytes();
            write.promise.fail(error.clone());
        }
        debug_assert_eq!(self.outstanding, 0);
    }
}

impl Default for PendingWriteQueue {
    fn default() -> Self {
        Self::new(DEFAULT_WRITEV_LIMIT)
    }
}
