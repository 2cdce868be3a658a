use std::net::SocketAddr;

use ripline_core::{
    buffer::ByteCursor,
    completion::{PromiseHandle, WritePromise},
    config::ChannelConfig,
    error::{ErrorKind, Result},
    options::{SocketOption, SocketOptionKey},
    pipeline::{ChannelActions, OutboundMessage, Pipeline},
    pool::BufferPool,
    transport::StreamSocket,
};
use tracing::{error, warn};

use crate::{
    event_loop::LoopHandle,
    interest::{Interest, InterestState, LoopCommand},
    pending_queue::PendingWriteQueue,
    recv_alloc::RecvAllocator,
    statistics::ChannelStatistics,
};

/// Channel-level options.
#[derive(Debug, Clone)]
pub enum ChannelOption {
    /// Socket-level option passed through to the operating system.
    Socket(SocketOption),
    /// Re-request reads automatically after each read batch.
    /// Enabling starts reading; disabling stops it.
    AutoRead(bool),
    /// Bound on read attempts per readiness notification.
    MaxMessagesPerRead(u32),
    /// Receive-buffer sizing strategy.
    RecvAlloc(RecvAllocator),
    /// Number of recycled read buffers the pool may retain.
    Allocator {
        /// Pool retention limit.
        max_pooled: usize,
    },
}

/// Keys naming the channel-level option slots, used for reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOptionKey {
    /// A socket-level option slot.
    Socket(SocketOptionKey),
    /// The auto-read flag.
    AutoRead,
    /// The per-notification read bound.
    MaxMessagesPerRead,
    /// The receive-buffer sizing strategy.
    RecvAlloc,
    /// The read-buffer pool retention limit.
    Allocator,
}

/// How one read batch ended.
enum BatchEnd {
    WouldBlock,
    BudgetExhausted,
    Eof,
    Failed(ErrorKind),
}

/// Owner of one connected socket and its buffered outbound queue.
///
/// A channel mediates between an event loop (which notifies it of
/// readiness edges through [`handle_readable`](Channel::handle_readable) /
/// [`handle_writable`](Channel::handle_writable)) and a pipeline of
/// handlers (which it notifies of inbound events). All methods run on the
/// channel's loop thread; the type is deliberately not `Send`.
pub struct Channel<S, L, P> {
    socket: S,
    loop_handle: L,
    pipeline: P,
    queue: PendingWriteQueue,
    interest: InterestState,
    open: bool,
    read_pending: bool,
    auto_read: bool,
    /// Last writability reported to the pipeline; starts implicitly true
    writable: bool,
    max_messages_per_read: u32,
    recv_alloc: RecvAllocator,
    pool: BufferPool,
    statistics: ChannelStatistics,
    /// Socket options from the config, applied at registration
    seed_options: Vec<SocketOption>,
}

impl<S, L, P> Channel<S, L, P>
where
    S: StreamSocket,
    L: LoopHandle,
    P: Pipeline,
{
    /// Creates a channel owning `socket`, registered nowhere yet.
    pub fn new(socket: S, loop_handle: L, pipeline: P, config: &ChannelConfig) -> Self {
        let recv_alloc = if config.adaptive_recv {
            RecvAllocator::adaptive(
                config.recv_buffer_min,
                config.recv_buffer_size,
                config.recv_buffer_max,
            )
        } else {
            RecvAllocator::fixed(config.recv_buffer_size)
        };
        // The socket's vector bound wins over a larger configured one.
        let writev_limit = config.writev_limit.min(socket.writev_limit());

        Channel {
            socket,
            loop_handle,
            pipeline,
            queue: PendingWriteQueue::new(writev_limit),
            interest: InterestState::new(),
            open: true,
            read_pending: false,
            auto_read: config.auto_read,
            writable: true,
            max_messages_per_read: config.max_messages_per_read,
            recv_alloc,
            pool: BufferPool::new(config.max_pooled_buffers),
            statistics: ChannelStatistics::default(),
            seed_options: seed_options(config),
        }
    }

    /// Registers the channel on its event loop with read interest, applies
    /// configured socket options, runs `init` to populate the pipeline, and
    /// fires `channel_registered` / `channel_active`.
    ///
    /// A registration or initialization failure is reported through the
    /// pipeline and closes the channel.
    pub fn register<F>(&mut self, init: F) -> Result<()>
    where
        F: FnOnce(&mut P) -> Result<()>,
    {
        if !self.open {
            return Err(ErrorKind::ChannelClosed);
        }

        for option in std::mem::take(&mut self.seed_options) {
            if let Err(err) = self.socket.set_option(&option) {
                let error = ErrorKind::from(err);
                error!("applying configured socket option {:?} failed: {}", option, error);
                return Err(self.fail_and_close(error));
            }
        }

        if let Some(command) = self.interest.include_read() {
            if let Err(err) = self.issue(command) {
                let error = ErrorKind::from(err);
                error!("event loop registration failed: {}", error);
                return Err(self.fail_and_close(error));
            }
        }
        self.read_pending = self.auto_read;

        if let Err(error) = init(&mut self.pipeline) {
            return Err(self.fail_and_close(error));
        }

        let mut actions = ChannelActions::new();
        self.pipeline.channel_registered(&mut actions);
        self.pipeline.channel_active(&mut actions);
        self.apply_actions(actions);
        Ok(())
    }

    /// Binds the local endpoint of the owned socket. Interest is unchanged.
    pub fn bind(&mut self, address: SocketAddr) -> Result<()> {
        if !self.open {
            return Err(ErrorKind::ChannelClosed);
        }
        self.socket.bind(address).map_err(ErrorKind::from)
    }

    /// Queues a payload for transmission.
    ///
    /// Bytes are buffered until [`flush`](Channel::flush); the returned
    /// handle settles once the socket has accepted the whole payload, or
    /// fails with the close error if the channel closes first. Non-byte
    /// payloads fail immediately without touching channel state.
    pub fn write(&mut self, message: OutboundMessage) -> PromiseHandle {
        let (promise, handle) = WritePromise::pair();
        self.submit(message, promise);
        handle
    }

    /// Drains queued writes into the socket.
    ///
    /// If write interest is already armed the call is a no-op: the write
    /// pending at the loop will drive the queue on the next writable edge.
    /// Otherwise the queue is drained until empty or backpressure; on
    /// backpressure the channel arms write interest and reports
    /// `writability_changed(false)`.
    pub fn flush(&mut self) {
        if !self.open {
            return;
        }
        if self.interest.current().contains_write() {
            return;
        }

        self.statistics.flushes += 1;
        let before = self.queue.outstanding();
        match self.flush_now() {
            Ok(true) => {
                self.statistics.bytes_written += (before - self.queue.outstanding()) as u64;
            }
            Ok(false) => {
                self.statistics.bytes_written += (before - self.queue.outstanding()) as u64;
                self.statistics.partial_flushes += 1;
                let command = self.interest.include_write();
                self.update_interest(command);
                self.report_writability(false);
            }
            Err(error) => {
                error!("flush failed: {}", error);
                self.fail_and_close(error);
            }
        }
    }

    /// Drives the pending queue from the loop's writable edge.
    ///
    /// On a full drain the channel reports `writability_changed(true)` and
    /// rearms read interest if a read is pending, or deregisters entirely.
    pub fn handle_writable(&mut self) {
        if !self.open {
            return;
        }

        self.statistics.flushes += 1;
        let before = self.queue.outstanding();
        match self.flush_now() {
            Ok(true) => {
                self.statistics.bytes_written += (before - self.queue.outstanding()) as u64;
                self.report_writability(true);
                if self.open {
                    let target = if self.read_pending { Interest::Read } else { Interest::None };
                    let command = self.interest.transition_to(target);
                    self.update_interest(command);
                }
            }
            Ok(false) => {
                // Still backed up; write interest stays armed.
                self.statistics.bytes_written += (before - self.queue.outstanding()) as u64;
                self.statistics.partial_flushes += 1;
            }
            Err(error) => {
                error!("flush from event loop failed: {}", error);
                self.fail_and_close(error);
            }
        }
    }

    /// Drains the socket from the loop's readable edge.
    ///
    /// Reads at most `max_messages_per_read` buffers, firing
    /// `channel_read` for each, then `channel_read_complete`. End-of-stream
    /// closes the channel; a syscall error fires `error_caught` and
    /// `channel_read_complete` before closing. Afterwards, read interest is
    /// withdrawn unless auto-read or a handler re-requested it.
    pub fn handle_readable(&mut self) {
        if !self.open {
            return;
        }
        self.read_pending = false;

        let mut actions = ChannelActions::new();
        let mut end = BatchEnd::BudgetExhausted;
        for _ in 0..self.max_messages_per_read {
            let capacity = self.recv_alloc.next_capacity();
            let mut buffer = self.pool.allocate(capacity);
            match self.socket.read(&mut buffer) {
                Ok(None) => {
                    self.pool.deallocate(buffer);
                    end = BatchEnd::WouldBlock;
                    break;
                }
                Ok(Some(0)) => {
                    self.pool.deallocate(buffer);
                    end = BatchEnd::Eof;
                    break;
                }
                Ok(Some(n)) => {
                    self.recv_alloc.record_read(n);
                    self.statistics.reads += 1;
                    self.statistics.bytes_read += n as u64;
                    buffer.truncate(n);
                    self.pipeline.channel_read(&mut actions, ByteCursor::from_vec(buffer));
                }
                Err(err) => {
                    self.pool.deallocate(buffer);
                    end = BatchEnd::Failed(ErrorKind::from(err));
                    break;
                }
            }
        }

        match end {
            BatchEnd::Eof => {
                self.apply_actions(actions);
                self.close();
            }
            BatchEnd::Failed(error) => {
                error!("read from event loop failed: {}", error);
                self.pipeline.error_caught(&mut actions, error.clone());
                self.pipeline.channel_read_complete(&mut actions);
                self.apply_actions(actions);
                if let Err(close_error) = self.close_with(error) {
                    warn!("socket close after read failure failed: {}", close_error);
                }
            }
            BatchEnd::WouldBlock | BatchEnd::BudgetExhausted => {
                self.pipeline.channel_read_complete(&mut actions);
                self.apply_actions(actions);
                if self.auto_read {
                    self.start_reading();
                }
                if self.open && !self.read_pending {
                    let command = self.interest.exclude_read();
                    self.update_interest(command);
                }
            }
        }
    }

    /// Requests that the channel read from its socket, arming read interest.
    pub fn start_reading(&mut self) {
        if !self.open {
            return;
        }
        self.read_pending = true;
        let command = self.interest.include_read();
        self.update_interest(command);
    }

    /// Withdraws the channel's read interest.
    pub fn stop_reading(&mut self) {
        if !self.open {
            return;
        }
        self.read_pending = false;
        let command = self.interest.exclude_read();
        self.update_interest(command);
    }

    /// Closes the channel, failing queued writes with the default close error.
    pub fn close(&mut self) -> Result<()> {
        self.close_with(ErrorKind::ChannelClosed)
    }

    /// Closes the channel, failing queued writes with `error`.
    ///
    /// Idempotent: closing an already-closed channel succeeds immediately,
    /// fires no events, and does not re-close the socket. Otherwise the
    /// channel deregisters, closes its socket, fires
    /// `channel_unregistered` then `channel_inactive`, and only then fails
    /// the pending writes, so handlers observe an inactive channel in
    /// their teardown path.
    pub fn close_with(&mut self, error: ErrorKind) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        if self.interest.current() != Interest::None {
            self.interest.clear();
            if let Err(err) = self.loop_handle.deregister() {
                warn!("deregister during close failed: {}", err);
            }
        }

        let close_result = self.socket.close().map_err(ErrorKind::from);

        let mut actions = ChannelActions::new();
        self.pipeline.channel_unregistered(&mut actions);
        self.pipeline.channel_inactive(&mut actions);
        self.queue.fail_all(&error);
        self.apply_actions(actions);

        close_result
    }

    /// Applies a channel- or socket-level option.
    pub fn set_option(&mut self, option: ChannelOption) -> Result<()> {
        match option {
            ChannelOption::Socket(option) => {
                self.socket.set_option(&option).map_err(ErrorKind::from)
            }
            ChannelOption::AutoRead(enabled) => {
                let was_enabled = self.auto_read;
                self.auto_read = enabled;
                if enabled && !was_enabled {
                    self.start_reading();
                } else if !enabled && was_enabled {
                    self.stop_reading();
                }
                Ok(())
            }
            ChannelOption::MaxMessagesPerRead(limit) => {
                assert!(limit > 0, "max_messages_per_read must be positive");
                self.max_messages_per_read = limit;
                Ok(())
            }
            ChannelOption::RecvAlloc(alloc) => {
                self.recv_alloc = alloc;
                Ok(())
            }
            ChannelOption::Allocator { max_pooled } => {
                self.pool.set_max_pooled(max_pooled);
                Ok(())
            }
        }
    }

    /// Reads back an option's current value.
    pub fn get_option(&self, key: ChannelOptionKey) -> Result<ChannelOption> {
        match key {
            ChannelOptionKey::Socket(key) => {
                let option = self.socket.get_option(key).map_err(ErrorKind::from)?;
                Ok(ChannelOption::Socket(option))
            }
            ChannelOptionKey::AutoRead => Ok(ChannelOption::AutoRead(self.auto_read)),
            ChannelOptionKey::MaxMessagesPerRead => {
                Ok(ChannelOption::MaxMessagesPerRead(self.max_messages_per_read))
            }
            ChannelOptionKey::RecvAlloc => {
                Ok(ChannelOption::RecvAlloc(self.recv_alloc.clone()))
            }
            ChannelOptionKey::Allocator => {
                Ok(ChannelOption::Allocator { max_pooled: self.pool.max_pooled() })
            }
        }
    }

    /// Returns true until the channel closes.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns the writability last reported to the pipeline.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns the interest currently armed at the event loop.
    pub fn interest(&self) -> Interest {
        self.interest.current()
    }

    /// Returns the total unsent bytes across queued writes.
    pub fn outstanding_bytes(&self) -> usize {
        self.queue.outstanding()
    }

    /// Returns the number of queued writes.
    pub fn queued_writes(&self) -> usize {
        self.queue.len()
    }

    /// Returns the channel's activity counters.
    pub fn statistics(&self) -> &ChannelStatistics {
        &self.statistics
    }

    /// Resets the channel's activity counters.
    pub fn reset_statistics(&mut self) {
        self.statistics.reset();
    }

    /// Returns a reference to the pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Returns a mutable reference to the pipeline.
    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    /// Returns a reference to the owned socket.
    pub fn socket(&self) -> &S {
        &self.socket
    }

    /// Returns a mutable reference to the owned socket.
    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    /// Returns the local address of the owned socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(ErrorKind::from)
    }

    /// Returns the remote address of the owned socket.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.socket.peer_addr().map_err(ErrorKind::from)
    }

    /// Drains the queue until empty, backpressure, or close.
    fn flush_now(&mut self) -> Result<bool> {
        while self.open {
            match self.queue.consume(&mut self.socket) {
                Ok(None) => return Ok(true),
                Ok(Some(true)) => continue,
                Ok(Some(false)) => return Ok(false),
                Err(err) => return Err(ErrorKind::from(err)),
            }
        }
        // Closed mid-drain (a completion may close the channel); the close
        // path has already settled the queue.
        Ok(true)
    }

    fn submit(&mut self, message: OutboundMessage, promise: WritePromise) {
        if !self.open {
            promise.fail(ErrorKind::ChannelClosed);
            return;
        }
        match message {
            OutboundMessage::Bytes(buffer) => {
                if buffer.readable_bytes() == 0 {
                    promise.succeed();
                    return;
                }
                self.statistics.writes_enqueued += 1;
                self.queue.enqueue(buffer, promise);
            }
            OutboundMessage::Datagram { target, .. } => {
                warn!("rejecting addressed datagram for {} on a byte-stream channel", target);
                promise.fail(ErrorKind::UnsupportedMessage("datagram"));
            }
        }
    }

    fn issue(&mut self, command: LoopCommand) -> std::io::Result<()> {
        match command {
            LoopCommand::Register(interest) => self.loop_handle.register(interest),
            LoopCommand::Reregister(interest) => self.loop_handle.reregister(interest),
            LoopCommand::Deregister => self.loop_handle.deregister(),
        }
    }

    /// Issues an interest change; a failed loop call is fatal.
    fn update_interest(&mut self, command: Option<LoopCommand>) {
        let Some(command) = command else { return };
        if !self.open {
            return;
        }
        if let Err(err) = self.issue(command) {
            let error = ErrorKind::from(err);
            error!("interest update failed: {}", error);
            self.fail_and_close(error);
        }
    }

    /// Reports the error to the pipeline and closes with it. Returns the
    /// error for callers that propagate it.
    fn fail_and_close(&mut self, error: ErrorKind) -> ErrorKind {
        let mut actions = ChannelActions::new();
        self.pipeline.error_caught(&mut actions, error.clone());
        self.apply_actions(actions);
        if let Err(close_error) = self.close_with(error.clone()) {
            warn!("socket close failed: {}", close_error);
        }
        error
    }

    /// Fires `writability_changed` only when the state actually flips, so
    /// notifications alternate starting from implicit-true.
    fn report_writability(&mut self, writable: bool) {
        if self.writable == writable {
            return;
        }
        self.writable = writable;
        let mut actions = ChannelActions::new();
        self.pipeline.writability_changed(&mut actions, writable);
        self.apply_actions(actions);
    }

    /// Applies operations handlers deferred during dispatch.
    fn apply_actions(&mut self, mut actions: ChannelActions) {
        for (message, promise) in actions.take_writes() {
            self.submit(message, promise);
        }
        if actions.flush_requested() {
            self.flush();
        }
        if actions.read_requested() {
            self.start_reading();
        }
        if actions.close_requested() {
            let _ = self.close();
        }
    }
}

impl<S, L, P> std::fmt::Debug for Channel<S, L, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("open", &self.open)
            .field("interest", &self.interest.current())
            .field("read_pending", &self.read_pending)
            .field("auto_read", &self.auto_read)
            .field("writable", &self.writable)
            .field("outstanding", &self.queue.outstanding())
            .finish()
    }
}

fn seed_options(config: &ChannelConfig) -> Vec<SocketOption> {
    let mut options = Vec::new();
    if let Some(size) = config.socket_recv_buffer_size {
        options.push(SocketOption::RecvBufferSize(size));
    }
    if let Some(size) = config.socket_send_buffer_size {
        options.push(SocketOption::SendBufferSize(size));
    }
    if config.socket_nodelay {
        options.push(SocketOption::NoDelay(true));
    }
    if config.socket_keepalive {
        options.push(SocketOption::KeepAlive(true));
    }
    if let Some(ttl) = config.socket_ttl {
        options.push(SocketOption::Ttl(ttl));
    }
    options
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::VecDeque,
        io::{self, IoSlice},
        rc::Rc,
    };

    use super::*;

    /// Socket whose reads and writes follow a script.
    #[derive(Default)]
    struct MockSocket {
        reads: VecDeque<io::Result<Option<Vec<u8>>>>,
        writes: VecDeque<io::Result<Option<usize>>>,
        written: Vec<u8>,
        applied_options: Vec<SocketOption>,
        closed: bool,
        close_calls: u32,
    }

    impl MockSocket {
        fn accept_writes(mut self, counts: &[usize]) -> Self {
            for count in counts {
                self.writes.push_back(Ok(Some(*count)));
            }
            self
        }

        fn take_written(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.written)
        }

        fn record_accepted(&mut self, bufs: &[IoSlice<'_>], mut accepted: usize) {
            for buf in bufs {
                let n = accepted.min(buf.len());
                self.written.extend_from_slice(&buf[..n]);
                accepted -= n;
                if accepted == 0 {
                    break;
                }
            }
        }
    }

    impl StreamSocket for MockSocket {
        fn bind(&mut self, _address: SocketAddr) -> io::Result<()> {
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
            match self.reads.pop_front() {
                Some(Ok(Some(bytes))) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(Some(n))
                }
                Some(Ok(None)) | None => Ok(None),
                Some(Err(err)) => Err(err),
            }
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<Option<usize>> {
            match self.writes.pop_front() {
                Some(Ok(Some(n))) => {
                    let n = n.min(buf.len());
                    self.written.extend_from_slice(&buf[..n]);
                    Ok(Some(n))
                }
                Some(other) => other,
                None => Ok(None),
            }
        }

        fn writev(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<Option<usize>> {
            match self.writes.pop_front() {
                Some(Ok(Some(n))) => {
                    self.record_accepted(bufs, n);
                    Ok(Some(n))
                }
                Some(other) => other,
                None => Ok(None),
            }
        }

        fn close(&mut self) -> io::Result<()> {
            self.closed = true;
            self.close_calls += 1;
            Ok(())
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok("127.0.0.1:4000".parse().unwrap())
        }

        fn peer_addr(&self) -> io::Result<SocketAddr> {
            Ok("127.0.0.1:5000".parse().unwrap())
        }

        fn set_option(&mut self, option: &SocketOption) -> io::Result<()> {
            self.applied_options.push(option.clone());
            Ok(())
        }

        fn get_option(&self, key: SocketOptionKey) -> io::Result<SocketOption> {
            self.applied_options
                .iter()
                .rev()
                .find(|option| option.key() == key)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "option never set"))
        }
    }

    /// Loop handle recording every registration call.
    #[derive(Clone, Default)]
    struct RecordingLoop {
        calls: Rc<RefCell<Vec<LoopCommand>>>,
        fail_next: Rc<RefCell<bool>>,
    }

    impl RecordingLoop {
        fn record(&self, command: LoopCommand) -> io::Result<()> {
            if *self.fail_next.borrow() {
                *self.fail_next.borrow_mut() = false;
                return Err(io::Error::new(io::ErrorKind::Other, "selector rejected"));
            }
            self.calls.borrow_mut().push(command);
            Ok(())
        }
    }

    impl LoopHandle for RecordingLoop {
        fn register(&mut self, interest: Interest) -> io::Result<()> {
            self.record(LoopCommand::Register(interest))
        }

        fn reregister(&mut self, interest: Interest) -> io::Result<()> {
            self.record(LoopCommand::Reregister(interest))
        }

        fn deregister(&mut self) -> io::Result<()> {
            self.record(LoopCommand::Deregister)
        }
    }

    fn quiet_config() -> ChannelConfig {
        ChannelConfig { auto_read: false, ..ChannelConfig::default() }
    }

    fn bytes(payload: &[u8]) -> OutboundMessage {
        OutboundMessage::Bytes(ByteCursor::from(payload))
    }

    type TestChannel = Channel<MockSocket, RecordingLoop, ripline_core::pipeline::NoOpPipeline>;

    fn channel_with(socket: MockSocket, config: &ChannelConfig) -> (TestChannel, RecordingLoop) {
        let handle = RecordingLoop::default();
        let channel = Channel::new(
            socket,
            handle.clone(),
            ripline_core::pipeline::NoOpPipeline,
            config,
        );
        (channel, handle)
    }

    #[test]
    fn test_write_on_closed_channel_fails() {
        let (mut channel, _) = channel_with(MockSocket::default(), &quiet_config());
        channel.close().unwrap();

        let handle = channel.write(bytes(b"X"));
        assert_eq!(handle.outcome(), Some(Err(ErrorKind::ChannelClosed)));
        assert_eq!(channel.outstanding_bytes(), 0);
    }

    #[test]
    fn test_datagram_payload_is_unsupported() {
        let (mut channel, _) = channel_with(MockSocket::default(), &quiet_config());

        let handle = channel.write(OutboundMessage::Datagram {
            target: "10.0.0.1:9".parse().unwrap(),
            payload: ByteCursor::from(&b"nope"[..]),
        });

        assert_eq!(
            handle.outcome(),
            Some(Err(ErrorKind::UnsupportedMessage("datagram")))
        );
        assert!(channel.is_open());
        assert_eq!(channel.queued_writes(), 0);
    }

    #[test]
    fn test_empty_write_succeeds_without_queueing() {
        let (mut channel, _) = channel_with(MockSocket::default(), &quiet_config());

        let handle = channel.write(bytes(b""));
        assert_eq!(handle.outcome(), Some(Ok(())));
        assert_eq!(channel.queued_writes(), 0);
    }

    #[test]
    fn test_flush_writes_through_socket() {
        let socket = MockSocket::default().accept_writes(&[5]);
        let (mut channel, handle) = channel_with(socket, &quiet_config());

        let write = channel.write(bytes(b"hello"));
        channel.flush();

        assert_eq!(write.outcome(), Some(Ok(())));
        assert_eq!(channel.socket_mut().take_written(), b"hello");
        assert_eq!(channel.interest(), Interest::None);
        assert!(handle.calls.borrow().is_empty());
        assert_eq!(channel.statistics().bytes_written, 5);
    }

    #[test]
    fn test_flush_while_write_armed_is_noop() {
        // First flush hits backpressure and arms write interest.
        let socket = MockSocket::default();
        let (mut channel, handle) = channel_with(socket, &quiet_config());

        channel.write(bytes(b"backlog"));
        channel.flush();
        assert_eq!(channel.interest(), Interest::Write);
        let calls_after_first = handle.calls.borrow().len();

        // Second flush must not touch the socket or the loop.
        channel.flush();
        assert_eq!(handle.calls.borrow().len(), calls_after_first);
        assert_eq!(channel.statistics().flushes, 1);
    }

    #[test]
    fn test_auto_read_option_is_idempotent() {
        let (mut channel, handle) = channel_with(MockSocket::default(), &quiet_config());

        channel.set_option(ChannelOption::AutoRead(true)).unwrap();
        let calls_after_first = handle.calls.borrow().clone();
        assert_eq!(calls_after_first, vec![LoopCommand::Register(Interest::Read)]);

        channel.set_option(ChannelOption::AutoRead(true)).unwrap();
        assert_eq!(*handle.calls.borrow(), calls_after_first);
    }

    #[test]
    fn test_auto_read_disable_withdraws_interest() {
        let (mut channel, handle) = channel_with(MockSocket::default(), &quiet_config());

        channel.set_option(ChannelOption::AutoRead(true)).unwrap();
        channel.set_option(ChannelOption::AutoRead(false)).unwrap();

        assert_eq!(
            *handle.calls.borrow(),
            vec![
                LoopCommand::Register(Interest::Read),
                LoopCommand::Deregister,
            ]
        );
        assert_eq!(channel.interest(), Interest::None);
    }

    #[test]
    fn test_channel_option_roundtrips() {
        let (mut channel, _) = channel_with(MockSocket::default(), &quiet_config());

        channel.set_option(ChannelOption::MaxMessagesPerRead(4)).unwrap();
        match channel.get_option(ChannelOptionKey::MaxMessagesPerRead).unwrap() {
            ChannelOption::MaxMessagesPerRead(limit) => assert_eq!(limit, 4),
            other => panic!("unexpected option: {:?}", other),
        }

        channel
            .set_option(ChannelOption::RecvAlloc(RecvAllocator::fixed(128)))
            .unwrap();
        match channel.get_option(ChannelOptionKey::RecvAlloc).unwrap() {
            ChannelOption::RecvAlloc(alloc) => assert_eq!(alloc.next_capacity(), 128),
            other => panic!("unexpected option: {:?}", other),
        }

        channel.set_option(ChannelOption::Allocator { max_pooled: 3 }).unwrap();
        match channel.get_option(ChannelOptionKey::Allocator).unwrap() {
            ChannelOption::Allocator { max_pooled } => assert_eq!(max_pooled, 3),
            other => panic!("unexpected option: {:?}", other),
        }
    }

    #[test]
    fn test_socket_option_passes_through() {
        let (mut channel, _) = channel_with(MockSocket::default(), &quiet_config());

        channel
            .set_option(ChannelOption::Socket(SocketOption::NoDelay(true)))
            .unwrap();

        match channel
            .get_option(ChannelOptionKey::Socket(SocketOptionKey::NoDelay))
            .unwrap()
        {
            ChannelOption::Socket(SocketOption::NoDelay(enabled)) => assert!(enabled),
            other => panic!("unexpected option: {:?}", other),
        }
    }

    #[test]
    fn test_register_applies_config_socket_options() {
        let mut config = quiet_config();
        config.socket_recv_buffer_size = Some(65536);
        config.socket_nodelay = true;

        let (mut channel, handle) = channel_with(MockSocket::default(), &config);
        channel.register(|_| Ok(())).unwrap();

        assert_eq!(
            channel.socket().applied_options,
            vec![
                SocketOption::RecvBufferSize(65536),
                SocketOption::NoDelay(true),
            ]
        );
        assert_eq!(*handle.calls.borrow(), vec![LoopCommand::Register(Interest::Read)]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut channel, handle) = channel_with(MockSocket::default(), &quiet_config());
        channel.set_option(ChannelOption::AutoRead(true)).unwrap();

        channel.close().unwrap();
        assert!(!channel.is_open());
        assert!(channel.socket().closed);
        assert_eq!(channel.socket().close_calls, 1);
        let calls_after_close = handle.calls.borrow().len();

        channel.close().unwrap();
        assert_eq!(channel.socket().close_calls, 1);
        assert_eq!(handle.calls.borrow().len(), calls_after_close);
    }

    #[test]
    fn test_stop_reading_withdraws_read_interest() {
        let (mut channel, handle) = channel_with(MockSocket::default(), &quiet_config());

        channel.start_reading();
        channel.stop_reading();

        assert_eq!(
            *handle.calls.borrow(),
            vec![
                LoopCommand::Register(Interest::Read),
                LoopCommand::Deregister,
            ]
        );
    }

    #[test]
    fn test_interest_failure_closes_channel() {
        let (mut channel, handle) = channel_with(MockSocket::default(), &quiet_config());
        *handle.fail_next.borrow_mut() = true;

        channel.start_reading();

        assert!(!channel.is_open());
        assert!(channel.socket().closed);
    }

    #[test]
    fn test_bind_delegates_to_socket() {
        let (mut channel, _) = channel_with(MockSocket::default(), &quiet_config());
        channel.bind("127.0.0.1:0".parse().unwrap()).unwrap();

        channel.close().unwrap();
        assert_eq!(
            channel.bind("127.0.0.1:0".parse().unwrap()),
            Err(ErrorKind::ChannelClosed)
        );
    }

    #[test]
    fn test_statistics_track_reads() {
        let mut socket = MockSocket::default();
        socket.reads.push_back(Ok(Some(b"abcd".to_vec())));
        let (mut channel, _) = channel_with(socket, &quiet_config());

        channel.handle_readable();

        assert_eq!(channel.statistics().reads, 1);
        assert_eq!(channel.statistics().bytes_read, 4);

        channel.reset_statistics();
        assert_eq!(channel.statistics().reads, 0);
    }
}
