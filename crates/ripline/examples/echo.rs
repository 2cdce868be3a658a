//! Round-trips a message through a local echo peer over one channel.
//!
//! Run:
//! - cargo run -p ripline --example echo

use std::{
    io::{Read, Write},
    net::TcpListener,
    thread,
    time::Duration,
};

use ripline::prelude::*;

/// Registration bookkeeping for a loop that polls unconditionally.
struct InlineLoop;

impl LoopHandle for InlineLoop {
    fn register(&mut self, _interest: Interest) -> std::io::Result<()> {
        Ok(())
    }

    fn reregister(&mut self, _interest: Interest) -> std::io::Result<()> {
        Ok(())
    }

    fn deregister(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Collects echoed bytes and prints channel events.
#[derive(Default)]
struct EchoPrinter {
    received: Vec<u8>,
}

impl Pipeline for EchoPrinter {
    fn channel_active(&mut self, _actions: &mut ChannelActions) {
        println!("[active]");
    }

    fn channel_read(&mut self, _actions: &mut ChannelActions, buffer: ByteCursor) {
        println!("[read] {} bytes", buffer.readable_bytes());
        self.received.extend_from_slice(buffer.as_readable());
    }

    fn writability_changed(&mut self, _actions: &mut ChannelActions, writable: bool) {
        println!("[writability] {}", writable);
    }

    fn channel_inactive(&mut self, _actions: &mut ChannelActions) {
        println!("[inactive]");
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?;

    // Echo peer: copies everything back until the client hangs up.
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            while let Ok(n) = stream.read(&mut buf) {
                if n == 0 || stream.write_all(&buf[..n]).is_err() {
                    break;
                }
            }
        }
    });

    let message = b"hello, ripline";
    let socket = TcpStreamSocket::connect(address)?;
    let mut channel = Channel::new(
        socket,
        InlineLoop,
        EchoPrinter::default(),
        &ChannelConfig::default(),
    );
    channel.register(|_| Ok(()))?;

    let written = channel.write(OutboundMessage::Bytes(ByteCursor::from(&message[..])));
    channel.flush();

    // Poll both edges until the echo comes back.
    for _ in 0..400 {
        if channel.interest().contains_write() {
            channel.handle_writable();
        }
        channel.handle_readable();
        if channel.pipeline().received.len() >= message.len() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    println!("write outcome: {:?}", written.outcome());
    println!(
        "echoed back: {:?}",
        String::from_utf8_lossy(&channel.pipeline().received)
    );
    channel.close()?;
    Ok(())
}
