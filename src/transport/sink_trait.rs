//! Trait abstraction for datagram output to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for sending whole GDL-90 frames as datagrams
#[async_trait]
pub trait DatagramSink: Send {
    /// Send one datagram, returning the number of bytes written
    async fn send(&mut self, data: &[u8]) -> io::Result<usize>;
}
