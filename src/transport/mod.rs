//! # UDP Transport Module
//!
//! Sends encoded GDL-90 frames to an EFB over UDP.
//!
//! This module handles:
//! - Resolving the configured target address once at startup
//! - Binding an ephemeral local socket with broadcast enabled
//! - Sending one frame per datagram

pub mod sink_trait;

pub use sink_trait::DatagramSink;

use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::error::{Gdl90BridgeError, Result};

/// Conventional GDL-90 UDP port
pub const GDL90_DEFAULT_PORT: u16 = 4000;

/// Local bind address for IPv4 targets
const BIND_ADDR_V4: &str = "0.0.0.0:0";

/// Local bind address for IPv6 targets
const BIND_ADDR_V6: &str = "[::]:0";

/// Parse a numeric target address
///
/// Host names are not resolved; EFB targets are configured as IP literals.
///
/// # Errors
///
/// Returns `InvalidTarget` if `ip` is not a valid IPv4 or IPv6 address
pub fn resolve_target(ip: &str, port: u16) -> Result<SocketAddr> {
    let addr: IpAddr = ip
        .trim()
        .parse()
        .map_err(|_| Gdl90BridgeError::InvalidTarget(ip.to_string()))?;

    Ok(SocketAddr::new(addr, port))
}

/// UDP sender bound to a single target
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl UdpTransport {
    /// Open a UDP socket for the configured target
    ///
    /// # Arguments
    ///
    /// * `config` - Network section of the configuration
    ///
    /// # Returns
    ///
    /// * `Result<UdpTransport>` - Ready-to-send transport
    ///
    /// # Errors
    ///
    /// Returns error if the target address is invalid or the socket cannot
    /// be created
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gdl90_bridge::config::NetworkConfig;
    /// use gdl90_bridge::transport::UdpTransport;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let transport = UdpTransport::open(&NetworkConfig::default()).await?;
    ///     println!("Sending to {}", transport.target());
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(config: &NetworkConfig) -> Result<Self> {
        let target = resolve_target(&config.target_ip, config.target_port)?;

        let bind_addr = if target.is_ipv4() { BIND_ADDR_V4 } else { BIND_ADDR_V6 };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| Gdl90BridgeError::Transport(format!("Failed to bind socket: {}", e)))?;

        if config.broadcast {
            socket.set_broadcast(true).map_err(|e| {
                Gdl90BridgeError::Transport(format!("Failed to enable broadcast: {}", e))
            })?;
        }

        info!(
            "UDP transport ready, sending to {} (broadcast {})",
            target,
            if config.broadcast { "on" } else { "off" }
        );

        Ok(Self { socket, target })
    }

    /// Address every datagram is sent to
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl DatagramSink for UdpTransport {
    async fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let sent = self.socket.send_to(data, self.target).await?;
        debug!("Sent {} bytes to {}", sent, self.target);
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl90::encoder::create_heartbeat_at;
    use tokio_test::{assert_err, assert_ok};

    fn loopback_config(port: u16) -> NetworkConfig {
        NetworkConfig {
            target_ip: "127.0.0.1".to_string(),
            target_port: port,
            broadcast: false,
        }
    }

    #[test]
    fn test_default_port() {
        assert_eq!(GDL90_DEFAULT_PORT, 4000);
        assert_eq!(NetworkConfig::default().target_port, GDL90_DEFAULT_PORT);
    }

    #[test]
    fn test_resolve_ipv4_target() {
        let addr = resolve_target("192.168.1.100", 4000).unwrap();
        assert_eq!(addr.to_string(), "192.168.1.100:4000");
    }

    #[test]
    fn test_resolve_ipv6_target() {
        let addr = resolve_target("::1", 4000).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 4000);
    }

    #[test]
    fn test_resolve_trims_whitespace() {
        assert_ok!(resolve_target(" 10.0.0.5 ", 4000));
    }

    #[test]
    fn test_resolve_invalid_target() {
        for bad in ["", "not-an-ip", "256.1.1.1", "192.168.1"] {
            match resolve_target(bad, 4000) {
                Err(Gdl90BridgeError::InvalidTarget(msg)) => assert_eq!(msg, bad),
                other => panic!("Expected InvalidTarget for {:?}, got: {:?}", bad, other),
            }
        }
    }

    #[tokio::test]
    async fn test_open_invalid_target_fails() {
        let config = NetworkConfig {
            target_ip: "efb.local".to_string(),
            ..NetworkConfig::default()
        };

        let err = assert_err!(UdpTransport::open(&config).await);
        assert!(matches!(err, Gdl90BridgeError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_open_with_broadcast() {
        let config = NetworkConfig {
            target_ip: "255.255.255.255".to_string(),
            target_port: GDL90_DEFAULT_PORT,
            broadcast: true,
        };

        let transport = assert_ok!(UdpTransport::open(&config).await);
        assert!(assert_ok!(transport.socket.broadcast()));
        assert_eq!(transport.target().port(), GDL90_DEFAULT_PORT);
    }

    #[tokio::test]
    async fn test_sink_sends_one_datagram_per_frame() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut transport = UdpTransport::open(&loopback_config(port)).await.unwrap();
        let first = create_heartbeat_at(false, true, 1);
        let second = create_heartbeat_at(true, true, 2);

        assert_eq!(transport.send(&first).await.unwrap(), first.len());
        assert_eq!(transport.send(&second).await.unwrap(), second.len());

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], first.as_slice());
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], second.as_slice());
    }
}
