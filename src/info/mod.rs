//! Connection Information

use std::net::SocketAddr;
use std::time::{Duration, Instant};

pub mod tls;

pub use self::tls::{ResumeState, TlsInfo};

/// The local and remote addresses of a connected transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionInfo {
    /// The local address of the connection.
    pub local_addr: SocketAddr,

    /// The remote address of the connection.
    pub remote_addr: SocketAddr,
}

impl ConnectionInfo {
    /// The local address of the connection.
    pub fn local_addr(&self) -> &SocketAddr {
        &self.local_addr
    }

    /// The remote address of the connection.
    pub fn remote_addr(&self) -> &SocketAddr {
        &self.remote_addr
    }
}

/// What was negotiated while establishing a transport.
///
/// A fresh record is started for each connection attempt, filled in when the
/// attempt succeeds, and then moved into the [`Session`][crate::Session].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportInfo {
    /// Whether the transport is protected by TLS.
    pub secure: bool,

    /// The application protocol negotiated during the TLS handshake.
    pub app_protocol: Option<String>,

    /// TLS session details, for secure transports.
    pub tls: Option<TlsInfo>,

    /// Time from the start of the attempt until the TLS handshake finished.
    pub ssl_setup_time: Option<Duration>,

    /// When the connection attempt completed.
    pub accept_time: Option<Instant>,
}

impl TransportInfo {
    /// A blank record for a plaintext or secure attempt.
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            ..Default::default()
        }
    }

    /// Returns `true` if the TLS session was resumed rather than fully negotiated.
    pub fn is_resumed(&self) -> bool {
        self.tls
            .as_ref()
            .is_some_and(|tls| tls.resume == ResumeState::Resumed)
    }
}
