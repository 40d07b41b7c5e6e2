//! Errors reported while establishing a connection.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Error delivered to a [`ConnectCallback`][crate::ConnectCallback] when a
/// connection attempt fails.
///
/// Transport failures are passed through as they occurred; the connector does not
/// retry or reclassify them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectError {
    /// The local socket could not be opened, configured or bound.
    #[error("socket setup for {addr}: {source}")]
    Socket {
        /// The address the attempt was made to.
        addr: SocketAddr,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The TCP connection was refused, reset, or otherwise failed.
    #[error("tcp connect to {addr}: {source}")]
    Connect {
        /// The address the attempt was made to.
        addr: SocketAddr,

        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The attempt did not complete before its deadline.
    #[error("connect to {addr} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// The address the attempt was made to.
        addr: SocketAddr,

        /// The total time allowed for the attempt.
        timeout: Duration,
    },

    /// The server name for TLS could not be used for SNI or certificate validation.
    #[error("invalid tls server name {name:?} for {addr}")]
    InvalidServerName {
        /// The address the attempt was made to.
        addr: SocketAddr,

        /// The rejected server name.
        name: String,
    },

    /// The TLS handshake failed after the TCP connection was established.
    #[error("tls handshake with {addr}: {source}")]
    Handshake {
        /// The address the attempt was made to.
        addr: SocketAddr,

        /// The underlying handshake error.
        #[source]
        source: io::Error,
    },

    /// The attempt was torn down before it completed.
    #[error("connection attempt cancelled")]
    Cancelled,
}

impl ConnectError {
    /// The address of the peer this attempt was made to, if known.
    ///
    /// This remains available after the transport has been discarded.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self {
            ConnectError::Socket { addr, .. }
            | ConnectError::Connect { addr, .. }
            | ConnectError::Timeout { addr, .. }
            | ConnectError::InvalidServerName { addr, .. }
            | ConnectError::Handshake { addr, .. } => Some(*addr),
            ConnectError::Cancelled => None,
        }
    }

    /// The I/O error kind that best describes this failure.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            ConnectError::Socket { source, .. }
            | ConnectError::Connect { source, .. }
            | ConnectError::Handshake { source, .. } => source.kind(),
            ConnectError::Timeout { .. } => io::ErrorKind::TimedOut,
            ConnectError::InvalidServerName { .. } => io::ErrorKind::InvalidInput,
            ConnectError::Cancelled => io::ErrorKind::Interrupted,
        }
    }

    pub(crate) fn socket(addr: SocketAddr) -> impl FnOnce(io::Error) -> Self {
        move |source| ConnectError::Socket { addr, source }
    }

    pub(crate) fn connect(addr: SocketAddr) -> impl FnOnce(io::Error) -> Self {
        move |source| ConnectError::Connect { addr, source }
    }

    pub(crate) fn handshake(addr: SocketAddr) -> impl FnOnce(io::Error) -> Self {
        move |source| ConnectError::Handshake { addr, source }
    }
}

/// Returned when a connect is started while another attempt is still in flight.
///
/// The in-flight attempt is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("connector already has a connection attempt in flight")]
pub struct ConnectorBusy;
