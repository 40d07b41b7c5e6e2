//! Transports for connecting to remote servers.
//!
//! Transports are responsible for establishing a connection to a remote server. Each is a
//! [`tower::Service`] which accepts a [`SocketAddr`][std::net::SocketAddr] and resolves once
//! the connection is ready to carry bytes:
//!
//! - [`TcpTransport`]: plain TCP, with socket options, an optional bind address and a
//!     connect timeout.
//! - [`TlsTransport`]: TLS over another transport, with SNI, ALPN and session resumption
//!     driven by the [`rustls::ClientConfig`].

pub mod tcp;
pub mod tls;

pub use self::tcp::{SocketOptions, TcpTransport, TcpTransportConfig};
pub use self::tls::{default_tls_config, SessionStore, TlsTransport};
