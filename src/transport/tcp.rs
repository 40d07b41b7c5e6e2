//! TCP transport implementation for client connections.
//!
//! This module contains the [`TcpTransport`] type, which is a [`tower::Service`] that connects to
//! a single remote address using TCP. It also contains the [`TcpTransportConfig`] type, which is
//! used to configure the connection attempt, and [`SocketOptions`], applied to the socket before
//! connecting.
//!
//! Normally, you will not need to use this module directly. Instead, use
//! [`HttpConnector::connect`][crate::HttpConnector::connect].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use socket2::{Domain, Protocol, Socket, TcpKeepalive, Type};
use tokio::net::{TcpSocket, TcpStream};
use tracing::{trace, warn, Instrument};

use crate::error::ConnectError;

/// Options applied to the socket before it connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    /// Whether to disable Nagle's algorithm.
    pub nodelay: bool,

    /// Whether to reuse the local address.
    pub reuse_address: bool,

    /// Idle time before TCP keep-alive probes are sent.
    pub keep_alive_timeout: Option<Duration>,

    /// The size of the send buffer.
    pub send_buffer_size: Option<usize>,

    /// The size of the receive buffer.
    pub recv_buffer_size: Option<usize>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            reuse_address: true,
            keep_alive_timeout: Some(Duration::from_secs(90)),
            send_buffer_size: None,
            recv_buffer_size: None,
        }
    }
}

/// Configuration for a TCP connection attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TcpTransportConfig {
    /// The total time allowed for the connection attempt.
    ///
    /// `None` waits as long as the operating system does.
    pub connect_timeout: Option<Duration>,

    /// The local address to bind to before connecting.
    pub bind_address: Option<SocketAddr>,

    /// Options applied to the socket.
    pub socket: SocketOptions,
}

impl TcpTransportConfig {
    /// Set the total time allowed for the connection attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bind to `addr` before connecting.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }
}

/// A TCP connector for client connections.
///
/// This type is a [`tower::Service`] that connects to a remote [`SocketAddr`] and
/// returns the connected [`TcpStream`].
///
/// # Example
/// ```no_run
/// # use ignition::transport::tcp::TcpTransport;
/// # use tower::ServiceExt as _;
///
/// # async fn run() {
/// let transport = TcpTransport::default();
///
/// let addr = "127.0.0.1:8080".parse().unwrap();
/// let stream = transport.oneshot(addr).await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    config: Arc<TcpTransportConfig>,
}

impl TcpTransport {
    /// Create a new TCP transport with the given configuration.
    pub fn new(config: TcpTransportConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get the configuration for the TCP transport.
    pub fn config(&self) -> &TcpTransportConfig {
        &self.config
    }
}

impl tower::Service<SocketAddr> for TcpTransport {
    type Response = TcpStream;
    type Error = ConnectError;
    type Future = BoxFuture<'static, Result<TcpStream, ConnectError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, addr: SocketAddr) -> Self::Future {
        let config = self.config.clone();
        let span = tracing::trace_span!("tcp", remote.addr = %addr);

        Box::pin(
            async move {
                let stream = connect(addr, &config)?.await?;

                if config.socket.nodelay {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("tcp set_nodelay error: {}", e);
                    }
                }

                trace!("tcp connected");
                Ok(stream)
            }
            .instrument(span),
        )
    }
}

fn socket(addr: SocketAddr, config: &TcpTransportConfig) -> io::Result<TcpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    trace!("tcp socket opened");

    let guard = tracing::trace_span!("socket_options").entered();

    // When constructing a Tokio `TcpSocket` from a std socket, the user is
    // responsible for ensuring O_NONBLOCK is set.
    socket.set_nonblocking(true)?;

    if let Some(dur) = config.socket.keep_alive_timeout {
        let conf = TcpKeepalive::new().with_time(dur);
        if let Err(e) = socket.set_tcp_keepalive(&conf) {
            warn!("tcp set_keepalive error: {}", e);
        }
    }

    let socket = TcpSocket::from_std_stream(std::net::TcpStream::from(socket));

    if config.socket.reuse_address {
        if let Err(e) = socket.set_reuseaddr(true) {
            warn!("tcp set_reuse_address error: {}", e);
        }
    }

    if let Some(size) = config.socket.send_buffer_size {
        if let Err(e) = socket.set_send_buffer_size(size.try_into().unwrap_or(u32::MAX)) {
            warn!("tcp set_buffer_size error: {}", e);
        }
    }

    if let Some(size) = config.socket.recv_buffer_size {
        if let Err(e) = socket.set_recv_buffer_size(size.try_into().unwrap_or(u32::MAX)) {
            warn!("tcp set_recv_buffer_size error: {}", e);
        }
    }

    if let Some(local) = config.bind_address {
        socket.bind(local)?;
        trace!(local.addr = %local, "tcp socket bound");
    }

    drop(guard);
    Ok(socket)
}

#[tracing::instrument(skip(config), level = "debug")]
fn connect(
    addr: SocketAddr,
    config: &TcpTransportConfig,
) -> Result<impl std::future::Future<Output = Result<TcpStream, ConnectError>>, ConnectError> {
    let socket = socket(addr, config).map_err(ConnectError::socket(addr))?;
    let connect_timeout = config.connect_timeout;

    let connect = socket.connect(addr);
    Ok(async move {
        match connect_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, connect).await {
                Ok(result) => result.map_err(ConnectError::connect(addr)),
                Err(_) => {
                    trace!(?timeout, "connection timed out");
                    Err(ConnectError::Timeout { addr, timeout })
                }
            },
            None => connect.await.map_err(ConnectError::connect(addr)),
        }
    })
}
