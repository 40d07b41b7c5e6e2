//! The connected transport handed to a session.
//!
//! A [`Stream`] is either a plain TCP stream or a TCP stream wrapped in a completed
//! client TLS session. It implements [`AsyncRead`] and [`AsyncWrite`] by dispatching to
//! whichever is inside, and exposes the details a connector reads once the connection is up.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;
use rustls::ClientConnection;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

use crate::info::tls::{alpn_protocol, TlsInfo};
use crate::info::ConnectionInfo;

#[derive(Debug)]
#[pin_project(project = StreamCoreProjection)]
enum StreamCore {
    /// A TCP stream
    Tcp(#[pin] TcpStream),

    /// A TLS stream over TCP
    Tls(#[pin] Box<TlsStream<TcpStream>>),
}

/// A connected transport stream.
#[derive(Debug)]
#[pin_project]
pub struct Stream {
    #[pin]
    inner: StreamCore,
    server_name: Option<String>,
}

macro_rules! dispatch_core {
    (pin $driver:ident.$method:ident($($args:expr),*)) => {
        match $driver.project().inner.project() {
            StreamCoreProjection::Tcp(stream) => stream.$method($($args),*),
            StreamCoreProjection::Tls(stream) => stream.$method($($args),*),
        }
    };

    ($driver:ident.$method:ident($($args:expr),*)) => {
        match &$driver.inner {
            StreamCore::Tcp(stream) => stream.$method($($args),*),
            StreamCore::Tls(stream) => stream.$method($($args),*),
        }
    };
}

impl Stream {
    /// Wrap a TLS session established with `server_name`.
    pub fn tls(stream: TlsStream<TcpStream>, server_name: impl Into<String>) -> Self {
        Self {
            inner: StreamCore::Tls(Box::new(stream)),
            server_name: Some(server_name.into()),
        }
    }

    /// Whether the stream is protected by TLS.
    pub fn is_secure(&self) -> bool {
        matches!(self.inner, StreamCore::Tls(_))
    }

    /// The underlying TCP stream.
    pub fn tcp(&self) -> &TcpStream {
        match &self.inner {
            StreamCore::Tcp(stream) => stream,
            StreamCore::Tls(stream) => stream.get_ref().0,
        }
    }

    /// The local address of the connection.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().local_addr()
    }

    /// The remote address of the connection.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().peer_addr()
    }

    /// Local and remote addresses together.
    pub fn info(&self) -> io::Result<ConnectionInfo> {
        Ok(ConnectionInfo {
            local_addr: self.local_addr()?,
            remote_addr: self.peer_addr()?,
        })
    }

    /// The rustls client session, for TLS streams.
    pub fn tls_connection(&self) -> Option<&ClientConnection> {
        match &self.inner {
            StreamCore::Tcp(_) => None,
            StreamCore::Tls(stream) => Some(stream.get_ref().1),
        }
    }

    /// The application protocol negotiated via ALPN, if any.
    pub fn application_protocol(&self) -> Option<String> {
        self.tls_connection().and_then(alpn_protocol)
    }

    /// Details of the TLS handshake, for TLS streams.
    pub fn tls_info(&self) -> Option<TlsInfo> {
        self.tls_connection()
            .map(|connection| TlsInfo::client(connection, self.server_name.clone()))
    }
}

impl From<TcpStream> for Stream {
    fn from(stream: TcpStream) -> Self {
        Self {
            inner: StreamCore::Tcp(stream),
            server_name: None,
        }
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        dispatch_core!(pin self.poll_read(cx, buf))
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        dispatch_core!(pin self.poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        dispatch_core!(pin self.poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        dispatch_core!(pin self.poll_shutdown(cx))
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        dispatch_core!(pin self.poll_write_vectored(cx, bufs))
    }

    fn is_write_vectored(&self) -> bool {
        dispatch_core!(self.is_write_vectored())
    }
}
