//! The session produced by a successful connection.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::codec::Codec;
use crate::info::{ConnectionInfo, TransportInfo};
use crate::stream::Stream;

/// A live, protocol-aware connection.
///
/// Owns the connected transport, the codec selected for it, and the metadata recorded while
/// connecting. The connector keeps no reference to a session once it has been handed out.
#[derive(Debug)]
#[pin_project]
pub struct Session {
    #[pin]
    stream: Stream,
    info: ConnectionInfo,
    codec: Codec,
    transport: TransportInfo,
    extensions: http::Extensions,
}

/// The components of a [`Session`].
#[derive(Debug)]
#[non_exhaustive]
pub struct Parts {
    /// The connected transport.
    pub stream: Stream,

    /// Local and remote addresses.
    pub info: ConnectionInfo,

    /// The codec selected for the connection.
    pub codec: Codec,

    /// What was negotiated while connecting.
    pub transport: TransportInfo,

    /// Extension slot for data attached by the caller.
    pub extensions: http::Extensions,
}

impl Session {
    /// Assemble a session from a connected stream.
    pub fn new(
        stream: Stream,
        info: ConnectionInfo,
        codec: Codec,
        transport: TransportInfo,
    ) -> Self {
        Self {
            stream,
            info,
            codec,
            transport,
            extensions: http::Extensions::new(),
        }
    }

    /// The codec selected for this session.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// What was negotiated while connecting.
    pub fn transport_info(&self) -> &TransportInfo {
        &self.transport
    }

    /// Local and remote addresses.
    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// The local address of the connection.
    pub fn local_addr(&self) -> SocketAddr {
        self.info.local_addr
    }

    /// The remote address of the connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.info.remote_addr
    }

    /// Whether the session runs over TLS.
    pub fn is_secure(&self) -> bool {
        self.transport.secure
    }

    /// The connected transport.
    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Mutable access to the connected transport.
    pub fn stream_mut(&mut self) -> &mut Stream {
        &mut self.stream
    }

    /// Data attached to this session.
    pub fn extensions(&self) -> &http::Extensions {
        &self.extensions
    }

    /// Mutable access to data attached to this session.
    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        &mut self.extensions
    }

    /// Take the session apart.
    pub fn into_parts(self) -> Parts {
        Parts {
            stream: self.stream,
            info: self.info,
            codec: self.codec,
            transport: self.transport,
            extensions: self.extensions,
        }
    }
}

impl AsyncRead for Session {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.project().stream.poll_read(cx, buf)
    }
}

impl AsyncWrite for Session {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.project().stream.poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().stream.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().stream.poll_shutdown(cx)
    }
}
