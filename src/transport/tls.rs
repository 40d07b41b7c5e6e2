//! TLS transport wrapping a TCP transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use rustls::client::{ClientSessionStore, Resumption};
use rustls::pki_types::ServerName;
use rustls::ClientConfig as TlsClientConfig;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{trace, warn, Instrument};

use crate::error::ConnectError;
use crate::stream::Stream;

/// A shared store of TLS sessions which later connections may resume.
pub type SessionStore = Arc<dyn ClientSessionStore>;

/// Build the default TLS configuration for connecting to servers.
///
/// Trusts the platform's root certificates and offers `h2` and `http/1.1` via ALPN.
pub fn default_tls_config() -> TlsClientConfig {
    let mut roots = rustls::RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!(%error, "could not load platform certificate");
    }

    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    trace!(added, ignored, "loaded platform certificates");

    let mut cfg = TlsClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    cfg.alpn_protocols.push(b"h2".to_vec());
    cfg.alpn_protocols.push(b"http/1.1".to_vec());
    cfg
}

/// Transport via TLS
///
/// Connects with the wrapped transport, then drives the client handshake to
/// completion before returning the [`Stream`].
#[derive(Debug, Clone)]
pub struct TlsTransport<T> {
    transport: T,
    config: Arc<TlsClientConfig>,
    server_name: String,
    timeout: Option<Duration>,
}

impl<T> TlsTransport<T> {
    /// Create a new `TlsTransport` which presents `server_name` via SNI and
    /// validates the server certificate against it.
    pub fn new(transport: T, config: Arc<TlsClientConfig>, server_name: impl Into<String>) -> Self {
        Self {
            transport,
            config,
            server_name: server_name.into(),
            timeout: None,
        }
    }

    /// Limit the total time for connecting and handshaking.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Offer sessions from `store` for resumption, and save new sessions to it.
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        let mut config = TlsClientConfig::clone(&self.config);
        config.resumption = Resumption::store(store);
        self.config = Arc::new(config);
        self
    }

    /// Returns a reference to the inner transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a reference to the TLS configuration.
    pub fn config(&self) -> &Arc<TlsClientConfig> {
        &self.config
    }

    /// The server name used for SNI.
    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

impl<T> tower::Service<SocketAddr> for TlsTransport<T>
where
    T: tower::Service<SocketAddr, Response = TcpStream, Error = ConnectError>,
    T::Future: Send + 'static,
{
    type Response = Stream;
    type Error = ConnectError;
    type Future = BoxFuture<'static, Result<Stream, ConnectError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, addr: SocketAddr) -> Self::Future {
        let server_name = self.server_name.clone();
        let Ok(domain) = ServerName::try_from(server_name.clone()) else {
            return Box::pin(std::future::ready(Err(ConnectError::InvalidServerName {
                addr,
                name: server_name,
            })));
        };

        let deadline = self.timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let config = self.config.clone();
        let connect = self.transport.call(addr);
        let span = tracing::trace_span!("tls", server.name = %server_name);

        Box::pin(
            async move {
                let tcp = connect.await?;
                let handshake = tokio_rustls::TlsConnector::from(config).connect(domain, tcp);

                let stream = match deadline {
                    Some((deadline, timeout)) => tokio::time::timeout_at(deadline, handshake)
                        .await
                        .map_err(|_| ConnectError::Timeout { addr, timeout })?,
                    None => handshake.await,
                }
                .map_err(ConnectError::handshake(addr))?;

                trace!("tls handshake complete");
                Ok(Stream::tls(stream, server_name))
            }
            .instrument(span),
        )
    }
}
