//! The HTTP connector: one connection attempt at a time, reported through a callback.
//!
//! An [`HttpConnector`] starts a TCP or TLS connection on an [`EventLoop`], waits for the
//! transport to report, picks a [`Codec`] from the negotiated protocol, and hands the caller a
//! [`Session`] through its [`ConnectCallback`].
//!
//! ```text
//! Idle --connect--> Connecting --success--> (session delivered) --> Idle
//!                       |
//!                       +--------error----> (error delivered)   --> Idle
//!                       |
//!                       +--------reset----> (nothing delivered) --> Idle
//! ```
//!
//! # Example
//! ```no_run
//! use std::rc::Rc;
//!
//! use ignition::bridge::rt::CurrentThread;
//! use ignition::transport::TcpTransportConfig;
//! use ignition::{ConnectError, HttpConnector, Session};
//! use tokio::sync::mpsc;
//!
//! # async fn run() {
//! let (tx, mut rx) = mpsc::unbounded_channel::<Result<Session, ConnectError>>();
//! let mut connector = HttpConnector::new(Rc::new(tx));
//!
//! let local = tokio::task::LocalSet::new();
//! local
//!     .run_until(async {
//!         let addr = "127.0.0.1:8080".parse().unwrap();
//!         connector
//!             .connect(&CurrentThread, addr, &TcpTransportConfig::default())
//!             .unwrap();
//!
//!         let session = rx.recv().await.unwrap().unwrap();
//!         println!("connected with {}", session.codec());
//!     })
//!     .await;
//! # }
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::TryFutureExt as _;
use tokio::task::JoinHandle;
use tower::ServiceExt as _;
use tracing::{debug, trace, warn, Instrument};

use crate::bridge::rt::EventLoop;
use crate::codec::Codec;
use crate::error::{ConnectError, ConnectorBusy};
use crate::info::TransportInfo;
use crate::session::Session;
use crate::stream::Stream;
use crate::transport::tcp::{TcpTransport, TcpTransportConfig};
use crate::transport::tls::{SessionStore, TlsTransport};

mod callback;

pub use self::callback::ConnectCallback;
use self::callback::GuardedCallback;

/// Settings which apply to every attempt made by a connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// The protocol to assume for plaintext connections, where nothing is negotiated.
    ///
    /// `None` selects HTTP/1.x.
    pub plaintext_protocol: Option<String>,

    /// Always send HTTP/1.1 when the HTTP/1.x codec is selected.
    pub force_http11: bool,
}

/// TLS parameters for [`HttpConnector::connect_secure`].
#[derive(Debug, Clone)]
pub struct TlsOptions {
    /// The TLS configuration, including the ALPN protocols to offer.
    pub config: Arc<rustls::ClientConfig>,

    /// Previously established sessions to resume from.
    pub session_store: Option<SessionStore>,

    /// The name sent via SNI and checked against the server certificate.
    pub server_name: String,
}

impl TlsOptions {
    /// TLS parameters for connecting to `server_name`.
    pub fn new(config: Arc<rustls::ClientConfig>, server_name: impl Into<String>) -> Self {
        Self {
            config,
            session_store: None,
            server_name: server_name.into(),
        }
    }

    /// Resume sessions from, and save sessions to, `store`.
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }
}

/// Ownership of an in-flight transport.
///
/// Dropping it before the attempt completes aborts the attempt and reports
/// [`ConnectError::Cancelled`] through the connector's error path.
struct PendingConnect {
    task: JoinHandle<()>,
    abandon: Option<Box<dyn FnOnce()>>,
}

impl PendingConnect {
    fn new(task: JoinHandle<()>, abandon: impl FnOnce() + 'static) -> Self {
        Self {
            task,
            abandon: Some(Box::new(abandon)),
        }
    }

    /// The attempt reported on its own; nothing to tear down.
    fn finish(mut self) {
        self.abandon = None;
    }
}

impl Drop for PendingConnect {
    fn drop(&mut self) {
        if let Some(abandon) = self.abandon.take() {
            self.task.abort();
            abandon();
        }
    }
}

impl fmt::Debug for PendingConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingConnect")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

#[derive(Debug, Default)]
struct State {
    pending: Option<PendingConnect>,
    target: Option<SocketAddr>,
    transport: TransportInfo,
    connect_start: Option<Instant>,
    config: ConnectorConfig,
}

impl State {
    /// Assemble the session for a connected stream, consuming this attempt's metadata.
    fn session(&mut self, stream: Stream) -> Result<Session, ConnectError> {
        let info = match stream.info() {
            Ok(info) => info,
            Err(error) => {
                let addr = self.target.unwrap_or_else(|| ([0, 0, 0, 0], 0).into());
                return Err(ConnectError::socket(addr)(error));
            }
        };

        let mut transport = std::mem::take(&mut self.transport);
        let now = Instant::now();
        transport.accept_time = Some(now);

        let protocol = if transport.secure {
            transport.app_protocol = stream.application_protocol();
            transport.tls = stream.tls_info();
            transport.ssl_setup_time = self
                .connect_start
                .map(|start| now.saturating_duration_since(start));
            transport.app_protocol.clone().unwrap_or_default()
        } else {
            self.config.plaintext_protocol.clone().unwrap_or_default()
        };

        let codec = Codec::resolve(&protocol, self.config.force_http11);
        debug!(peer.addr = %info.remote_addr, %codec, secure = transport.secure, "connected");

        Ok(Session::new(stream, info, codec, transport))
    }
}

struct Shared<C: ?Sized> {
    state: RefCell<State>,
    callback: GuardedCallback<C>,
}

impl<C> Shared<C>
where
    C: ConnectCallback + ?Sized,
{
    fn connect_success(&self, stream: Stream) {
        let session = {
            let mut state = self.state.borrow_mut();
            if let Some(pending) = state.pending.take() {
                pending.finish();
            }

            if self.callback.get().is_none() {
                trace!("connect succeeded with callback detached");
                return;
            }

            state.session(stream)
        };

        let Some(callback) = self.callback.get() else {
            return;
        };

        match session {
            Ok(session) => callback.connect_success(session),
            Err(error) => callback.connect_error(error),
        }
    }

    fn connect_error(&self, error: ConnectError) {
        let pending = self.state.borrow_mut().pending.take();
        if let Some(pending) = pending {
            pending.finish();
        }

        match self.callback.get() {
            Some(callback) => {
                debug!(%error, "connect failed");
                callback.connect_error(error);
            }
            None => trace!(%error, "connect error suppressed"),
        }
    }
}

/// Establishes HTTP connections, one attempt at a time.
///
/// The connector is bound to a single-threaded event loop; see [`EventLoop`]. It may be
/// reused for any number of sequential attempts, but only one may be in flight. Dropping
/// the connector cancels the in-flight attempt without notifying the callback.
pub struct HttpConnector<C: ConnectCallback + ?Sized + 'static> {
    shared: Rc<Shared<C>>,
}

impl<C> HttpConnector<C>
where
    C: ConnectCallback + ?Sized + 'static,
{
    /// Create a connector which reports to `callback`.
    pub fn new(callback: Rc<C>) -> Self {
        Self::with_config(callback, ConnectorConfig::default())
    }

    /// Create a connector with explicit settings.
    pub fn with_config(callback: Rc<C>, config: ConnectorConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State {
                    config,
                    ..Default::default()
                }),
                callback: GuardedCallback::new(callback),
            }),
        }
    }

    /// The current settings.
    pub fn config(&self) -> ConnectorConfig {
        self.shared.state.borrow().config.clone()
    }

    /// Assume `protocol` for plaintext connections.
    ///
    /// Takes effect for connections which complete after this call.
    pub fn set_plaintext_protocol(&mut self, protocol: impl Into<String>) {
        self.shared.state.borrow_mut().config.plaintext_protocol = Some(protocol.into());
    }

    /// Always send HTTP/1.1 when the HTTP/1.x codec is selected.
    pub fn set_http_version_override(&mut self, enabled: bool) {
        self.shared.state.borrow_mut().config.force_http11 = enabled;
    }

    /// Start a plaintext TCP connection to `addr`.
    ///
    /// Returns immediately; the outcome is delivered to the callback from `event_loop`.
    /// `options` carries the timeout, socket options and bind address.
    pub fn connect<E>(
        &mut self,
        event_loop: &E,
        addr: SocketAddr,
        options: &TcpTransportConfig,
    ) -> Result<(), ConnectorBusy>
    where
        E: EventLoop + ?Sized,
    {
        let transport = TcpTransport::new(options.clone());
        let connecting = transport.oneshot(addr).map_ok(Stream::from);
        self.start(event_loop, addr, false, connecting)
    }

    /// Start a TLS connection to `addr`.
    ///
    /// The timeout in `options` covers both the TCP connect and the TLS handshake.
    /// When `tls` carries a session store, a stored session for the server name is offered
    /// for resumption.
    pub fn connect_secure<E>(
        &mut self,
        event_loop: &E,
        addr: SocketAddr,
        tls: &TlsOptions,
        options: &TcpTransportConfig,
    ) -> Result<(), ConnectorBusy>
    where
        E: EventLoop + ?Sized,
    {
        let mut transport = TlsTransport::new(
            TcpTransport::new(options.clone()),
            tls.config.clone(),
            tls.server_name.clone(),
        )
        .with_timeout(options.connect_timeout);

        if let Some(store) = &tls.session_store {
            transport = transport.with_session_store(store.clone());
        }

        self.start(event_loop, addr, true, transport.oneshot(addr))
    }

    fn start<E, F>(
        &mut self,
        event_loop: &E,
        addr: SocketAddr,
        secure: bool,
        connecting: F,
    ) -> Result<(), ConnectorBusy>
    where
        E: EventLoop + ?Sized,
        F: Future<Output = Result<Stream, ConnectError>> + 'static,
    {
        let mut state = self.shared.state.borrow_mut();
        if state.pending.is_some() {
            warn!(%addr, "connect called while another attempt is in flight");
            return Err(ConnectorBusy);
        }

        state.transport = TransportInfo::new(secure);
        state.target = Some(addr);
        state.connect_start = Some(Instant::now());

        let span = tracing::debug_span!("connect", %addr, secure);
        let shared = Rc::downgrade(&self.shared);
        let task = event_loop.spawn_local(
            async move {
                let result = connecting.await;
                let Some(shared) = shared.upgrade() else {
                    return;
                };

                match result {
                    Ok(stream) => shared.connect_success(stream),
                    Err(error) => shared.connect_error(error),
                }
            }
            .instrument(span),
        );

        let shared: Weak<Shared<C>> = Rc::downgrade(&self.shared);
        state.pending = Some(PendingConnect::new(task, move || {
            if let Some(shared) = shared.upgrade() {
                shared.connect_error(ConnectError::Cancelled);
            }
        }));

        trace!(%addr, secure, "connect started");
        Ok(())
    }

    /// Cancel the in-flight attempt, if any, without notifying the callback.
    ///
    /// Afterwards the connector is idle and a new attempt may be started.
    pub fn reset(&mut self) {
        let pending = self.shared.state.borrow_mut().pending.take();
        if let Some(pending) = pending {
            let _detached = self.shared.callback.detach();
            drop(pending);
            trace!("connect attempt reset");
        }
    }

    /// Whether an attempt is in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.state.borrow().pending.is_some()
    }

    /// Time since the most recent attempt started, or zero if none has.
    pub fn elapsed(&self) -> Duration {
        self.shared
            .state
            .borrow()
            .connect_start
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }
}

impl<C> Drop for HttpConnector<C>
where
    C: ConnectCallback + ?Sized + 'static,
{
    fn drop(&mut self) {
        self.reset();
    }
}

impl<C> fmt::Debug for HttpConnector<C>
where
    C: ConnectCallback + ?Sized + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("HttpConnector")
            .field("busy", &state.pending.is_some())
            .field("target", &state.target)
            .field("config", &state.config)
            .field("callback", &self.shared.callback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio::task::LocalSet;

    use super::*;
    use crate::bridge::rt::CurrentThread;
    use crate::codec::SpdyVersion;

    type Outcome = Result<Session, ConnectError>;

    fn channel_connector() -> (
        HttpConnector<mpsc::UnboundedSender<Outcome>>,
        mpsc::UnboundedReceiver<Outcome>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (HttpConnector::new(Rc::new(tx)), rx)
    }

    /// Counts callback invocations.
    #[derive(Debug, Default)]
    struct Counter {
        successes: Cell<usize>,
        errors: Cell<usize>,
    }

    impl ConnectCallback for Counter {
        fn connect_success(&self, _session: Session) {
            self.successes.set(self.successes.get() + 1);
        }

        fn connect_error(&self, _error: ConnectError) {
            self.errors.set(self.errors.get() + 1);
        }
    }

    fn empty_roots() -> Arc<rustls::ClientConfig> {
        Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(rustls::RootCertStore::empty())
                .with_no_client_auth(),
        )
    }

    #[tokio::test]
    async fn plaintext_connect_delivers_http1_session() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (mut connector, mut rx) = channel_connector();

        LocalSet::new()
            .run_until(async {
                assert_eq!(connector.elapsed(), Duration::ZERO);
                assert!(!connector.is_busy());

                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();
                assert!(connector.is_busy());

                let (_server, _) = listener.accept().await.unwrap();
                let session = rx.recv().await.unwrap().unwrap();

                assert!(!connector.is_busy());
                assert!(session.codec().is_http1());
                assert!(!session.is_secure());
                assert_eq!(session.peer_addr(), addr);

                let info = session.transport_info();
                assert!(info.accept_time.is_some());
                assert_eq!(info.app_protocol, None);
                assert_eq!(info.ssl_setup_time, None);
                assert_eq!(info.tls, None);
            })
            .await;
    }

    #[tokio::test]
    async fn plaintext_protocol_hint_selects_codec() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (mut connector, mut rx) = channel_connector();

        LocalSet::new()
            .run_until(async {
                let cases: [(&str, fn(&Codec) -> bool); 3] = [
                    ("h2c", Codec::is_http2),
                    ("spdy/3", |codec| codec.spdy_version() == Some(SpdyVersion::Spdy3)),
                    ("totally-unknown", Codec::is_http1),
                ];

                for (hint, check) in cases {
                    connector.set_plaintext_protocol(hint);
                    connector
                        .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                        .unwrap();
                    let _server = listener.accept().await.unwrap();

                    let session = rx.recv().await.unwrap().unwrap();
                    assert!(check(session.codec()), "{hint}: {}", session.codec());
                }
            })
            .await;
    }

    #[tokio::test]
    async fn http_version_override_reaches_codec() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
        let mut connector = HttpConnector::with_config(
            Rc::new(tx),
            ConnectorConfig {
                plaintext_protocol: Some("http/1.0".into()),
                force_http11: false,
            },
        );
        connector.set_http_version_override(true);
        assert!(connector.config().force_http11);

        LocalSet::new()
            .run_until(async {
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();
                let _server = listener.accept().await.unwrap();

                let session = rx.recv().await.unwrap().unwrap();
                let Codec::Http1(codec) = session.codec() else {
                    panic!("expected HTTP/1.x, got {}", session.codec());
                };
                assert!(codec.forces_http11());
                assert_eq!(
                    codec.advertised_version(http::Version::HTTP_10),
                    http::Version::HTTP_11
                );
            })
            .await;
    }

    #[tokio::test]
    async fn refused_connection_reports_error() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (mut connector, mut rx) = channel_connector();

        LocalSet::new()
            .run_until(async {
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();

                let err = rx.recv().await.unwrap().unwrap_err();
                assert!(matches!(err, ConnectError::Connect { .. }), "{err:?}");
                assert_eq!(err.peer_addr(), Some(addr));
                assert!(!connector.is_busy());
            })
            .await;
    }

    #[tokio::test]
    async fn connect_while_busy_is_rejected() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (mut connector, mut rx) = channel_connector();

        LocalSet::new()
            .run_until(async {
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();

                assert_eq!(
                    connector.connect(&CurrentThread, addr, &TcpTransportConfig::default()),
                    Err(ConnectorBusy)
                );
                let tls = TlsOptions::new(empty_roots(), "localhost");
                assert_eq!(
                    connector.connect_secure(
                        &CurrentThread,
                        addr,
                        &tls,
                        &TcpTransportConfig::default()
                    ),
                    Err(ConnectorBusy)
                );

                // The first attempt is unaffected.
                let _server = listener.accept().await.unwrap();
                let session = rx.recv().await.unwrap().unwrap();
                assert!(!session.is_secure());
                assert!(rx.try_recv().is_err());
            })
            .await;
    }

    #[tokio::test]
    async fn reset_suppresses_callback() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let counter = Rc::new(Counter::default());
        let mut connector = HttpConnector::new(counter.clone());

        LocalSet::new()
            .run_until(async {
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();
                assert!(connector.is_busy());

                connector.reset();
                assert!(!connector.is_busy());

                tokio::time::sleep(Duration::from_millis(50)).await;
                assert_eq!(counter.successes.get(), 0);
                assert_eq!(counter.errors.get(), 0);

                // The connector is usable again, and the callback is reattached.
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();
                let _server = listener.accept().await.unwrap();
                while connector.is_busy() {
                    tokio::task::yield_now().await;
                }
                assert_eq!(counter.successes.get(), 1);
                assert_eq!(counter.errors.get(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn reset_during_tls_handshake() {
        let _ = tracing_subscriber::fmt::try_init();

        // Accepts the TCP connection but never answers the ClientHello.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let counter = Rc::new(Counter::default());
        let mut connector = HttpConnector::new(counter.clone());

        LocalSet::new()
            .run_until(async {
                let tls = TlsOptions::new(empty_roots(), "localhost");
                connector
                    .connect_secure(&CurrentThread, addr, &tls, &TcpTransportConfig::default())
                    .unwrap();

                let _server = listener.accept().await.unwrap();
                let first = connector.elapsed();
                tokio::time::sleep(Duration::from_millis(20)).await;
                let second = connector.elapsed();

                assert!(connector.is_busy());
                assert!(second >= first);
                assert!(second >= Duration::from_millis(20));

                connector.reset();
                assert!(!connector.is_busy());

                tokio::time::sleep(Duration::from_millis(20)).await;
                assert_eq!(counter.successes.get(), 0);
                assert_eq!(counter.errors.get(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn secure_connect_timeout_reaches_callback() {
        let _ = tracing_subscriber::fmt::try_init();

        // Accepts the TCP connection but never answers the ClientHello.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (mut connector, mut rx) = channel_connector();

        LocalSet::new()
            .run_until(async {
                let tls = TlsOptions::new(empty_roots(), "localhost");
                let timeout = Duration::from_millis(100);
                let options = TcpTransportConfig::default().with_timeout(timeout);
                connector
                    .connect_secure(&CurrentThread, addr, &tls, &options)
                    .unwrap();

                let _server = listener.accept().await.unwrap();
                let err = rx.recv().await.unwrap().unwrap_err();
                assert!(
                    matches!(err, ConnectError::Timeout { timeout: t, .. } if t == timeout),
                    "{err:?}"
                );
                assert_eq!(err.peer_addr(), Some(addr));
                assert!(!connector.is_busy());
            })
            .await;
    }

    #[tokio::test]
    async fn drop_cancels_without_callback() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let counter = Rc::new(Counter::default());

        LocalSet::new()
            .run_until(async {
                let mut connector = HttpConnector::new(counter.clone());
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();
                drop(connector);

                tokio::time::sleep(Duration::from_millis(50)).await;
                assert_eq!(counter.successes.get(), 0);
                assert_eq!(counter.errors.get(), 0);
            })
            .await;
    }

    /// Starts the next attempt from inside the callback.
    struct Redial {
        connector: RefCell<Option<HttpConnector<Redial>>>,
        addr: SocketAddr,
        sessions: Cell<usize>,
    }

    impl ConnectCallback for Redial {
        fn connect_success(&self, _session: Session) {
            self.sessions.set(self.sessions.get() + 1);
            if self.sessions.get() < 2 {
                let mut connector = self.connector.borrow_mut();
                let connector = connector.as_mut().unwrap();
                assert!(!connector.is_busy());
                connector
                    .connect(&CurrentThread, self.addr, &TcpTransportConfig::default())
                    .unwrap();
            }
        }

        fn connect_error(&self, error: ConnectError) {
            panic!("unexpected error: {error}");
        }
    }

    #[tokio::test]
    async fn callback_may_reenter_connector() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let redial = Rc::new(Redial {
            connector: RefCell::new(None),
            addr,
            sessions: Cell::new(0),
        });

        LocalSet::new()
            .run_until(async {
                let mut connector = HttpConnector::new(redial.clone());
                connector
                    .connect(&CurrentThread, addr, &TcpTransportConfig::default())
                    .unwrap();
                *redial.connector.borrow_mut() = Some(connector);

                let _first = listener.accept().await.unwrap();
                let _second = listener.accept().await.unwrap();
                while redial.sessions.get() < 2 {
                    tokio::task::yield_now().await;
                }
            })
            .await;

        // Break the reference cycle between the callback and its connector.
        redial.connector.borrow_mut().take();
    }
}
