//! Ignition
//!
//! Turn "I want to talk HTTP to this address" into a live, protocol-aware session.
//!
//! An [`HttpConnector`] drives a single TCP or TLS connection attempt on a tokio
//! [`LocalSet`][tokio::task::LocalSet], chooses a [`Codec`] from the protocol negotiated via
//! ALPN (or configured for plaintext connections), and delivers a [`Session`] to a
//! [`ConnectCallback`]. Failures are delivered to the same callback, exactly once per attempt.
//!
//! The crate does not send requests, retry, pool connections or balance load: each attempt
//! makes one connection and reports one outcome.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod codec;
pub mod connector;
pub mod error;
pub mod info;
pub mod session;
pub mod stream;
pub mod transport;

pub use self::codec::Codec;
pub use self::connector::{ConnectCallback, ConnectorConfig, HttpConnector, TlsOptions};
pub use self::error::{ConnectError, ConnectorBusy};
pub use self::info::TransportInfo;
pub use self::session::Session;
pub use self::stream::Stream;
