//! Information about a TLS connection.
//!
//! Everything here is read from the rustls session once the handshake has finished; before
//! that, most fields are empty.

use rustls::{ClientConnection, HandshakeKind};

/// How the TLS session was established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResumeState {
    /// A full handshake was performed.
    Full,

    /// A previous session was resumed.
    Resumed,

    /// The handshake has not recorded how it completed.
    #[default]
    Unknown,
}

impl From<Option<HandshakeKind>> for ResumeState {
    fn from(kind: Option<HandshakeKind>) -> Self {
        match kind {
            Some(HandshakeKind::Resumed) => ResumeState::Resumed,
            Some(_) => ResumeState::Full,
            None => ResumeState::Unknown,
        }
    }
}

/// Details of a completed client TLS handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsInfo {
    /// The server name sent via SNI.
    pub server_name: Option<String>,

    /// The negotiated cipher suite.
    pub cipher: Option<String>,

    /// The negotiated protocol version.
    pub version: Option<String>,

    /// Whether the session was resumed.
    pub resume: ResumeState,
}

impl TlsInfo {
    pub(crate) fn client(connection: &ClientConnection, server_name: Option<String>) -> Self {
        let cipher = connection
            .negotiated_cipher_suite()
            .map(|suite| format!("{:?}", suite.suite()));

        let version = connection
            .protocol_version()
            .map(|version| format!("{version:?}"));

        Self {
            server_name,
            cipher,
            version,
            resume: connection.handshake_kind().into(),
        }
    }
}

/// The ALPN protocol negotiated on `connection`, if any.
///
/// Tokens which are not UTF-8 are kept, with invalid bytes replaced.
pub(crate) fn alpn_protocol(connection: &ClientConnection) -> Option<String> {
    connection
        .alpn_protocol()
        .map(|alpn| String::from_utf8_lossy(alpn).into_owned())
}
