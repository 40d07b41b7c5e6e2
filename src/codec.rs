//! Codec selection for a freshly connected transport.
//!
//! The application protocol negotiated over TLS (ALPN), or configured out of band for a
//! plaintext connection, names the wire protocol the session should speak. Negotiation is
//! advisory: a name which cannot be mapped falls back to HTTP/1.x rather than failing an
//! otherwise healthy connection.

use std::fmt;

use tracing::warn;

/// ALPN token for HTTP/2 over TLS.
pub const H2: &str = "h2";

/// Token for HTTP/2 over cleartext TCP.
pub const H2_CLEARTEXT: &str = "h2c";

/// ALPN token used by draft 14 HTTP/2 implementations.
pub const H2_DRAFT: &str = "h2-14";

/// Experimental HTTP/2 ALPN token.
pub const H2_EXPERIMENTAL: &str = "h2-fb";

const HTTP2_PROTOCOLS: [&str; 4] = [H2, H2_CLEARTEXT, H2_DRAFT, H2_EXPERIMENTAL];

const HTTP1_PROTOCOLS: [&str; 2] = ["http/1.0", "http/1.1"];

/// Which side of the connection a codec speaks for.
///
/// Connectors only ever build client codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Direction {
    /// The client side: sends requests, receives responses.
    Upstream,
}

/// SPDY protocol versions which can be negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpdyVersion {
    /// `spdy/3`
    Spdy3,

    /// `spdy/3.1`
    Spdy3_1,
}

impl SpdyVersion {
    /// Parse a negotiated protocol token into a SPDY version.
    pub fn from_protocol(protocol: &str) -> Option<Self> {
        match protocol {
            "spdy/3" => Some(SpdyVersion::Spdy3),
            "spdy/3.1" => Some(SpdyVersion::Spdy3_1),
            _ => None,
        }
    }

    /// The protocol token for this version.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpdyVersion::Spdy3 => "spdy/3",
            SpdyVersion::Spdy3_1 => "spdy/3.1",
        }
    }
}

impl fmt::Display for SpdyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP/1.0 and HTTP/1.1 codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Http1Codec {
    direction: Direction,
    force_http11: bool,
}

impl Http1Codec {
    /// Create an HTTP/1.x codec.
    ///
    /// When `force_http11` is set, every message is sent as HTTP/1.1.
    pub fn new(direction: Direction, force_http11: bool) -> Self {
        Self {
            direction,
            force_http11,
        }
    }

    /// The side of the connection this codec speaks for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the version sent on the wire is pinned to HTTP/1.1.
    pub fn forces_http11(&self) -> bool {
        self.force_http11
    }

    /// The version this codec puts on the wire for a message of the `requested` version.
    pub fn advertised_version(&self, requested: http::Version) -> http::Version {
        if self.force_http11 {
            return http::Version::HTTP_11;
        }

        match requested {
            http::Version::HTTP_10 => http::Version::HTTP_10,
            _ => http::Version::HTTP_11,
        }
    }

    /// Whether `protocol` names a protocol this codec can speak.
    pub fn supports_protocol(protocol: &str) -> bool {
        HTTP1_PROTOCOLS.contains(&protocol)
    }
}

/// SPDY codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpdyCodec {
    direction: Direction,
    version: SpdyVersion,
}

impl SpdyCodec {
    /// Create a SPDY codec for a specific version.
    pub fn new(direction: Direction, version: SpdyVersion) -> Self {
        Self { direction, version }
    }

    /// The side of the connection this codec speaks for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The SPDY version spoken.
    pub fn version(&self) -> SpdyVersion {
        self.version
    }
}

/// HTTP/2 codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Http2Codec {
    direction: Direction,
}

impl Http2Codec {
    /// Create an HTTP/2 codec.
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    /// The side of the connection this codec speaks for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether `protocol` is one of the recognized HTTP/2 identifiers.
    pub fn supports_protocol(protocol: &str) -> bool {
        HTTP2_PROTOCOLS.contains(&protocol)
    }
}

/// The wire protocol codec selected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// HTTP/1.0 or HTTP/1.1
    Http1(Http1Codec),

    /// SPDY
    Spdy(SpdyCodec),

    /// HTTP/2
    Http2(Http2Codec),
}

impl Codec {
    /// Select the client codec for a negotiated (or hinted) protocol name.
    ///
    /// SPDY tokens take precedence, then the HTTP/2 identifiers. Anything else,
    /// including the empty string, selects HTTP/1.x. A non-empty name which is not an
    /// HTTP/1.x token is logged and still falls back to HTTP/1.x.
    pub fn resolve(protocol: &str, force_http11: bool) -> Self {
        if let Some(version) = SpdyVersion::from_protocol(protocol) {
            return Codec::Spdy(SpdyCodec::new(Direction::Upstream, version));
        }

        if Http2Codec::supports_protocol(protocol) {
            return Codec::Http2(Http2Codec::new(Direction::Upstream));
        }

        if !protocol.is_empty() && !Http1Codec::supports_protocol(protocol) {
            warn!(
                protocol,
                "chosen upstream protocol is unimplemented, falling back to HTTP/1.1"
            );
        }

        Codec::Http1(Http1Codec::new(Direction::Upstream, force_http11))
    }

    /// The side of the connection this codec speaks for.
    pub fn direction(&self) -> Direction {
        match self {
            Codec::Http1(codec) => codec.direction(),
            Codec::Spdy(codec) => codec.direction(),
            Codec::Http2(codec) => codec.direction(),
        }
    }

    /// The HTTP version family this codec carries.
    ///
    /// SPDY carries HTTP/1.1 semantics.
    pub fn version(&self) -> http::Version {
        match self {
            Codec::Http1(codec) => codec.advertised_version(http::Version::HTTP_11),
            Codec::Spdy(_) => http::Version::HTTP_11,
            Codec::Http2(_) => http::Version::HTTP_2,
        }
    }

    /// Returns `true` if this is an HTTP/1.x codec.
    pub fn is_http1(&self) -> bool {
        matches!(self, Codec::Http1(_))
    }

    /// Returns `true` if this is an HTTP/2 codec.
    pub fn is_http2(&self) -> bool {
        matches!(self, Codec::Http2(_))
    }

    /// The SPDY version, if this is a SPDY codec.
    pub fn spdy_version(&self) -> Option<SpdyVersion> {
        match self {
            Codec::Spdy(codec) => Some(codec.version()),
            _ => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Http1(_) => f.write_str("HTTP/1.x"),
            Codec::Spdy(codec) => write!(f, "SPDY ({})", codec.version()),
            Codec::Http2(_) => f.write_str("HTTP/2"),
        }
    }
}
