//! Utilities for bridging to the [tokio] runtime.

/// Event loops which connection attempts run on
pub mod rt;
