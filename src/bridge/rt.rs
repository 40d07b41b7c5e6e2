//! Executor glue for single-threaded connection attempts.

use std::future::Future;

use tokio::task::{JoinHandle, LocalSet};

/// The single-threaded event loop a connection attempt is driven on.
///
/// Connection attempts are `!Send`: the connector and the attempt share
/// state through `Rc`, so they must stay on one thread.
pub trait EventLoop {
    /// Spawn a future onto this event loop.
    fn spawn_local<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static;
}

impl EventLoop for LocalSet {
    fn spawn_local<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        LocalSet::spawn_local(self, future)
    }
}

/// The [`LocalSet`] the caller is currently running inside.
///
/// # Panics
///
/// Spawning panics when called outside of a [`LocalSet`] context.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentThread;

impl CurrentThread {
    /// Refer to the enclosing local set.
    pub fn new() -> Self {
        Self
    }
}

impl EventLoop for CurrentThread {
    fn spawn_local<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        tokio::task::spawn_local(future)
    }
}
