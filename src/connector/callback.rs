//! Result sinks for connection attempts.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::error::ConnectError;
use crate::session::Session;

/// Receives the outcome of a connection attempt.
///
/// Exactly one of the two methods is called per attempt, unless the attempt is cancelled
/// with [`HttpConnector::reset`][crate::HttpConnector::reset], in which case neither is.
/// Both are called from the event loop the attempt was started on, and never while the
/// connector is borrowed internally, so they may call back into the connector.
pub trait ConnectCallback {
    /// The connection succeeded and `session` is ready for use.
    fn connect_success(&self, session: Session);

    /// The connection failed.
    fn connect_error(&self, error: ConnectError);
}

impl ConnectCallback for mpsc::UnboundedSender<Result<Session, ConnectError>> {
    fn connect_success(&self, session: Session) {
        if self.send(Ok(session)).is_err() {
            tracing::debug!("connect receiver dropped, discarding session");
        }
    }

    fn connect_error(&self, error: ConnectError) {
        if self.send(Err(error)).is_err() {
            tracing::debug!("connect receiver dropped, discarding error");
        }
    }
}

/// A callback which can be detached while the connector tears down an attempt.
///
/// Dropping an in-flight transport reports an error through the normal error path. While
/// detached, [`GuardedCallback::get`] returns `None`, so that report never reaches the caller.
pub(crate) struct GuardedCallback<C: ?Sized> {
    target: Rc<C>,
    attached: Cell<bool>,
}

impl<C: ?Sized> GuardedCallback<C> {
    pub(crate) fn new(target: Rc<C>) -> Self {
        Self {
            target,
            attached: Cell::new(true),
        }
    }

    /// The callback, unless it is currently detached.
    pub(crate) fn get(&self) -> Option<Rc<C>> {
        self.attached.get().then(|| self.target.clone())
    }

    /// Detach the callback until the returned guard is dropped.
    pub(crate) fn detach(&self) -> Detached<'_, C> {
        let previous = self.attached.replace(false);
        Detached {
            callback: self,
            previous,
        }
    }
}

impl<C: ?Sized> fmt::Debug for GuardedCallback<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedCallback")
            .field("attached", &self.attached.get())
            .finish()
    }
}

/// Restores the callback's previous attachment when dropped.
pub(crate) struct Detached<'c, C: ?Sized> {
    callback: &'c GuardedCallback<C>,
    previous: bool,
}

impl<C: ?Sized> Drop for Detached<'_, C> {
    fn drop(&mut self) {
        self.callback.attached.set(self.previous);
    }
}

impl<C: ?Sized> fmt::Debug for Detached<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detached")
            .field("previous", &self.previous)
            .finish()
    }
}
