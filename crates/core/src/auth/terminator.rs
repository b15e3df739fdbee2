//! Session termination and the forced-logout signal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tollgate_domain::constants::SESSION_SIGNAL_CAPACITY;
use tracing::{debug, info, warn};

use super::token_store::TokenStore;

/// Payload-less signal emitted once when the session can no longer be
/// recovered. Subscribers typically route the user back to sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnded;

/// Clears credentials and broadcasts [`SessionEnded`].
///
/// Termination is idempotent per session: after the first call, further
/// calls do nothing until [`SessionTerminator::rearm`] marks a new session
/// as established.
#[derive(Debug)]
pub struct SessionTerminator {
    store: Arc<TokenStore>,
    signal: broadcast::Sender<SessionEnded>,
    ended: AtomicBool,
}

impl SessionTerminator {
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        let (signal, _) = broadcast::channel(SESSION_SIGNAL_CAPACITY);
        Self { store, signal, ended: AtomicBool::new(false) }
    }

    /// Independent receiver for the forced-logout signal.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEnded> {
        self.signal.subscribe()
    }

    /// End the session: clear the token store, then emit the signal.
    ///
    /// # Returns
    /// `true` if this call ended the session, `false` if it had already
    /// ended
    pub async fn terminate(&self) -> bool {
        if self.ended.swap(true, Ordering::AcqRel) {
            debug!("Session already terminated");
            return false;
        }

        if let Err(e) = self.store.clear().await {
            // In-memory credentials are gone regardless of this error.
            warn!(error = %e, "Failed to clear durable credentials during termination");
        }

        let receivers = self.signal.send(SessionEnded).unwrap_or(0);
        info!(receivers, "Session terminated");
        true
    }

    /// Mark a new session as established so the next failure terminates
    /// again.
    pub fn rearm(&self) {
        self.ended.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}
