//! Single-flight credential renewal
//!
//! Owns the `Idle` / `Refreshing` state and the queue of callers waiting on
//! the in-flight renewal:
//! - The first caller of a burst moves the state to `Refreshing` and starts
//!   exactly one refresh call on a detached task
//! - Callers arriving while `Refreshing` join the queue without any network
//!   call
//! - Settlement resolves or rejects the whole queue and returns to `Idle`
//!   inside one critical section, so no new cycle starts while waiters of
//!   the previous one are unresolved
//!
//! The state lives behind a `parking_lot::Mutex` that is never held across
//! an `.await`; tokio may poll tasks on several threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tollgate_domain::{RefreshFailure, TokenPair};
use tracing::{debug, info, info_span, warn, Instrument};

use super::terminator::SessionTerminator;
use super::token_store::TokenStore;
use crate::ports::TokenRefresher;

/// New access token on success, the shared failure otherwise.
type Outcome = Result<String, RefreshFailure>;

/// Whether a renewal is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

struct Waiter {
    id: u64,
    tx: oneshot::Sender<Outcome>,
}

struct Flight {
    state: RefreshState,
    waiters: Vec<Waiter>,
    next_waiter_id: u64,
    cycle: u64,
}

impl Flight {
    fn enqueue(&mut self) -> (u64, oneshot::Receiver<Outcome>) {
        let id = self.next_waiter_id;
        self.next_waiter_id += 1;
        let (tx, rx) = oneshot::channel();
        self.waiters.push(Waiter { id, tx });
        (id, rx)
    }

    /// Deliver `outcome` to every queued waiter and return to `Idle`.
    fn settle(&mut self, outcome: &Outcome) -> usize {
        let waiters = std::mem::take(&mut self.waiters);
        self.state = RefreshState::Idle;

        let released = waiters.len();
        for waiter in waiters {
            // A closed receiver belongs to a caller that is withdrawing.
            let _ = waiter.tx.send(outcome.clone());
        }
        released
    }
}

struct Shared {
    flight: Mutex<Flight>,
    store: Arc<TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    terminator: Arc<SessionTerminator>,
    refresh_calls: AtomicU64,
}

/// A caller's place in the waiter queue. Dropping it before the refresh
/// settles removes exactly that entry.
struct Ticket {
    id: u64,
    rx: oneshot::Receiver<Outcome>,
    shared: Arc<Shared>,
    settled: bool,
}

impl Ticket {
    async fn wait(mut self) -> Outcome {
        let outcome = (&mut self.rx).await.unwrap_or(Err(RefreshFailure::Interrupted));
        self.settled = true;
        outcome
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut flight = self.shared.flight.lock();
        let before = flight.waiters.len();
        flight.waiters.retain(|waiter| waiter.id != self.id);
        if flight.waiters.len() < before {
            debug!(waiter = self.id, remaining = flight.waiters.len(), "Waiter withdrew");
        }
    }
}

enum Admission {
    /// Started a new cycle; must spawn the refresh call.
    Leader { ticket: Ticket, refresh_token: Option<String>, cycle: u64 },
    /// Joined the cycle already in flight.
    Joined(Ticket),
    /// The rejected token was already replaced by an earlier cycle.
    AlreadyRenewed(String),
    /// Nothing to refresh with.
    NoCredential,
}

/// Settles the cycle even if the refresh task unwinds or is dropped by a
/// shutting-down runtime.
struct SettleGuard {
    shared: Arc<Shared>,
    cycle: u64,
    settled: bool,
}

impl SettleGuard {
    fn settle(mut self, outcome: &Outcome) {
        let released = self.shared.flight.lock().settle(outcome);
        self.settled = true;
        debug!(cycle = self.cycle, released, success = outcome.is_ok(), "Refresh cycle settled");
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let released = self.shared.flight.lock().settle(&Err(RefreshFailure::Interrupted));
        warn!(cycle = self.cycle, released, "Refresh task ended without settling");

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let terminator = self.shared.terminator.clone();
            handle.spawn(async move {
                terminator.terminate().await;
            });
        }
    }
}

/// Single-flight refresh state machine.
///
/// Cheap to clone; clones share one state and one waiter queue. Build one
/// per client and inject it.
#[derive(Clone)]
pub struct RefreshCoordinator {
    shared: Arc<Shared>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        terminator: Arc<SessionTerminator>,
    ) -> Self {
        let flight = Flight {
            state: RefreshState::Idle,
            waiters: Vec::new(),
            next_waiter_id: 0,
            cycle: 0,
        };
        Self {
            shared: Arc::new(Shared {
                flight: Mutex::new(flight),
                store,
                refresher,
                terminator,
                refresh_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Renew the access credential, sharing any renewal already in flight.
    ///
    /// # Returns
    /// The new access token
    ///
    /// # Errors
    /// Returns the cycle's [`RefreshFailure`]; the session has been
    /// terminated by the time it is observed. Fails with
    /// `RefreshFailure::NoRefreshToken` without a network call when no
    /// refresh credential is stored.
    pub async fn request_refresh(&self) -> Result<String, RefreshFailure> {
        self.acquire(None).await
    }

    /// Like [`RefreshCoordinator::request_refresh`], for a request that was
    /// rejected while carrying `rejected_token`.
    ///
    /// If an earlier cycle has already replaced that token, the current
    /// token is returned without starting a new cycle. This covers 401s that
    /// arrive just after a renewal settled.
    ///
    /// # Errors
    /// Same as [`RefreshCoordinator::request_refresh`]
    pub async fn renew_after_rejection(
        &self,
        rejected_token: &str,
    ) -> Result<String, RefreshFailure> {
        self.acquire(Some(rejected_token)).await
    }

    #[must_use]
    pub fn state(&self) -> RefreshState {
        self.shared.flight.lock().state
    }

    /// Callers currently parked on the in-flight renewal.
    #[must_use]
    pub fn pending_waiters(&self) -> usize {
        self.shared.flight.lock().waiters.len()
    }

    /// Refresh calls issued since construction.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        self.shared.refresh_calls.load(Ordering::Acquire)
    }

    async fn acquire(&self, rejected_token: Option<&str>) -> Outcome {
        match self.admit(rejected_token) {
            Admission::Leader { ticket, refresh_token, cycle } => {
                debug!(cycle, "Starting refresh cycle");
                let shared = self.shared.clone();
                tokio::spawn(
                    run_cycle(shared, refresh_token, cycle)
                        .instrument(info_span!("token_refresh", cycle)),
                );
                ticket.wait().await
            }
            Admission::Joined(ticket) => {
                debug!(waiter = ticket.id, "Joined in-flight refresh");
                ticket.wait().await
            }
            Admission::AlreadyRenewed(token) => {
                debug!("Rejected token already replaced; skipping refresh");
                Ok(token)
            }
            Admission::NoCredential => {
                warn!("Refresh requested without a refresh token; ending session");
                self.shared.terminator.terminate().await;
                Err(RefreshFailure::NoRefreshToken)
            }
        }
    }

    /// Check-and-set of the refresh state. Runs entirely under the lock.
    fn admit(&self, rejected_token: Option<&str>) -> Admission {
        let mut flight = self.shared.flight.lock();

        if flight.state == RefreshState::Refreshing {
            let (id, rx) = flight.enqueue();
            return Admission::Joined(self.ticket(id, rx));
        }

        let current = self.shared.store.snapshot();
        if let (Some(rejected), Some(access)) =
            (rejected_token, current.as_ref().and_then(TokenPair::access))
        {
            if access != rejected {
                return Admission::AlreadyRenewed(access.to_string());
            }
        }

        let refresh_token = current.as_ref().and_then(TokenPair::refresh).map(str::to_string);
        if refresh_token.is_none() && self.shared.refresher.requires_stored_token() {
            return Admission::NoCredential;
        }

        flight.state = RefreshState::Refreshing;
        flight.cycle += 1;
        let cycle = flight.cycle;
        let (id, rx) = flight.enqueue();
        Admission::Leader { ticket: self.ticket(id, rx), refresh_token, cycle }
    }

    fn ticket(&self, id: u64, rx: oneshot::Receiver<Outcome>) -> Ticket {
        Ticket { id, rx, shared: self.shared.clone(), settled: false }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flight = self.shared.flight.lock();
        f.debug_struct("RefreshCoordinator")
            .field("state", &flight.state)
            .field("waiters", &flight.waiters.len())
            .field("cycle", &flight.cycle)
            .finish_non_exhaustive()
    }
}

async fn run_cycle(shared: Arc<Shared>, refresh_token: Option<String>, cycle: u64) {
    let guard = SettleGuard { shared: shared.clone(), cycle, settled: false };
    shared.refresh_calls.fetch_add(1, Ordering::AcqRel);

    let outcome = renew(&shared, refresh_token.as_deref()).await;
    match &outcome {
        Ok(_) => info!("Access token refreshed"),
        Err(failure) => {
            warn!(error = %failure, "Token refresh failed; ending session");
            shared.terminator.terminate().await;
        }
    }

    guard.settle(&outcome);
}

async fn renew(shared: &Shared, refresh_token: Option<&str>) -> Outcome {
    let pair = shared.refresher.refresh(refresh_token).await?.or_refresh_from(refresh_token);
    let access = pair
        .access()
        .map(str::to_string)
        .ok_or_else(|| RefreshFailure::InvalidResponse("empty access token".to_string()))?;

    shared.store.set_tokens(pair).await.map_err(|e| RefreshFailure::Storage(e.to_string()))?;
    Ok(access)
}
