//! Mock implementations of the pipeline ports

#![allow(clippy::missing_errors_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tollgate_domain::{
    InboundResponse, OutboundRequest, RefreshFailure, Result, TokenPair, TollgateError,
};

use crate::auth::RequestAuthenticator;
use crate::ports::{HttpTransport, KeyValueStore, TokenRefresher};

/* -------------------------------------------------------------------------- */
/* Key-value store */
/* -------------------------------------------------------------------------- */

/// In-memory [`KeyValueStore`] with write counting and failure injection.
///
/// # Examples
///
/// ```
/// use tollgate_core::testing::MockKeyValueStore;
///
/// let store = MockKeyValueStore::new();
/// store.insert("k", "v");
/// assert_eq!(store.keys(), vec!["k".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MockKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MockKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value without counting it as a write.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    /// Stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Successful `set` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make `set` and `delete` fail with `TollgateError::Storage`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TollgateError::Storage("mock store is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

/* -------------------------------------------------------------------------- */
/* Transport */
/* -------------------------------------------------------------------------- */

type Handler = dyn Fn(&OutboundRequest) -> Result<InboundResponse> + Send + Sync;

/// [`HttpTransport`] answering from a closure and recording every attempt.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&OutboundRequest) -> Result<InboundResponse> + Send + Sync + 'static,
    ) -> Self {
        Self { handler: Box::new(handler), requests: Mutex::new(Vec::new()) }
    }

    /// 200 with `{"ok":true}` for requests bearing `token`, 401 otherwise.
    #[must_use]
    pub fn accepting(token: &str) -> Self {
        let token = token.to_string();
        Self::new(move |request| {
            if RequestAuthenticator::bearer_token(request) == Some(token.as_str()) {
                Ok(InboundResponse::new(200).with_body(r#"{"ok":true}"#))
            } else {
                Ok(InboundResponse::new(401))
            }
        })
    }

    /// Same status for every request.
    #[must_use]
    pub fn always(status: u16) -> Self {
        Self::new(move |_| Ok(InboundResponse::new(status)))
    }

    /// Every attempt sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Authorization header of every attempt, in order.
    #[must_use]
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.requests.lock().iter().map(|r| r.authorization().map(str::to_string)).collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<InboundResponse> {
        self.requests.lock().push(request.clone());
        // Suspension point, as a real network call would have.
        tokio::task::yield_now().await;
        (self.handler)(request)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport").field("requests", &self.request_count()).finish_non_exhaustive()
    }
}

/* -------------------------------------------------------------------------- */
/* Refresher */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
enum Script {
    Respond(std::result::Result<TokenPair, RefreshFailure>),
    Panic,
}

/// Scripted [`TokenRefresher`].
///
/// A gated refresher holds every call until [`MockRefresher::release`], which
/// lets tests pile waiters onto an in-flight cycle deterministically.
#[derive(Debug)]
pub struct MockRefresher {
    script: Mutex<Script>,
    gate: watch::Sender<bool>,
    calls: AtomicUsize,
    seen_tokens: Mutex<Vec<Option<String>>>,
    cookie_mode: bool,
}

impl MockRefresher {
    fn scripted(script: Script) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            script: Mutex::new(script),
            gate,
            calls: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
            cookie_mode: false,
        }
    }

    #[must_use]
    pub fn succeeding(pair: TokenPair) -> Self {
        Self::scripted(Script::Respond(Ok(pair)))
    }

    #[must_use]
    pub fn failing(failure: RefreshFailure) -> Self {
        Self::scripted(Script::Respond(Err(failure)))
    }

    /// Panics inside the refresh call.
    #[must_use]
    pub fn panicking() -> Self {
        Self::scripted(Script::Panic)
    }

    /// Hold calls until [`MockRefresher::release`].
    #[must_use]
    pub fn gated(self) -> Self {
        self.gate.send_replace(false);
        self
    }

    /// Credential travels out of band; no stored token required.
    #[must_use]
    pub fn cookie_mode(mut self) -> Self {
        self.cookie_mode = true;
        self
    }

    /// Let held and future calls proceed.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Change what subsequent calls return.
    pub fn respond_with(&self, outcome: std::result::Result<TokenPair, RefreshFailure>) {
        *self.script.lock() = Script::Respond(outcome);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh token passed to each call, in order.
    #[must_use]
    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen_tokens.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for MockRefresher {
    async fn refresh(
        &self,
        refresh_token: Option<&str>,
    ) -> std::result::Result<TokenPair, RefreshFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().push(refresh_token.map(str::to_string));

        let mut open = self.gate.subscribe();
        if open.wait_for(|open| *open).await.is_err() {
            return Err(RefreshFailure::Interrupted);
        }

        let script = self.script.lock().clone();
        match script {
            Script::Respond(outcome) => outcome,
            #[allow(clippy::panic)]
            Script::Panic => panic!("scripted refresh panic"),
        }
    }

    fn requires_stored_token(&self) -> bool {
        !self.cookie_mode
    }
}
