//! Session termination and the forced-logout signal.

mod support;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::broadcast::error::TryRecvError;
use tollgate_core::testing::{wait_until, MockRefresher, MockTransport};
use tollgate_core::SessionEnded;
use tollgate_domain::{RefreshFailure, TokenPair, TollgateError};

use support::signed_in;

/// Validates the missing-refresh-token scenario.
///
/// Assertions:
/// - The refresh fails immediately without a network call
/// - The store is cleared in memory and in the backend
/// - The forced-logout signal is emitted exactly once
#[tokio::test]
async fn missing_refresh_token_terminates_without_network_call() {
    let fx = signed_in(
        TokenPair::new("A1", ""),
        MockRefresher::succeeding(TokenPair::new("A2", "R2")),
        MockTransport::accepting("A2"),
    )
    .await;
    let mut shell = fx.client.subscribe();

    let result = fx.client.get_json::<Value>("/orders").await;

    assert_eq!(result, Err(TollgateError::RefreshFailed(RefreshFailure::NoRefreshToken)));
    assert_eq!(fx.refresher.calls(), 0);
    assert_eq!(fx.transport.request_count(), 1);
    assert!(!fx.client.is_authenticated());
    assert!(fx.backend.keys().is_empty());
    assert_eq!(shell.try_recv(), Ok(SessionEnded));
    assert_eq!(shell.try_recv(), Err(TryRecvError::Empty));
}

/// Many waiters rejected by one failed cycle produce one signal, seen by
/// every subscriber.
#[tokio::test]
async fn failed_cycle_emits_one_signal_to_every_subscriber() {
    let fx = signed_in(
        TokenPair::new("A1", "R1"),
        MockRefresher::failing(RefreshFailure::Rejected { status: 400 }).gated(),
        MockTransport::accepting("A2"),
    )
    .await;
    let mut shell = fx.client.subscribe();
    let mut audit = fx.client.subscribe();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let client = fx.client.clone();
            tokio::spawn(async move { client.get_json::<Value>(&format!("/r/{i}")).await })
        })
        .collect();
    wait_until(|| fx.client.coordinator().pending_waiters() == 5).await;
    fx.refresher.release();

    for outcome in join_all(handles).await {
        assert!(outcome.unwrap().unwrap_err().is_session_ending());
    }

    for receiver in [&mut shell, &mut audit] {
        assert_eq!(receiver.try_recv(), Ok(SessionEnded));
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
    }
    assert!(fx.backend.keys().is_empty());
}

/// Requests issued after termination go out anonymously and do not signal
/// again.
#[tokio::test]
async fn requests_after_termination_do_not_signal_again() {
    let fx = signed_in(
        TokenPair::new("A1", ""),
        MockRefresher::succeeding(TokenPair::new("A2", "R2")),
        MockTransport::always(401),
    )
    .await;
    let mut shell = fx.client.subscribe();

    assert!(fx.client.get_json::<Value>("/a").await.is_err());
    let second = fx.client.get_json::<Value>("/b").await;

    assert_eq!(second, Err(TollgateError::RefreshFailed(RefreshFailure::NoRefreshToken)));
    assert_eq!(fx.transport.authorizations()[1], None);
    assert_eq!(shell.try_recv(), Ok(SessionEnded));
    assert_eq!(shell.try_recv(), Err(TryRecvError::Empty));
}

/// Voluntary sign-out clears credentials and emits the same signal.
#[tokio::test]
async fn sign_out_clears_and_signals_once() {
    let fx = signed_in(
        TokenPair::new("A1", "R1"),
        MockRefresher::succeeding(TokenPair::new("A2", "R2")),
        MockTransport::accepting("A1"),
    )
    .await;
    let mut shell = fx.client.subscribe();

    assert!(fx.client.sign_out().await);
    assert!(!fx.client.sign_out().await);

    assert!(!fx.client.is_authenticated());
    assert!(fx.backend.keys().is_empty());
    assert_eq!(shell.try_recv(), Ok(SessionEnded));
    assert_eq!(shell.try_recv(), Err(TryRecvError::Empty));
}
