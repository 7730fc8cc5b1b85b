// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight token refresh.
//!
//! The first request to see an expired access token becomes the refresher;
//! every request that fails while that refresh is outstanding parks a
//! one-shot handle in a FIFO queue instead of starting its own refresh.
//! When the refresh settles, the queue is drained in order with either the
//! new token or the shared failure. If the refresher is dropped before it
//! settles, the refresher role passes to the head of the queue and everyone
//! else stays queued.
//!
//! The phase check and the enqueue happen in one critical section under a
//! mutex that is never held across an `.await`, so the single-flight
//! guarantee holds on a multi-threaded runtime too.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::auth::TokenGrant;
use crate::credential::{CredentialStore, Token};
use crate::error::RefreshFailure;
use crate::session::SessionInvalidator;

/// Whether a refresh is currently outstanding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Refreshing,
}

/// What a parked request is woken with.
#[derive(Debug)]
enum Wake {
    /// The refresh finished; use its outcome.
    Settled(Result<Token, RefreshFailure>),
    /// The refresher went away; this request now runs the refresh.
    TakeOver,
}

/// Completion handle for a request parked behind the in-flight refresh.
type PendingRefresh = oneshot::Sender<Wake>;

#[derive(Default)]
struct RefreshState {
    phase: RefreshPhase,
    /// Non-empty only while `phase == Refreshing`.
    waiters: VecDeque<PendingRefresh>,
}

/// What a caller does after entering the coordinator.
enum Role {
    /// Runs the refresh and settles the queue.
    Refresher,
    /// Waits for the refresher's outcome.
    Waiter(oneshot::Receiver<Wake>),
    /// A refresh already landed after this caller's request went out.
    Current(Token),
}

/// Owns the refresh state machine for one client session.
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    store: Arc<CredentialStore>,
    invalidator: SessionInvalidator,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<CredentialStore>, invalidator: SessionInvalidator) -> Self {
        Self { state: Mutex::new(RefreshState::default()), store, invalidator }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.state.lock().phase
    }

    /// Number of requests parked behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Obtain a fresh access token, refreshing at most once across all callers.
    ///
    /// `failed_token` is the access token the caller's request was rejected
    /// with. `refresh` performs the actual network call and is only invoked
    /// if this caller becomes the refresher.
    pub async fn refresh_or_wait<F, Fut>(
        &self,
        failed_token: Option<&str>,
        refresh: F,
    ) -> Result<Token, RefreshFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenGrant, RefreshFailure>>,
    {
        loop {
            match self.enter(failed_token) {
                Role::Current(token) => return Ok(token),
                Role::Refresher => break,
                Role::Waiter(rx) => {
                    let mut parked = Parked { coordinator: self, rx };
                    match (&mut parked.rx).await {
                        Ok(Wake::Settled(outcome)) => return outcome,
                        Ok(Wake::TakeOver) => {
                            debug!("previous refresher dropped, taking over the refresh");
                            break;
                        }
                        // Every queued sender is answered before it is dropped,
                        // so this only happens if the queue was lost; queue again.
                        Err(_) => continue,
                    }
                }
            }
        }

        let mut guard = HandOffGuard { coordinator: self, armed: true };
        let outcome = refresh().await;
        guard.armed = false;
        self.settle(outcome)
    }

    fn enter(&self, failed_token: Option<&str>) -> Role {
        let mut state = self.state.lock();
        match state.phase {
            RefreshPhase::Idle => {
                if let Some(current) = self.store.access_token() {
                    if failed_token != Some(current.as_str()) {
                        debug!("access token changed since request was sent, retrying without refresh");
                        return Role::Current(current);
                    }
                }
                state.phase = RefreshPhase::Refreshing;
                debug!("starting token refresh");
                Role::Refresher
            }
            RefreshPhase::Refreshing => {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                debug!(queued = state.waiters.len(), "refresh in flight, queueing request");
                Role::Waiter(rx)
            }
        }
    }

    fn settle(&self, outcome: Result<TokenGrant, RefreshFailure>) -> Result<Token, RefreshFailure> {
        match outcome {
            Ok(grant) => {
                let token = grant.access_token;
                self.store.set_tokens(token.clone(), grant.refresh_token);
                let waiters = self.finish();
                info!(replayed = waiters.len(), "access token refreshed");
                for waiter in waiters {
                    // A dropped receiver means that caller went away; skip it.
                    let _ = waiter.send(Wake::Settled(Ok(token.clone())));
                }
                Ok(token)
            }
            Err(failure) => {
                warn!(code = failure.as_str(), error = %failure, "token refresh failed");
                self.invalidator.invalidate();
                let waiters = self.finish();
                if !waiters.is_empty() {
                    debug!(rejected = waiters.len(), "rejecting queued requests");
                }
                for waiter in waiters {
                    let _ = waiter.send(Wake::Settled(Err(failure.clone())));
                }
                Err(failure)
            }
        }
    }

    /// Return to `Idle` and hand back the queue, in one critical section.
    fn finish(&self) -> VecDeque<PendingRefresh> {
        let mut state = self.state.lock();
        state.phase = RefreshPhase::Idle;
        std::mem::take(&mut state.waiters)
    }

    /// Pass the refresher role to the first queued request still listening.
    ///
    /// The phase stays `Refreshing` throughout, so no newcomer can start a
    /// second refresh in between. With nobody left to take over, go `Idle`.
    fn hand_off(&self) {
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.send(Wake::TakeOver).is_ok() {
                debug!(queued = state.waiters.len(), "handing refresh to next queued request");
                return;
            }
        }
        state.phase = RefreshPhase::Idle;
        debug!("refresher dropped with nobody queued");
    }
}

/// Hands the refresh on if the refresher's future is dropped mid-refresh.
///
/// Nothing failed, so the session is left alone and no queued request is
/// rejected.
struct HandOffGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl Drop for HandOffGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("token refresh dropped before completion");
            self.coordinator.hand_off();
        }
    }
}

/// A queued request's receiver.
///
/// If the request is dropped after being chosen to take over but before it
/// saw the message, the role moves on to the next in line.
struct Parked<'a> {
    coordinator: &'a RefreshCoordinator,
    rx: oneshot::Receiver<Wake>,
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(Wake::TakeOver) = self.rx.try_recv() {
            self.coordinator.hand_off();
        }
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
