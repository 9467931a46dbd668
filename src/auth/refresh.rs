//! Single-flight token refresh
//!
//! State machine:
//!
//! ```text
//!            first caller                 refresh ok: persist, resolve queue (FIFO)
//!   Idle ─────────────────→ Refreshing ─────────────────────────────────────→ Idle
//!                             │  ↑ later callers queue a resume handle
//!                             └──────────────────────────────────────────────→ Idle
//!                              refresh failed: clear session, reject queue,
//!                              one "session expired" notice, redirect to login
//! ```
//!
//! The flight flag is checked and set under a plain mutex with no `.await` in
//! between, so two callers can never both see Idle.

use super::{RefreshRequest, TokenRefresher};
use crate::http::ClientError;
use crate::notice::{NoticeBuffer, NoticeLevel};
use crate::session::{SessionContext, TokenSource};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

/// Hard navigation to the login entry point
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

type Waiter = oneshot::Sender<Result<String, ClientError>>;

#[derive(Default)]
struct Flight {
    in_progress: bool,
    waiters: VecDeque<Waiter>,
}

pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    session: Arc<SessionContext>,
    notices: NoticeBuffer,
    redirect: Arc<dyn LoginRedirect>,
    flight: Mutex<Flight>,
}

impl RefreshCoordinator {
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        session: Arc<SessionContext>,
        notices: NoticeBuffer,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            refresher,
            session,
            notices,
            redirect,
            flight: Mutex::new(Flight::default()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.flight).in_progress
    }

    /// Callers currently parked behind the in-flight refresh
    pub fn pending(&self) -> usize {
        lock(&self.flight).waiters.len()
    }

    /// Obtain a fresh access token.
    ///
    /// The first caller performs the network call; everyone arriving while it
    /// runs waits for its outcome instead of issuing their own.
    pub async fn refresh(&self) -> Result<String, ClientError> {
        let waiter = {
            let mut flight = lock(&self.flight);
            if flight.in_progress {
                let (tx, rx) = oneshot::channel();
                flight.waiters.push_back(tx);
                Some(rx)
            } else {
                flight.in_progress = true;
                None
            }
        };

        if let Some(rx) = waiter {
            tracing::debug!("Refresh already in flight, waiting for its token");
            return rx.await.unwrap_or(Err(ClientError::RefreshCancelled));
        }

        let guard = FlightGuard {
            flight: &self.flight,
            armed: true,
        };
        let request = RefreshRequest {
            token: self.session.token(),
            refresh_token: self.session.refresh_token(),
        };
        let outcome = self.refresher.refresh(request).await;
        let waiters = guard.land();

        match outcome {
            Ok(tokens) => {
                self.session.replace_tokens(&tokens);
                tracing::info!(queued = waiters.len(), "Access token refreshed");
                for waiter in waiters {
                    let _ = waiter.send(Ok(tokens.token.clone()));
                }
                Ok(tokens.token)
            }
            Err(err) => {
                tracing::warn!(error = %err, queued = waiters.len(), "Token refresh failed, ending session");
                self.session.clear();
                for waiter in waiters {
                    let _ = waiter.send(Err(ClientError::SessionExpired));
                }
                self.notices
                    .push(NoticeLevel::Warning, SESSION_EXPIRED_NOTICE);
                self.redirect.redirect_to_login();
                Err(ClientError::SessionExpired)
            }
        }
    }
}

fn lock(flight: &Mutex<Flight>) -> MutexGuard<'_, Flight> {
    flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Back to Idle, handing over whoever queued up meanwhile
fn land(flight: &Mutex<Flight>) -> VecDeque<Waiter> {
    let mut flight = lock(flight);
    flight.in_progress = false;
    std::mem::take(&mut flight.waiters)
}

/// Returns the coordinator to Idle if the refreshing future is dropped
struct FlightGuard<'a> {
    flight: &'a Mutex<Flight>,
    armed: bool,
}

impl FlightGuard<'_> {
    fn land(mut self) -> VecDeque<Waiter> {
        self.armed = false;
        land(self.flight)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let waiters = land(self.flight);
        tracing::warn!(queued = waiters.len(), "Token refresh abandoned");
        for waiter in waiters {
            let _ = waiter.send(Err(ClientError::RefreshCancelled));
        }
    }
}
