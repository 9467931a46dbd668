//! Session lifecycle: hydrate, login, logout and the proactive refresh task

use super::{PersistenceMode, SessionContext, TokenSource};
use crate::auth::{
    AuthApi, ChangePasswordRequest, Credentials, CurrentUser, RefreshCoordinator, RegisterRequest,
};
use crate::http::ClientError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct RefreshTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the session's lifetime. Dropping the controller stops the proactive
/// refresh task.
pub struct SessionController {
    session: Arc<SessionContext>,
    auth: Arc<dyn AuthApi>,
    coordinator: Arc<RefreshCoordinator>,
    refresh_interval: Duration,
    task: Mutex<Option<RefreshTask>>,
}

impl SessionController {
    pub fn new(
        session: Arc<SessionContext>,
        auth: Arc<dyn AuthApi>,
        coordinator: Arc<RefreshCoordinator>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            session,
            auth,
            coordinator,
            refresh_interval,
            task: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Load stored credentials into memory. No network.
    pub fn hydrate(&self) -> bool {
        self.session.hydrate()
    }

    /// Check the hydrated token against the backend. A rejected or
    /// unreachable check ends the session.
    pub async fn validate(&self) -> bool {
        if self.session.token().is_none() {
            return false;
        }

        match self.auth.current_user().await {
            Ok(user) => {
                tracing::debug!(user = %user.user_name, "Stored session is valid");
                true
            }
            Err(err) => {
                tracing::info!(error = %err, "Stored session rejected, logging out");
                self.logout().await;
                false
            }
        }
    }

    /// Hydrate, optionally validate, and start the proactive refresh task if
    /// a session survived. Returns whether the user is logged in.
    pub async fn start(&self, validate: bool) -> bool {
        if !self.hydrate() {
            return false;
        }
        if validate && !self.validate().await {
            return false;
        }
        self.start_refresh_task();
        true
    }

    /// Log in and persist the issued tokens.
    ///
    /// On failure the server's messages are returned and stored credentials
    /// stay as they were.
    pub async fn login(
        &self,
        credentials: &Credentials,
        remember_me: bool,
    ) -> Result<PersistenceMode, ClientError> {
        let tokens = self.auth.login(credentials).await?;
        let mode = self.session.establish(&tokens, remember_me);
        tracing::info!(email = %credentials.email, persistence = ?mode, "Logged in");
        self.start_refresh_task();
        Ok(mode)
    }

    pub async fn logout(&self) {
        end_session(self.auth.as_ref(), &self.session).await;
        self.stop_refresh_task();
    }

    pub async fn current_user(&self) -> Result<CurrentUser, ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        self.auth.current_user().await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        self.auth.register(request).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ClientError> {
        if !self.session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        self.auth.change_password(request).await
    }

    /// Whether a proactive refresh task is scheduled and still running
    pub fn is_refresh_scheduled(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    fn start_refresh_task(&self) {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_refresh_loop(
            cancel.clone(),
            self.refresh_interval,
            self.session.clone(),
            self.auth.clone(),
            self.coordinator.clone(),
        ));

        let previous = self.lock_task().replace(RefreshTask { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    fn stop_refresh_task(&self) {
        if let Some(task) = self.lock_task().take() {
            task.cancel.cancel();
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<RefreshTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop_refresh_task();
    }
}

/// Best-effort server logout, then forget everything locally
async fn end_session(auth: &dyn AuthApi, session: &SessionContext) {
    if session.token().is_some() {
        if let Err(err) = auth.logout().await {
            tracing::warn!(error = %err, "Server logout failed, clearing local session anyway");
        }
    }
    session.clear();
    tracing::info!("Logged out");
}

async fn run_refresh_loop(
    cancel: CancellationToken,
    period: Duration,
    session: Arc<SessionContext>,
    auth: Arc<dyn AuthApi>,
    coordinator: Arc<RefreshCoordinator>,
) {
    tracing::debug!(period_secs = period.as_secs(), "Proactive refresh task started");
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if session.token().is_none() {
            tracing::debug!("No token left to refresh");
            break;
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = coordinator.refresh() => outcome,
        };

        if let Err(err) = outcome {
            tracing::warn!(error = %err, "Proactive refresh failed");
            end_session(auth.as_ref(), &session).await;
            break;
        }
    }

    tracing::debug!("Proactive refresh task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::refresh::tests::{CountingRedirect, FakeRefresher};
    use crate::auth::AuthTokens;
    use crate::notice::NoticeBuffer;
    use crate::session::tests::{memory_session, tokens};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(60);

    struct FakeAuth {
        accept_login: bool,
        user_ok: bool,
        logouts: AtomicUsize,
    }

    impl FakeAuth {
        fn new(accept_login: bool, user_ok: bool) -> Arc<Self> {
            Arc::new(Self {
                accept_login,
                user_ok,
                logouts: AtomicUsize::new(0),
            })
        }

        fn logouts(&self) -> usize {
            self.logouts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn login(&self, _credentials: &Credentials) -> Result<AuthTokens, ClientError> {
            if self.accept_login {
                Ok(tokens("login-token", "login-refresh"))
            } else {
                Err(ClientError::Api {
                    status: 400,
                    errors: vec!["Invalid email or password".to_string()],
                })
            }
        }

        async fn logout(&self) -> Result<(), ClientError> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Network("offline".to_string()))
        }

        async fn current_user(&self) -> Result<CurrentUser, ClientError> {
            if self.user_ok {
                Ok(CurrentUser {
                    id: "1".to_string(),
                    user_name: "admin".to_string(),
                    email: "admin@lungora.test".to_string(),
                    role: Some("Admin".to_string()),
                    image_user: None,
                })
            } else {
                Err(ClientError::Unauthorized)
            }
        }

        async fn register(&self, _request: &RegisterRequest) -> Result<(), ClientError> {
            Ok(())
        }

        async fn change_password(&self, _request: &ChangePasswordRequest) -> Result<(), ClientError> {
            Ok(())
        }
    }

    struct Fixture {
        controller: SessionController,
        session: Arc<SessionContext>,
        auth: Arc<FakeAuth>,
        refresher: Arc<FakeRefresher>,
    }

    fn fixture(auth: Arc<FakeAuth>, refresh_fails: bool) -> Fixture {
        let session = memory_session();
        let refresher = FakeRefresher::new(Duration::from_millis(50), refresh_fails);
        let coordinator = Arc::new(RefreshCoordinator::new(
            refresher.clone(),
            session.clone(),
            NoticeBuffer::new(),
            Arc::new(CountingRedirect::default()),
        ));
        let controller =
            SessionController::new(session.clone(), auth.clone(), coordinator, INTERVAL);
        Fixture {
            controller,
            session,
            auth,
            refresher,
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "admin@lungora.test".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_persists_and_schedules_refresh() {
        let f = fixture(FakeAuth::new(true, true), false);

        let mode = f.controller.login(&credentials(), true).await.unwrap();
        assert_eq!(mode, PersistenceMode::Durable);
        assert_eq!(f.session.store().read().as_deref(), Some("login-token"));
        assert!(f.session.store().is_remember_me());
        assert!(f.session.is_authenticated());
        assert!(f.controller.is_refresh_scheduled());

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(f.refresher.calls(), 1);
        assert_eq!(f.session.token().as_deref(), Some("fresh-1"));

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(f.refresher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_login_leaves_storage_alone() {
        let f = fixture(FakeAuth::new(false, true), false);
        f.session.establish(&tokens("old", "old-refresh"), false);

        let err = f.controller.login(&credentials(), true).await.unwrap_err();
        assert_eq!(err.messages(), vec!["Invalid email or password".to_string()]);
        assert_eq!(f.session.store().read().as_deref(), Some("old"));
        assert!(!f.session.store().is_remember_me());
        assert!(!f.controller.is_refresh_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_and_stops_refresh() {
        let f = fixture(FakeAuth::new(true, true), false);
        f.controller.login(&credentials(), false).await.unwrap();

        f.controller.logout().await;

        assert_eq!(f.auth.logouts(), 1);
        assert_eq!(f.session.store().read(), None);
        assert!(!f.session.is_authenticated());
        assert!(!f.controller.is_refresh_scheduled());

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(f.refresher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_proactive_refresh_logs_out() {
        let f = fixture(FakeAuth::new(true, true), true);
        f.controller.login(&credentials(), true).await.unwrap();

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

        assert_eq!(f.refresher.calls(), 1);
        assert_eq!(f.session.token(), None);
        assert_eq!(f.session.store().read(), None);
        assert!(!f.controller.is_refresh_scheduled());

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(f.refresher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_rejected_token_logs_out() {
        let f = fixture(FakeAuth::new(true, false), false);
        f.session.establish(&tokens("stale", "stale-refresh"), true);

        assert!(!f.controller.start(true).await);
        assert_eq!(f.auth.logouts(), 1);
        assert_eq!(f.session.store().read(), None);
        assert!(!f.controller.is_refresh_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_hydrates_stored_session() {
        let f = fixture(FakeAuth::new(true, true), false);
        f.session.store().save("stored", true);
        f.session.store().mark_authenticated(PersistenceMode::Durable);

        assert!(f.controller.start(true).await);
        assert_eq!(f.session.token().as_deref(), Some("stored"));
        assert!(f.controller.is_refresh_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_credentials_stays_logged_out() {
        let f = fixture(FakeAuth::new(true, true), false);
        assert!(!f.controller.start(false).await);
        assert!(!f.controller.is_refresh_scheduled());
        assert_eq!(
            f.controller.current_user().await.unwrap_err(),
            ClientError::NotAuthenticated
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_calls_respect_session() {
        let f = fixture(FakeAuth::new(true, true), false);
        let change = ChangePasswordRequest {
            current_password: "secret".to_string(),
            new_password: "n3w-secret".to_string(),
            confirm_new_password: "n3w-secret".to_string(),
        };

        // Registration needs no session, password change does
        f.controller
            .register(&RegisterRequest {
                user_name: "nour".to_string(),
                email: "nour@lungora.test".to_string(),
                password: "pw".to_string(),
                confirm_password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            f.controller.change_password(&change).await.unwrap_err(),
            ClientError::NotAuthenticated
        );

        f.controller.login(&credentials(), false).await.unwrap();
        f.controller.change_password(&change).await.unwrap();
        assert_eq!(f.controller.current_user().await.unwrap().user_name, "admin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_refresh_task() {
        let f = fixture(FakeAuth::new(true, true), false);
        f.controller.login(&credentials(), false).await.unwrap();
        let refresher = f.refresher.clone();

        drop(f);
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(refresher.calls(), 0);
    }
}
