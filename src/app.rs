// Console wiring - builds the whole client stack from a Config
//
//   FileStore (durable) ─┐
//   MemoryStore (tab)  ──┴─→ CredentialStore ─→ SessionContext
//                                                 │
//   ReqwestTransport ─→ plain  = BearerAuth       │
//                    ─→ client = BearerAuth + RefreshOnUnauthorized
//                                                 │
//   RefreshEndpoint(plain) ─→ RefreshCoordinator ─┘
//
// Login, logout and refresh use `plain` so none of them can recurse into a
// refresh. Everything else goes through `client`.

use crate::api::LungoraApi;
use crate::auth::{AuthService, LoginRedirect, RefreshCoordinator, RefreshEndpoint};
use crate::config::Config;
use crate::http::{ApiClient, BearerAuth, RefreshOnUnauthorized, ReqwestTransport, Transport};
use crate::notice::NoticeBuffer;
use crate::session::{SessionContext, SessionController, TokenSource};
use crate::storage::{AppSettings, CredentialStore, FileStore, KeyValueStore, MemoryStore};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// "Navigate to login": the console cannot force a prompt from inside a
/// request, so it raises a flag the command loop checks.
#[derive(Debug, Default)]
pub struct LoginPrompt {
    requested: AtomicBool,
}

impl LoginPrompt {
    /// Read and reset the flag
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

impl LoginRedirect for LoginPrompt {
    fn redirect_to_login(&self) {
        tracing::debug!("Login required");
        self.requested.store(true, Ordering::SeqCst);
    }
}

pub struct Console {
    pub config: Config,
    pub notices: NoticeBuffer,
    pub session: Arc<SessionContext>,
    pub controller: SessionController,
    pub api: LungoraApi,
    login_prompt: Arc<LoginPrompt>,
}

impl Console {
    /// Production stack: credentials file under the data dir, HTTP via reqwest
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.api_url.clone(), config.request_timeout())
            .context("Failed to build HTTP client")?;
        let durable = FileStore::new(config.credentials_path());
        tracing::debug!(path = %durable.path().display(), api = %config.api_url, "Console starting");

        Ok(Self::with_parts(
            config,
            Arc::new(durable),
            Arc::new(MemoryStore::new()),
            Arc::new(transport),
        ))
    }

    /// Assemble from explicit storage scopes and transport
    pub fn with_parts(
        config: Config,
        durable: Arc<dyn KeyValueStore>,
        session_scope: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let notices = NoticeBuffer::new();
        let store = Arc::new(CredentialStore::new(durable, session_scope));
        let session = Arc::new(SessionContext::new(store));
        let source: Arc<dyn TokenSource> = session.clone();
        let login_prompt = Arc::new(LoginPrompt::default());

        let plain = ApiClient::new(transport.clone()).with(BearerAuth::new(source.clone()));
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::new(RefreshEndpoint::new(plain.clone())),
            session.clone(),
            notices.clone(),
            login_prompt.clone(),
        ));
        let client = ApiClient::new(transport)
            .with(BearerAuth::new(source.clone()))
            .with(RefreshOnUnauthorized::new(source, coordinator.clone()));

        let auth = Arc::new(AuthService::new(client.clone(), plain));
        let controller = SessionController::new(
            session.clone(),
            auth,
            coordinator,
            config.session.refresh_interval(),
        );

        Self {
            config,
            notices,
            session,
            controller,
            api: LungoraApi::new(client),
            login_prompt,
        }
    }

    /// Hydrate (and validate, if configured) the stored session
    pub async fn start(&self) -> bool {
        self.controller
            .start(self.config.session.validate_on_start)
            .await
    }

    /// True once after a refresh failure sent the user back to login
    pub fn take_login_request(&self) -> bool {
        self.login_prompt.take()
    }

    pub fn settings(&self) -> AppSettings {
        self.session.store().load_settings()
    }

    pub fn save_settings(&self, settings: &AppSettings) {
        self.session.store().save_settings(settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoints;
    use crate::auth::{Credentials, SESSION_EXPIRED_NOTICE};
    use crate::http::testing::{ok, unauthorized, FakeTransport};
    use crate::http::ClientError;
    use serde_json::json;
    use std::sync::Mutex;

    fn console(transport: Arc<FakeTransport>) -> (Console, Arc<MemoryStore>) {
        let durable = Arc::new(MemoryStore::new());
        let console = Console::with_parts(
            Config::default(),
            durable.clone(),
            Arc::new(MemoryStore::new()),
            transport,
        );
        (console, durable)
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "admin@lungora.test".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_token_is_refreshed_transparently() {
        let issued = Arc::new(Mutex::new("t1".to_string()));
        let current = issued.clone();
        let transport = FakeTransport::new(move |request| {
            let mut current = current.lock().unwrap();
            match request.path.as_str() {
                endpoints::LOGIN => ok(json!({ "token": "t1", "refreshToken": "r1" })),
                endpoints::REFRESH_TOKEN => {
                    *current = "t2".to_string();
                    ok(json!({ "token": "t2", "refreshToken": "r2" }))
                }
                endpoints::DOCTORS if request.bearer() == Some(current.as_str()) => {
                    ok(json!([{ "id": 1, "name": "Dr. Amal" }]))
                }
                _ => unauthorized(),
            }
        });
        let (console, durable) = console(transport.clone());

        console.controller.login(&credentials(), true).await.unwrap();
        assert_eq!(durable.get("token").unwrap().as_deref(), Some("t1"));

        // Server rotates the token behind our back
        *issued.lock().unwrap() = "t1-revoked".to_string();

        let doctors = console.api.doctors().await.unwrap();
        assert_eq!(doctors[0].name, "Dr. Amal");
        assert_eq!(durable.get("token").unwrap().as_deref(), Some("t2"));
        assert_eq!(transport.count(endpoints::REFRESH_TOKEN), 1);
        assert!(console.notices.is_empty());
        assert!(!console.take_login_request());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_asks_for_login_once() {
        let transport = FakeTransport::new(|request| match request.path.as_str() {
            endpoints::LOGIN => ok(json!({ "token": "t1", "refreshToken": "r1" })),
            _ => unauthorized(),
        });
        let (console, durable) = console(transport);

        console.controller.login(&credentials(), false).await.unwrap();
        let err = console.api.users().await.unwrap_err();

        assert_eq!(err, ClientError::SessionExpired);
        assert!(console.take_login_request());
        assert!(!console.take_login_request());
        assert_eq!(durable.get("rememberMe").unwrap(), None);
        assert_eq!(console.session.store().read(), None);

        let notices = console.notices.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, SESSION_EXPIRED_NOTICE);
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let (console, _) = console(FakeTransport::new(|_| unauthorized()));
        let mut settings = console.settings();
        assert_eq!(settings, AppSettings::default());

        settings.name = "Lungora Cairo".to_string();
        console.save_settings(&settings);
        assert_eq!(console.settings().name, "Lungora Cairo");
    }
}
