// Session module - in-memory session state and its lifecycle
//
// Architecture:
// - SessionContext: the one owner of the in-memory Session. Every mutation
//   goes through it so the credential store and watchers stay in step.
// - TokenSource: the narrow read view handed to the HTTP middlewares, so a
//   test can substitute a fake session without touching storage.
// - SessionController: hydrate / login / logout and the proactive refresh task.

mod controller;

pub use controller::SessionController;
pub use crate::storage::PersistenceMode;

use crate::auth::AuthTokens;
use crate::storage::CredentialStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Read access to the current session for request hooks
pub trait TokenSource: Send + Sync {
    /// Current access token, if any
    fn token(&self) -> Option<String>;

    /// Whether the user logged in (as opposed to never having a session)
    fn is_authenticated(&self) -> bool;
}

/// In-memory session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub persistence: PersistenceMode,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Session,
    authenticated: bool,
}

/// Shared session service
pub struct SessionContext {
    store: Arc<CredentialStore>,
    state: Mutex<SessionState>,
    changes: watch::Sender<Option<String>>,
}

impl SessionContext {
    /// Empty session; call `hydrate` to pick up stored credentials
    pub fn new(store: Arc<CredentialStore>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            store,
            state: Mutex::new(SessionState::default()),
            changes,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    /// Receive every token change (login, refresh, logout)
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.read_refresh_token()
    }

    /// Populate the session from storage. Returns true if a token was found.
    pub fn hydrate(&self) -> bool {
        let Some(record) = self.store.load() else {
            return false;
        };

        let authenticated = self.store.is_authenticated();
        {
            let mut state = self.lock();
            state.session = Session {
                access_token: Some(record.token.clone()),
                persistence: record.persistence,
            };
            state.authenticated = authenticated;
        }

        tracing::debug!(persistence = ?record.persistence, authenticated, "Session hydrated");
        self.changes.send_replace(Some(record.token));
        true
    }

    /// Start a session after a successful login
    pub fn establish(&self, tokens: &AuthTokens, remember_me: bool) -> PersistenceMode {
        let mode = self.store.save(&tokens.token, remember_me);
        if let Some(refresh_token) = &tokens.refresh_token {
            self.store.save_refresh_token(refresh_token, mode);
        }
        self.store.mark_authenticated(mode);

        {
            let mut state = self.lock();
            state.session = Session {
                access_token: Some(tokens.token.clone()),
                persistence: mode,
            };
            state.authenticated = true;
        }

        self.changes.send_replace(Some(tokens.token.clone()));
        mode
    }

    /// Swap in refreshed tokens, keeping the session's persistence mode
    pub fn replace_tokens(&self, tokens: &AuthTokens) {
        let requested = self.lock().session.persistence;
        let mode = self.store.save(&tokens.token, requested.remember_me());
        if let Some(refresh_token) = &tokens.refresh_token {
            self.store.save_refresh_token(refresh_token, mode);
        }
        self.store.mark_authenticated(mode);

        {
            let mut state = self.lock();
            state.session = Session {
                access_token: Some(tokens.token.clone()),
                persistence: mode,
            };
            state.authenticated = true;
        }

        self.changes.send_replace(Some(tokens.token.clone()));
    }

    /// Forget everything, in memory and in storage
    pub fn clear(&self) {
        self.store.clear();
        *self.lock() = SessionState::default();
        self.changes.send_replace(None);
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenSource for SessionContext {
    fn token(&self) -> Option<String> {
        self.lock().session.access_token.clone()
    }

    fn is_authenticated(&self) -> bool {
        let state = self.lock();
        state.authenticated && state.session.access_token.is_some()
    }
}
