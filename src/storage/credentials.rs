//! Credential store: bearer token, refresh token and the "remember me" flag
//!
//! Placement rule: with "remember me" the tokens live in the durable scope,
//! otherwise in the session scope, and never in both. The durable scope always
//! carries the `rememberMe` flag so it can be read without a live session.
//!
//! Every operation is best-effort. Storage failures are logged and then
//! treated as "absent" on read or ignored on write.

use super::{AppSettings, KeyValueStore};
use std::sync::Arc;

pub const TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const REMEMBER_ME_KEY: &str = "rememberMe";
pub const AUTHENTICATED_KEY: &str = "isAuthenticated";
pub const SETTINGS_KEY: &str = "appSettings";

/// Where a session's credentials are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceMode {
    /// Survives restarts ("remember me")
    Durable,
    /// Lives only as long as the session scope
    #[default]
    Ephemeral,
}

impl PersistenceMode {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            Self::Durable
        } else {
            Self::Ephemeral
        }
    }

    pub fn remember_me(self) -> bool {
        self == Self::Durable
    }
}

/// Credentials as found in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub token: String,
    pub refresh_token: Option<String>,
    pub persistence: PersistenceMode,
}

pub struct CredentialStore {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Persist the access token and record the flag.
    ///
    /// Returns the mode actually used: a failed durable write degrades to
    /// the session scope ("not remembered") instead of losing the token.
    pub fn save(&self, token: &str, remember_me: bool) -> PersistenceMode {
        let mut mode = PersistenceMode::from_remember_me(remember_me);

        if mode == PersistenceMode::Durable && !self.try_set(self.durable.as_ref(), TOKEN_KEY, token)
        {
            tracing::warn!("Durable token write failed, keeping token for this session only");
            mode = PersistenceMode::Ephemeral;
        }

        match mode {
            PersistenceMode::Durable => self.try_remove(self.session.as_ref(), TOKEN_KEY),
            PersistenceMode::Ephemeral => {
                self.try_set(self.session.as_ref(), TOKEN_KEY, token);
                self.try_remove(self.durable.as_ref(), TOKEN_KEY);
            }
        }

        let flag = if mode.remember_me() { "true" } else { "false" };
        self.try_set(self.durable.as_ref(), REMEMBER_ME_KEY, flag);
        mode
    }

    /// Persist the refresh token next to the access token
    pub fn save_refresh_token(&self, refresh_token: &str, mode: PersistenceMode) {
        let (primary, other) = self.scopes(mode);
        self.try_set(primary, REFRESH_TOKEN_KEY, refresh_token);
        self.try_remove(other, REFRESH_TOKEN_KEY);
    }

    /// Access token: durable scope first, then session scope
    pub fn read(&self) -> Option<String> {
        self.read_preferring_durable(TOKEN_KEY)
    }

    pub fn read_refresh_token(&self) -> Option<String> {
        self.read_preferring_durable(REFRESH_TOKEN_KEY)
    }

    /// Everything needed to hydrate a session, if a token exists
    pub fn load(&self) -> Option<CredentialRecord> {
        let (token, persistence) = match self.try_get(self.durable.as_ref(), TOKEN_KEY) {
            Some(token) => (token, PersistenceMode::Durable),
            None => (
                self.try_get(self.session.as_ref(), TOKEN_KEY)?,
                PersistenceMode::Ephemeral,
            ),
        };

        Some(CredentialRecord {
            token,
            refresh_token: self.read_refresh_token(),
            persistence,
        })
    }

    /// Remove every credential key from both scopes
    pub fn clear(&self) {
        for scope in [self.durable.as_ref(), self.session.as_ref()] {
            self.try_remove(scope, TOKEN_KEY);
            self.try_remove(scope, REFRESH_TOKEN_KEY);
            self.try_remove(scope, AUTHENTICATED_KEY);
        }
        self.try_remove(self.durable.as_ref(), REMEMBER_ME_KEY);
    }

    pub fn is_remember_me(&self) -> bool {
        self.try_get(self.durable.as_ref(), REMEMBER_ME_KEY)
            .is_some_and(|v| v == "true")
    }

    /// Set the "isAuthenticated" marker in the same scope as the token
    pub fn mark_authenticated(&self, mode: PersistenceMode) {
        let (primary, other) = self.scopes(mode);
        self.try_set(primary, AUTHENTICATED_KEY, "true");
        self.try_remove(other, AUTHENTICATED_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_preferring_durable(AUTHENTICATED_KEY)
            .is_some_and(|v| v == "true")
    }

    /// Dashboard branding; missing or malformed data falls back to defaults
    pub fn load_settings(&self) -> AppSettings {
        let Some(raw) = self.try_get(self.durable.as_ref(), SETTINGS_KEY) else {
            return AppSettings::default();
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring malformed app settings");
            AppSettings::default()
        })
    }

    pub fn save_settings(&self, settings: &AppSettings) {
        match serde_json::to_string(settings) {
            Ok(json) => {
                self.try_set(self.durable.as_ref(), SETTINGS_KEY, &json);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize app settings"),
        }
    }

    fn scopes(&self, mode: PersistenceMode) -> (&dyn KeyValueStore, &dyn KeyValueStore) {
        match mode {
            PersistenceMode::Durable => (self.durable.as_ref(), self.session.as_ref()),
            PersistenceMode::Ephemeral => (self.session.as_ref(), self.durable.as_ref()),
        }
    }

    fn read_preferring_durable(&self, key: &str) -> Option<String> {
        self.try_get(self.durable.as_ref(), key)
            .or_else(|| self.try_get(self.session.as_ref(), key))
    }

    fn try_get(&self, scope: &dyn KeyValueStore, key: &str) -> Option<String> {
        scope.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Credential read failed, treating as absent");
            None
        })
    }

    fn try_set(&self, scope: &dyn KeyValueStore, key: &str, value: &str) -> bool {
        match scope.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Credential write failed");
                false
            }
        }
    }

    fn try_remove(&self, scope: &dyn KeyValueStore, key: &str) {
        if let Err(e) = scope.remove(key) {
            tracing::warn!(key, error = %e, "Credential removal failed");
        }
    }
}
