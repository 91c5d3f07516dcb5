//! Session token and its persisted storage.
//!
//! # Design
//! The token is never read from ambient global state. Authenticated API
//! calls take an explicit `&Session`, and the navigation guard reads the
//! token through a `SessionStore` it is handed. Storage is abstracted behind
//! `TokenStore`, a fallible key/value contract matching what browser local
//! storage offers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

/// Storage key holding the session token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// An opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Pull the access token out of a login or refresh response.
    ///
    /// Accepts `{"access_token": ...}` and the enveloped
    /// `{"data": {"access_token": ...}}`.
    pub fn from_login_response(body: &Value) -> Option<Self> {
        body.get("access_token")
            .or_else(|| body.get("data").and_then(|d| d.get("access_token")))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage for client state.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process `TokenStore`.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("token store lock poisoned".to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Session persistence on top of a `TokenStore`, under `ACCESS_TOKEN_KEY`.
pub struct SessionStore<S: TokenStore> {
    store: S,
}

impl<S: TokenStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored session, if any. An empty stored value counts as absent.
    pub fn current(&self) -> Result<Option<Session>, StorageError> {
        Ok(self
            .store
            .get(ACCESS_TOKEN_KEY)?
            .filter(|t| !t.is_empty())
            .map(Session::new))
    }

    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        self.store.set(ACCESS_TOKEN_KEY, session.token())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(ACCESS_TOKEN_KEY)
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}
