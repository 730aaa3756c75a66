//! Bearer token storage using the system keyring

use std::sync::Mutex;

use keyring::Entry;

use super::error::ApiError;
use crate::remote::SessionContext;

/// Service name for keyring storage
const SERVICE_NAME: &str = "course-navigator";
/// Entry name for the access token
const TOKEN_ENTRY: &str = "access-token";

/// Somewhere to keep the single bearer token between runs
pub trait TokenStore: Send + Sync {
    /// Load the stored token
    fn load(&self) -> Result<String, ApiError>;

    /// Replace the stored token
    fn store(&self, token: &str) -> Result<(), ApiError>;

    /// Remove the stored token; succeeds if nothing was stored
    fn clear(&self) -> Result<(), ApiError>;

    /// Restore a session from the stored token
    fn session(&self) -> Result<SessionContext, ApiError> {
        self.load().map(SessionContext::new)
    }
}

/// Keeps the token in the system keyring under a fixed slot
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry, ApiError> {
        Entry::new(SERVICE_NAME, TOKEN_ENTRY).map_err(|e| ApiError::KeyringError(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<String, ApiError> {
        Self::entry()?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => ApiError::NotLoggedIn,
            _ => ApiError::KeyringError(e.to_string()),
        })
    }

    fn store(&self, token: &str) -> Result<(), ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("empty access token".into()));
        }
        Self::entry()?.set_password(token).map_err(|e| ApiError::KeyringError(e.to_string()))
    }

    fn clear(&self) -> Result<(), ApiError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ApiError::KeyringError(e.to_string())),
        }
    }
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<String, ApiError> {
        let guard = self.token.lock().map_err(|e| ApiError::KeyringError(e.to_string()))?;
        guard.clone().ok_or(ApiError::NotLoggedIn)
    }

    fn store(&self, token: &str) -> Result<(), ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("empty access token".into()));
        }
        let mut guard = self.token.lock().map_err(|e| ApiError::KeyringError(e.to_string()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        let mut guard = self.token.lock().map_err(|e| ApiError::KeyringError(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Mask a token for display (show first 8 and last 4 chars)
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 || !token.is_ascii() {
        return "*".repeat(token.chars().count());
    }
    let prefix = &token[..8];
    let suffix = &token[token.len() - 4..];
    format!("{}...{}", prefix, suffix)
}
