//! Streaming Channel Authentication
//!
//! Polygon authenticates a socket with a single frame carrying the API key:
//!
//! 1. Connect to the WebSocket endpoint
//! 2. Receive `{"ev":"status","status":"connected"}` from the server
//! 3. Send `{"action":"auth","params":"<api key>"}`
//! 4. Receive `{"ev":"status","status":"auth_success"}` or `auth_failed`
//!
//! The same key is forwarded to REST calls as an `apiKey` query parameter.

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur handling credentials or authentication.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// API key was empty.
    #[error("API key cannot be empty")]
    EmptyKey,

    /// Server rejected the key.
    #[error("authentication rejected: {0}")]
    Rejected(String),
}

// =============================================================================
// Authentication State
// =============================================================================

/// Current state of the streaming connection's authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not yet connected.
    #[default]
    Disconnected,

    /// Socket opened, auth frame not yet sent.
    Connected,

    /// Auth frame sent, awaiting the server's verdict.
    Authenticating,

    /// Authentication succeeded; subscriptions may be sent.
    Authenticated,

    /// Authentication rejected.
    Failed,
}

impl AuthState {
    /// Check if currently authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Check if authentication is in progress.
    #[must_use]
    pub const fn is_authenticating(&self) -> bool {
        matches!(self, Self::Authenticating)
    }
}

// =============================================================================
// Credential
// =============================================================================

/// Polygon API key.
///
/// The `Debug` and `Display` implementations redact the key for safe logging.
#[derive(Clone)]
pub struct ApiKey {
    key: String,
}

impl ApiKey {
    /// Create a new credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptyKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, AuthError> {
        let key = key.into();
        if key.is_empty() {
            return Err(AuthError::EmptyKey);
        }
        Ok(Self { key })
    }

    /// Get the key material.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}
