//! Authentication session handle.
//!
//! Holds the bearer token issued by the hosted auth provider and broadcasts
//! sign-in / sign-out events to interested components (the cart store clears
//! itself on sign-out).

use std::sync::{Arc, PoisonError, RwLock, Weak};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;

/// Capacity of the auth event channel. Subscribers that fall further behind
/// than this see a lag error and re-read the current state instead.
const EVENT_CAPACITY: usize = 16;

/// A bearer token for the backend API.
///
/// `Debug` output is redacted.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Session lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
}

/// Shared handle to the current authentication session.
///
/// Cheaply cloneable; all clones observe the same token and event stream.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthSessionInner>,
}

struct AuthSessionInner {
    token: RwLock<Option<SessionToken>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Create a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(AuthSessionInner {
                token: RwLock::new(None),
                events,
            }),
        }
    }

    /// Create a session that is already signed in with `token`.
    #[must_use]
    pub fn signed_in(token: SessionToken) -> Self {
        let session = Self::new();
        *session
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        session
    }

    /// Store a new token and notify subscribers.
    pub fn sign_in(&self, token: SessionToken) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        tracing::info!("Session signed in");
        // No receivers is fine
        let _ = self.inner.events.send(AuthEvent::SignedIn);
    }

    /// Drop the token and notify subscribers.
    pub fn sign_out(&self) {
        self.inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::info!("Session signed out");
        let _ = self.inner.events.send(AuthEvent::SignedOut);
    }

    /// The current bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Subscribe to future sign-in / sign-out events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// A handle that does not keep the session (and its event channel) alive.
    pub(crate) fn downgrade(&self) -> WeakAuthSession {
        WeakAuthSession(Arc::downgrade(&self.inner))
    }
}

/// Non-owning [`AuthSession`] handle.
pub(crate) struct WeakAuthSession(Weak<AuthSessionInner>);

impl WeakAuthSession {
    pub(crate) fn upgrade(&self) -> Option<AuthSession> {
        self.0.upgrade().map(|inner| AuthSession { inner })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::new("eyJhbGciOiJIUzI1NiJ9.secret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
        assert_eq!(token.expose(), "eyJhbGciOiJIUzI1NiJ9.secret");
    }

    #[test]
    fn test_sign_in_and_out() {
        let session = AuthSession::new();
        assert!(!session.is_signed_in());

        session.sign_in(SessionToken::new("tok"));
        assert!(session.is_signed_in());
        assert_eq!(session.token().unwrap().expose(), "tok");

        session.sign_out();
        assert!(session.token().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let session = AuthSession::signed_in(SessionToken::new("tok"));
        let clone = session.clone();
        clone.sign_out();
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let session = AuthSession::new();
        let mut events = session.subscribe();

        session.sign_in(SessionToken::new("tok"));
        session.sign_out();

        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
    }
}
