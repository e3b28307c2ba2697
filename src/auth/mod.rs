//! Current-user state, shared explicitly instead of through a global.
//!
//! `AuthContext` wraps an `IdentityProvider` and tells subscribers whenever
//! the signed-in session changes. Subscriptions live until `unsubscribe`.

mod provider;

pub use provider::{IdentityProvider, StaticSessionProvider};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Session for a token issued out of band, e.g. from configuration.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            user: User {
                id: "local".to_string(),
                ..User::default()
            },
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at <= now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<(), AuthError> {
        if !self.email.contains('@') {
            return Err(AuthError::InvalidRegistration("email address is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidRegistration(
                "password must be at least 6 characters",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(AuthError::InvalidRegistration("name is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    SessionRestored,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("registration rejected: {0}")]
    InvalidRegistration(&'static str),
    #[error("{0} is not supported by this identity provider")]
    Unsupported(&'static str),
    #[error("identity provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

pub struct AuthContext {
    provider: Arc<dyn IdentityProvider>,
    session: RwLock<Option<Session>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: RwLock::new(None),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Context with no provider behind it beyond an optional fixed token.
    pub fn with_token(access_token: Option<String>) -> Self {
        let session = access_token.map(Session::bearer);
        let context = Self::new(Arc::new(StaticSessionProvider::new(session.clone())));
        *context.session.write().unwrap_or_else(PoisonError::into_inner) = session;
        context
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_session().map(|session| session.user)
    }

    pub fn access_token(&self) -> Option<String> {
        self.current_session()
            .filter(|session| !session.is_expired(Utc::now()))
            .map(|session| session.access_token)
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token().is_some()
    }

    /// Asks the provider for the current session and adopts it.
    pub async fn refresh(&self) -> Result<Option<User>, AuthError> {
        let session = self.provider.current_session().await?;
        let user = session.as_ref().map(|s| s.user.clone());
        let event = if session.is_some() {
            AuthEvent::SessionRestored
        } else {
            AuthEvent::SignedOut
        };
        self.replace(session, event);
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        let user = session.user.clone();
        info!("Signed in as {}", user.id);
        self.replace(Some(session), AuthEvent::SignedIn);
        Ok(user)
    }

    /// Registers a new account. Providers that require confirmation return
    /// no session, in which case the user stays signed out.
    pub async fn sign_up(&self, registration: &Registration) -> Result<Option<User>, AuthError> {
        registration.validate()?;
        let session = self.provider.sign_up(registration).await?;
        let user = session.as_ref().map(|s| s.user.clone());
        if session.is_some() {
            self.replace(session, AuthEvent::SignedIn);
        }
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await?;
        info!("Signed out");
        self.replace(None, AuthEvent::SignedOut);
        Ok(())
    }

    /// Registers `listener` for session changes until `unsubscribe` is called.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        debug!("Auth subscription {:?} added", id);
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn replace(&self, session: Option<Session>, event: AuthEvent) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session.clone();

        // Listeners run outside the lock so they may unsubscribe themselves.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event, session.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;

    struct FakeProvider {
        stored: Mutex<Option<Session>>,
    }

    impl FakeProvider {
        fn new(stored: Option<Session>) -> Arc<Self> {
            Arc::new(Self {
                stored: Mutex::new(stored),
            })
        }
    }

    fn session_for(email: &str) -> Session {
        Session {
            user: User {
                id: format!("user-{}", email),
                email: Some(email.to_string()),
                ..User::default()
            },
            access_token: format!("token-{}", email),
            expires_at: None,
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn current_session(&self) -> Result<Option<Session>, AuthError> {
            Ok(self.stored.lock().expect("fake lock").clone())
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password != "hunter22" {
                return Err(AuthError::InvalidCredentials);
            }
            let session = session_for(email);
            *self.stored.lock().expect("fake lock") = Some(session.clone());
            Ok(session)
        }

        async fn sign_up(&self, registration: &Registration) -> Result<Option<Session>, AuthError> {
            Ok(Some(session_for(&registration.email)))
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            *self.stored.lock().expect("fake lock") = None;
            Ok(())
        }
    }

    fn recorder(context: &AuthContext) -> (SubscriptionId, Arc<Mutex<Vec<(AuthEvent, Option<String>)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = context.subscribe(move |event, session| {
            sink.lock()
                .expect("recorder lock")
                .push((event, session.map(|s| s.user.id.clone())));
        });
        (id, seen)
    }

    #[tokio::test]
    async fn sign_in_and_out_notify_subscribers() {
        let context = AuthContext::new(FakeProvider::new(None));
        let (_, seen) = recorder(&context);

        let user = context.sign_in("ana@example.com", "hunter22").await.expect("signed in");
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(context.access_token().as_deref(), Some("token-ana@example.com"));

        context.sign_out().await.expect("signed out");
        assert!(!context.is_signed_in());

        let seen = seen.lock().expect("recorder lock");
        assert_eq!(
            *seen,
            vec![
                (AuthEvent::SignedIn, Some("user-ana@example.com".to_string())),
                (AuthEvent::SignedOut, None),
            ]
        );
    }

    #[tokio::test]
    async fn unsubscribed_listeners_hear_nothing() {
        let context = AuthContext::new(FakeProvider::new(None));
        let (id, seen) = recorder(&context);
        assert_eq!(context.subscriber_count(), 1);

        assert!(context.unsubscribe(id));
        assert!(!context.unsubscribe(id));
        assert_eq!(context.subscriber_count(), 0);

        context.sign_in("ana@example.com", "hunter22").await.expect("signed in");
        assert!(seen.lock().expect("recorder lock").is_empty());
    }

    #[tokio::test]
    async fn refresh_restores_existing_session() {
        let context = AuthContext::new(FakeProvider::new(Some(session_for("bo@example.com"))));
        let (_, seen) = recorder(&context);

        let user = context.refresh().await.expect("lookup succeeds");
        assert_eq!(user.map(|u| u.id), Some("user-bo@example.com".to_string()));
        assert_eq!(seen.lock().expect("recorder lock")[0].0, AuthEvent::SessionRestored);
    }

    #[tokio::test]
    async fn bad_credentials_leave_context_signed_out() {
        let context = AuthContext::new(FakeProvider::new(None));
        let err = context
            .sign_in("ana@example.com", "wrong")
            .await
            .expect_err("rejected");
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(context.current_user().is_none());
    }

    #[tokio::test]
    async fn registration_is_validated_before_reaching_provider() {
        let context = AuthContext::new(FakeProvider::new(None));
        let registration = Registration {
            email: "not-an-email".to_string(),
            password: "hunter22".to_string(),
            name: "Ana".to_string(),
            phone: None,
        };
        let err = context.sign_up(&registration).await.expect_err("invalid email");
        assert!(matches!(err, AuthError::InvalidRegistration(_)));
        assert!(!context.is_signed_in());
    }

    #[tokio::test]
    async fn listener_may_unsubscribe_itself() {
        let context = Arc::new(AuthContext::new(FakeProvider::new(None)));
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&context);
        let own_id = Arc::clone(&slot);
        let id = context.subscribe(move |_, _| {
            if let (Some(ctx), Some(id)) = (weak.upgrade(), *own_id.lock().expect("slot lock")) {
                ctx.unsubscribe(id);
            }
        });
        *slot.lock().expect("slot lock") = Some(id);

        context.sign_in("ana@example.com", "hunter22").await.expect("signed in");
        assert_eq!(context.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn restored_expired_session_has_no_token() {
        let mut expired = session_for("ana@example.com");
        expired.expires_at = Some(Utc::now() - Duration::minutes(1));
        let context = AuthContext::new(FakeProvider::new(Some(expired)));

        context.refresh().await.expect("refresh succeeds");
        assert!(context.current_session().is_some());
        assert_eq!(context.access_token(), None);
        assert!(!context.is_signed_in());
    }

    #[test]
    fn pre_issued_token_signs_in_a_local_user() {
        let context = AuthContext::with_token(Some("abc".to_string()));
        assert_eq!(context.access_token().as_deref(), Some("abc"));
        assert_eq!(context.current_user().map(|u| u.id), Some("local".to_string()));
    }
}
